use cosmos_common::{EntityId, EntityType};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Missile, RigidBody};
use cosmos_ecs::invariants;
use cosmos_kernel::messages::{CollisionMessage, DamageMessage, QueueDestruction};
use cosmos_kernel::LogicStep;
use std::collections::BTreeSet;

fn already_queued(step: &LogicStep<'_>, id: EntityId) -> bool {
    step.get_queue::<QueueDestruction>()
        .iter()
        .any(|q| q.subject == id)
}

/// A missile detonates on the first body it touches other than its sender,
/// other missiles and loose items.
pub fn detonate_colliding_missiles(step: &mut LogicStep<'_>) {
    let mut detonated = BTreeSet::new();
    let mut damages = Vec::new();

    for contact in step.get_queue::<CollisionMessage>() {
        let missile = contact.subject;
        if detonated.contains(&missile) {
            continue;
        }
        let Some(state) = step.cosmos.find::<Missile>(missile) else {
            continue;
        };
        if state.sender == Some(contact.collider)
            || matches!(
                contact.collider.entity_type,
                EntityType::Missile | EntityType::Item
            )
        {
            continue;
        }
        let handle = step.cosmos.get_handle(missile);
        let Some(def) = handle.find_invariant::<invariants::Missile>() else {
            continue;
        };
        let impact_velocity = handle.find::<RigidBody>().map(|b| b.velocity).unwrap_or_default();
        detonated.insert(missile);
        damages.push(DamageMessage {
            subject: contact.collider,
            amount: def.damage,
            origin: state.sender,
            point: contact.point,
            impact_velocity,
        });
    }

    for damage in damages {
        step.post(damage);
    }
    for missile in detonated {
        if !already_queued(step, missile) {
            step.post(QueueDestruction::new(missile));
        }
    }
}

pub fn detonate_expired_missiles(step: &mut LogicStep<'_>) {
    let delta_ms = step.delta().ms;
    for id in step.cosmos.processing_list(ProcessingSubject::Missiles) {
        let expired = {
            let missile = step.cosmos.get_mut::<Missile>(id);
            missile.lifetime_left_ms = missile.lifetime_left_ms.saturating_sub(delta_ms);
            missile.lifetime_left_ms == 0
        };
        if expired && !already_queued(step, id) {
            step.post(QueueDestruction::new(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, spawn};
    use cosmos_input::CosmicEntropy;
    use cosmos_kernel::MessageQueues;
    use glam::Vec2;

    fn touch(queues: &mut MessageQueues, subject: EntityId, collider: EntityId) {
        queues.post(CollisionMessage {
            subject,
            collider,
            point: Vec2::ZERO,
            normal: Vec2::X,
            impact_velocity: Vec2::ZERO,
        });
    }

    #[test]
    fn hit_damages_once_and_spares_sender() {
        let (mut cosmos, f) = testing::cosmos();
        let shooter = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let a = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let b = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let bullet = cosmos.create_entity(f.bullet, |c| {
            c.missile.as_mut().unwrap().sender = Some(shooter);
        });

        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        touch(&mut queues, bullet, shooter);
        touch(&mut queues, bullet, a);
        touch(&mut queues, bullet, b);
        detonate_colliding_missiles(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));

        let damages = queues.get_queue::<DamageMessage>();
        assert_eq!(damages.len(), 1);
        assert_eq!(damages[0].subject, a);
        assert_eq!(damages[0].origin, Some(shooter));
        assert_eq!(damages[0].amount, 30);
        assert_eq!(
            queues.get_queue::<QueueDestruction>(),
            &[QueueDestruction::new(bullet)]
        );
    }

    #[test]
    fn missiles_expire() {
        let (mut cosmos, f) = testing::cosmos();
        let bullet = spawn(&mut cosmos, f.bullet, Vec2::ZERO);
        cosmos.get_mut::<Missile>(bullet).lifetime_left_ms = 20;
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();

        detonate_expired_missiles(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        assert!(queues.get_queue::<QueueDestruction>().is_empty());
        detonate_expired_missiles(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        detonate_expired_missiles(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        assert_eq!(queues.get_queue::<QueueDestruction>().len(), 1);
    }
}
