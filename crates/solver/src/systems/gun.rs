use cosmos_common::{EntityId, Transform};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::Gun;
use cosmos_ecs::invariants;
use cosmos_input::IntentKind;
use cosmos_kernel::messages::{GunshotMessage, IntentMessage};
use cosmos_kernel::LogicStep;
use rand::Rng;

use super::{radius_of, wielded_item};

/// Shoot intents press or release the trigger of the wielded gun.
pub fn consume_gun_intents(step: &mut LogicStep<'_>) {
    let cosmos = &mut *step.cosmos;
    for message in step.queues.get_queue::<IntentMessage>() {
        if message.intent.kind != IntentKind::Shoot {
            continue;
        }
        let Some(item) = wielded_item(cosmos, message.subject, true) else {
            continue;
        };
        if let Some(gun) = cosmos.find_mut::<Gun>(item) {
            gun.trigger_pressed = message.intent.pressed;
        }
    }
}

fn muzzle_of(step: &LogicStep<'_>, gun: EntityId, shooter: EntityId, missile_radius: f32) -> Option<Transform> {
    let aim = *step.cosmos.find::<Transform>(shooter)?;
    let def = step.cosmos.get_handle(gun).find_invariant::<invariants::Gun>()?;

    let mut rotation = aim.rotation;
    if def.spread_degrees > 0.0 {
        let mut rng = step.rng_for(gun);
        rotation += rng.gen_range(-def.spread_degrees..=def.spread_degrees);
    }
    let facing = Transform::new(aim.pos, rotation);
    let clearance = radius_of(step.cosmos, shooter) + missile_radius + 1.0;
    Some(Transform::new(aim.pos + facing.direction() * clearance, rotation))
}

/// Cool guns down and spawn a missile for each pressed, ready trigger.
pub fn launch_shots_due_to_pressed_triggers(step: &mut LogicStep<'_>) {
    let delta_ms = step.delta().ms;

    for gun in step.cosmos.processing_list(ProcessingSubject::Guns) {
        let state = {
            let g = step.cosmos.get_mut::<Gun>(gun);
            g.cooldown_left_ms = g.cooldown_left_ms.saturating_sub(delta_ms);
            *g
        };
        if !state.trigger_pressed || state.cooldown_left_ms > 0 {
            continue;
        }
        // A gun lying on the ground has nobody to fire it.
        if step.cosmos.current_slot(gun).is_none() {
            step.cosmos.get_mut::<Gun>(gun).trigger_pressed = false;
            continue;
        }
        let Some(def) = step.cosmos.get_handle(gun).find_invariant::<invariants::Gun>().copied() else {
            continue;
        };
        let missile_radius = step
            .cosmos
            .flavours()
            .get(def.missile_flavour)
            .find::<invariants::Shape>()
            .map_or(0.0, |s| s.radius);

        let shooter = step.cosmos.root_container_of(gun);
        let Some(muzzle) = muzzle_of(step, gun, shooter, missile_radius) else {
            continue;
        };
        let velocity = muzzle.direction() * def.muzzle_speed;
        let missile = step.cosmos.create_entity(def.missile_flavour, |c| {
            c.transform = Some(muzzle);
            if let Some(body) = c.rigid_body.as_mut() {
                body.velocity = velocity;
            }
            if let Some(m) = c.missile.as_mut() {
                m.sender = Some(shooter);
            }
        });
        step.cosmos.get_mut::<Gun>(gun).cooldown_left_ms = def.cooldown_ms;

        step.post(GunshotMessage {
            gun,
            shooter: Some(shooter),
            muzzle,
            missile,
        });
        tracing::trace!(%gun, %missile, "shot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::perform_transfers;
    use crate::testing::{self, spawn};
    use cosmos_common::{SlotFunction, SlotId};
    use cosmos_input::{CosmicEntropy, Intent, TransferRequest};
    use cosmos_ecs::components::{Missile, RigidBody};
    use cosmos_kernel::{Cosmos, MessageQueues};
    use glam::Vec2;

    fn armed_soldier() -> (Cosmos, EntityId, EntityId) {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        perform_transfers(
            &[TransferRequest::to_slot(
                rifle,
                SlotId::new(soldier, SlotFunction::PrimaryHand),
            )],
            &mut LogicStep::new(&mut cosmos, &entropy, &mut queues),
        );
        (cosmos, soldier, rifle)
    }

    #[test]
    fn pressed_trigger_spawns_missile_from_shooter() {
        let (mut cosmos, soldier, rifle) = armed_soldier();
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        queues.post(IntentMessage {
            subject: soldier,
            intent: Intent::pressed(IntentKind::Shoot),
        });
        let mut step = LogicStep::new(&mut cosmos, &entropy, &mut queues);
        consume_gun_intents(&mut step);
        launch_shots_due_to_pressed_triggers(&mut step);

        let shots = queues.get_queue::<GunshotMessage>();
        assert_eq!(shots.len(), 1);
        let missile = shots[0].missile;
        assert_eq!(cosmos.get::<Missile>(missile).sender, Some(soldier));
        assert!(cosmos.get::<RigidBody>(missile).velocity.x > 0.0);
        assert!(cosmos.get::<Gun>(rifle).cooldown_left_ms > 0);
    }

    #[test]
    fn cooldown_limits_rate_of_fire() {
        let (mut cosmos, _, rifle) = armed_soldier();
        cosmos.get_mut::<Gun>(rifle).trigger_pressed = true;
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();

        // 100 ms cooldown at 16 ms ticks: one shot, then six silent ticks.
        for _ in 0..7 {
            launch_shots_due_to_pressed_triggers(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        }
        assert_eq!(queues.get_queue::<GunshotMessage>().len(), 1);
        launch_shots_due_to_pressed_triggers(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        assert_eq!(queues.get_queue::<GunshotMessage>().len(), 2);
    }

    #[test]
    fn guns_on_the_ground_do_not_fire() {
        let (mut cosmos, f) = testing::cosmos();
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        cosmos.get_mut::<Gun>(rifle).trigger_pressed = true;
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        launch_shots_due_to_pressed_triggers(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        assert!(queues.get_queue::<GunshotMessage>().is_empty());
        assert!(!cosmos.get::<Gun>(rifle).trigger_pressed);
    }
}
