use cosmos_common::{EntityId, Transform};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Melee, RigidBody};
use cosmos_ecs::invariants;
use cosmos_input::IntentKind;
use cosmos_kernel::messages::{DamageMessage, IntentMessage, MeleeSwingMessage};
use cosmos_kernel::{Cosmos, LogicStep};

use super::radius_of;

pub fn consume_melee_intents(step: &mut LogicStep<'_>) {
    let cosmos = &mut *step.cosmos;
    for message in step.queues.get_queue::<IntentMessage>() {
        if message.intent.kind != IntentKind::Melee || !message.intent.pressed {
            continue;
        }
        if let Some(melee) = cosmos.find_mut::<Melee>(message.subject) {
            melee.swing_requested = true;
        }
    }
}

/// Closest other sentient entity whose body is within `range` of the attacker's.
fn closest_victim(cosmos: &Cosmos, attacker: EntityId, range: f32) -> Option<EntityId> {
    let origin = cosmos.find::<Transform>(attacker)?.pos;
    let reach = range + radius_of(cosmos, attacker);
    let mut best: Option<(f32, EntityId)> = None;
    for id in cosmos.processing_list(ProcessingSubject::Sentience) {
        if id == attacker {
            continue;
        }
        let Some(t) = cosmos.find::<Transform>(id) else {
            continue;
        };
        let gap = t.pos.distance(origin) - radius_of(cosmos, id);
        if gap <= reach && best.is_none_or(|(d, _)| gap < d) {
            best = Some((gap, id));
        }
    }
    best.map(|(_, id)| id)
}

pub fn initiate_and_update_moves(step: &mut LogicStep<'_>) {
    let delta_ms = step.delta().ms;

    for id in step.cosmos.processing_list(ProcessingSubject::Melee) {
        let melee = {
            let m = step.cosmos.get_mut::<Melee>(id);
            m.cooldown_left_ms = m.cooldown_left_ms.saturating_sub(delta_ms);
            let state = *m;
            m.swing_requested = false;
            state
        };
        if !melee.swing_requested || melee.cooldown_left_ms > 0 {
            continue;
        }
        let Some(def) = step.cosmos.get_handle(id).find_invariant::<invariants::Melee>().copied() else {
            continue;
        };
        let pos = step.cosmos.get::<Transform>(id).pos;
        let hit = closest_victim(step.cosmos, id, def.range);

        if let Some(victim) = hit {
            let impact_velocity = step
                .cosmos
                .find::<RigidBody>(id)
                .map(|b| b.velocity)
                .unwrap_or_default();
            step.post(DamageMessage {
                subject: victim,
                amount: def.damage,
                origin: Some(id),
                point: pos,
                impact_velocity,
            });
        }
        step.cosmos.get_mut::<Melee>(id).cooldown_left_ms = def.cooldown_ms;
        step.post(MeleeSwingMessage {
            subject: id,
            hit,
            pos,
        });
    }
}
