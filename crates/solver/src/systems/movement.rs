use cosmos_common::EntityId;
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Movement, MovementFlags, RigidBody};
use cosmos_ecs::invariants;
use cosmos_input::{Intent, IntentKind};
use cosmos_kernel::messages::IntentMessage;
use cosmos_kernel::{Cosmos, LogicStep};
use glam::Vec2;

/// Apply a movement intent to a set of flags. Returns false for other intents.
pub(crate) fn apply_intent(flags: &mut MovementFlags, intent: Intent) -> bool {
    let flag = match intent.kind {
        IntentKind::MoveUp => &mut flags.up,
        IntentKind::MoveDown => &mut flags.down,
        IntentKind::MoveLeft => &mut flags.left,
        IntentKind::MoveRight => &mut flags.right,
        _ => return false,
    };
    *flag = intent.pressed;
    true
}

pub fn set_movement_flags_from_input(step: &mut LogicStep<'_>) {
    let cosmos = &mut *step.cosmos;
    for message in step.queues.get_queue::<IntentMessage>() {
        if let Some(movement) = cosmos.find_mut::<Movement>(message.subject) {
            apply_intent(&mut movement.flags, message.intent);
        }
    }
}

/// Accelerate `body` along `direction`, never past `max_speed`.
pub(crate) fn accelerate(body: &mut RigidBody, direction: Vec2, acceleration: f32, max_speed: f32, dt: f32) {
    if direction == Vec2::ZERO {
        return;
    }
    body.velocity += direction * acceleration * dt;
    body.velocity = body.velocity.clamp_length_max(max_speed);
}

fn apply_forces_for(cosmos: &mut Cosmos, id: EntityId, dt: f32) {
    let Some(def) = cosmos.get_handle(id).find_invariant::<invariants::Movement>().copied() else {
        return;
    };
    let direction = cosmos.get::<Movement>(id).requested_direction();
    if let Some(body) = cosmos.find_mut::<RigidBody>(id) {
        accelerate(body, direction, def.acceleration, def.max_speed, dt);
    }
}

pub fn apply_movement_forces(cosmos: &mut Cosmos) {
    let dt = cosmos.delta().in_seconds();
    for id in cosmos.processing_list(ProcessingSubject::Movement) {
        apply_forces_for(cosmos, id, dt);
    }
}
