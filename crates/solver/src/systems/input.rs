//! Turns per-tick entropy into intent and motion messages, then routes them
//! to whatever the character currently controls.

use cosmos_ecs::components::Driver;
use cosmos_input::IntentKind;
use cosmos_kernel::LogicStep;
use cosmos_kernel::messages::{IntentMessage, MotionMessage};
use glam::Vec2;

pub fn make_input_messages(step: &mut LogicStep<'_>) {
    let entropy = step.entropy;
    for (subject, player) in &entropy.players {
        if !step.cosmos.is_alive(*subject) {
            tracing::debug!(%subject, "entropy for dead character ignored");
            continue;
        }
        for intent in &player.intents {
            step.queues.post(IntentMessage {
                subject: *subject,
                intent: *intent,
            });
        }
        if player.motion != Vec2::ZERO {
            step.queues.post(MotionMessage {
                subject: *subject,
                offset: player.motion,
            });
        }
    }
}

fn is_movement(kind: IntentKind) -> bool {
    matches!(
        kind,
        IntentKind::MoveUp | IntentKind::MoveDown | IntentKind::MoveLeft | IntentKind::MoveRight
    )
}

/// Movement intents of drivers steer their vehicle instead.
pub fn contextualize_movement_intents(step: &mut LogicStep<'_>) {
    let cosmos = &*step.cosmos;
    for message in step.queues.get_queue_mut::<IntentMessage>() {
        if !is_movement(message.intent.kind) {
            continue;
        }
        let vehicle = cosmos
            .find::<Driver>(message.subject)
            .and_then(|d| d.vehicle)
            .filter(|v| cosmos.is_alive(*v));
        if let Some(vehicle) = vehicle {
            message.subject = vehicle;
        }
    }
}
