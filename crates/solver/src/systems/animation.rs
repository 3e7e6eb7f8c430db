use cosmos_common::EntityType;
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Animation, RigidBody};
use cosmos_ecs::invariants;
use cosmos_kernel::messages::{AnimationAction, AnimationMessage};
use cosmos_kernel::{Cosmos, LogicStep};

/// Speed above which a character's walk cycle plays.
pub const WALK_SPEED_THRESHOLD: f32 = 5.0;

/// Characters start their animation when they begin moving and stop when they halt.
pub fn generate_movement_animations(step: &mut LogicStep<'_>) {
    let mut messages = Vec::new();
    for id in step.cosmos.processing_list(ProcessingSubject::Animations) {
        if id.entity_type != EntityType::Character {
            continue;
        }
        let moving = step
            .cosmos
            .find::<RigidBody>(id)
            .is_some_and(|b| b.velocity.length() > WALK_SPEED_THRESHOLD);
        let playing = step.cosmos.get::<Animation>(id).playing;
        let action = match (moving, playing) {
            (true, false) => AnimationAction::Start,
            (false, true) => AnimationAction::Stop,
            _ => continue,
        };
        messages.push(AnimationMessage { subject: id, action });
    }
    for message in messages {
        step.post(message);
    }
}

/// Consumes the animation queue.
pub fn handle_animation_messages(step: &mut LogicStep<'_>) {
    for message in step.take_queue::<AnimationMessage>() {
        let Some(animation) = step.cosmos.find_mut::<Animation>(message.subject) else {
            continue;
        };
        match message.action {
            AnimationAction::Start => animation.playing = true,
            AnimationAction::Stop => animation.playing = false,
            AnimationAction::Restart => {
                *animation = Animation {
                    frame: 0,
                    elapsed_ms: 0,
                    playing: true,
                };
            }
        }
    }
}

pub fn progress_animation_states(cosmos: &mut Cosmos) {
    let delta_ms = cosmos.delta().ms;
    for id in cosmos.processing_list(ProcessingSubject::Animations) {
        let Some(def) = cosmos.get_handle(id).find_invariant::<invariants::Animation>().copied() else {
            continue;
        };
        if def.frame_count == 0 || def.frame_duration_ms == 0 {
            continue;
        }
        let animation = cosmos.get_mut::<Animation>(id);
        if !animation.playing {
            continue;
        }
        animation.elapsed_ms += delta_ms;
        while animation.elapsed_ms >= def.frame_duration_ms {
            animation.elapsed_ms -= def.frame_duration_ms;
            animation.frame += 1;
            if animation.frame >= def.frame_count {
                if def.looping {
                    animation.frame = 0;
                } else {
                    animation.frame = def.frame_count - 1;
                    animation.playing = false;
                    animation.elapsed_ms = 0;
                    break;
                }
            }
        }
    }
}
