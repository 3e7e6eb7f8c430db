use cosmos_common::{Transform, repro};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::Crosshair;
use cosmos_kernel::LogicStep;
use cosmos_kernel::messages::MotionMessage;
use glam::Vec2;

/// Furthest the crosshair may wander from its owner.
pub const MAX_CROSSHAIR_DISTANCE: f32 = 800.0;

/// Consumes the motion queue.
pub fn apply_crosshair_motions_to_base_offsets(step: &mut LogicStep<'_>) {
    for motion in step.take_queue::<MotionMessage>() {
        if let Some(crosshair) = step.cosmos.find_mut::<Crosshair>(motion.subject) {
            crosshair.base_offset =
                (crosshair.base_offset + motion.offset).clamp_length_max(MAX_CROSSHAIR_DISTANCE);
        }
    }
}

/// Owners face their crosshair.
pub fn apply_base_offsets_to_rotations(step: &mut LogicStep<'_>) {
    let cosmos = &mut *step.cosmos;
    for id in cosmos.processing_list(ProcessingSubject::Crosshair) {
        let offset = cosmos.get::<Crosshair>(id).base_offset;
        if offset == Vec2::ZERO {
            continue;
        }
        cosmos.get_mut::<Transform>(id).rotation = repro::heading_degrees(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, spawn};
    use cosmos_input::CosmicEntropy;
    use cosmos_kernel::MessageQueues;

    #[test]
    fn motions_aim_the_owner() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        queues.post(MotionMessage {
            subject: soldier,
            offset: Vec2::new(0.0, 50.0),
        });
        let mut step = LogicStep::new(&mut cosmos, &entropy, &mut queues);
        apply_crosshair_motions_to_base_offsets(&mut step);
        apply_base_offsets_to_rotations(&mut step);

        assert!(queues.get_queue::<MotionMessage>().is_empty());
        assert_eq!(cosmos.get::<Crosshair>(soldier).base_offset, Vec2::new(0.0, 50.0));
        assert!((cosmos.get::<Transform>(soldier).rotation - 90.0).abs() < 1e-4);
    }

    #[test]
    fn offset_is_clamped() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        queues.post(MotionMessage {
            subject: soldier,
            offset: Vec2::new(5000.0, 0.0),
        });
        apply_crosshair_motions_to_base_offsets(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        let length = cosmos.get::<Crosshair>(soldier).base_offset.length();
        assert!((length - MAX_CROSSHAIR_DISTANCE).abs() < 1e-2);
    }
}
