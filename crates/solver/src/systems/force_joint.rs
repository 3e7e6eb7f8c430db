use cosmos_common::Transform;
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{ForceJoint, RigidBody};
use cosmos_kernel::Cosmos;

/// Pull bodies towards their joint target. Joints to dead targets are cut.
pub fn apply_forces_towards_target_entities(cosmos: &mut Cosmos) {
    let dt = cosmos.delta().in_seconds();
    for id in cosmos.processing_list(ProcessingSubject::ForceJoints) {
        let joint = *cosmos.get::<ForceJoint>(id);
        let Some(target) = joint.target else {
            continue;
        };
        let Some(target_pos) = cosmos.find::<Transform>(target).map(|t| t.pos) else {
            cosmos.get_mut::<ForceJoint>(id).target = None;
            continue;
        };
        let pos = cosmos.get::<Transform>(id).pos;
        let pull = (target_pos - pos).normalize_or_zero() * joint.strength * dt;
        if let Some(body) = cosmos.find_mut::<RigidBody>(id) {
            body.velocity += pull;
        }
    }
}
