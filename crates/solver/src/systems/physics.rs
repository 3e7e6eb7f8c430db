//! Integration and contact detection over circle shapes.
//!
//! Bodies are integrated in processing-list order and pairs are tested in
//! (lower id, higher id) order, so contacts come out in the same sequence on
//! every machine.

use cosmos_common::{EntityId, EntityType, Transform, repro};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Driver, RigidBody};
use cosmos_ecs::invariants;
use cosmos_kernel::messages::CollisionMessage;
use cosmos_kernel::{Cosmos, LogicStep};
use glam::Vec2;

use super::radius_of;

/// Fraction of velocity kept per second by bodies without a movement definition.
pub const DEFAULT_DAMPING: f32 = 0.1;

fn damping_of(cosmos: &Cosmos, id: EntityId) -> Option<f32> {
    if id.entity_type == EntityType::Missile {
        return None;
    }
    let handle = cosmos.get_handle(id);
    Some(
        handle
            .find_invariant::<invariants::Movement>()
            .map_or(DEFAULT_DAMPING, |m| m.damping),
    )
}

/// Characters sitting in a vehicle ride along instead of simulating.
fn is_passenger(cosmos: &Cosmos, id: EntityId) -> bool {
    cosmos
        .find::<Driver>(id)
        .and_then(|d| d.vehicle)
        .is_some_and(|v| cosmos.is_alive(v))
}

/// Whether two bodies push each other apart on contact.
fn is_solid(id: EntityId) -> bool {
    matches!(id.entity_type, EntityType::Character | EntityType::Vehicle)
}

struct Body {
    id: EntityId,
    pos: Vec2,
    velocity: Vec2,
    radius: f32,
}

pub fn step_and_set_new_transforms(step: &mut LogicStep<'_>) {
    let _span = tracing::debug_span!("physics").entered();
    let cosmos = &mut *step.cosmos;
    let dt = cosmos.delta().in_seconds();

    let mut bodies = Vec::new();
    for id in cosmos.processing_list(ProcessingSubject::Physics) {
        if is_passenger(cosmos, id) {
            continue;
        }
        let damping = damping_of(cosmos, id);
        let radius = radius_of(cosmos, id);
        let Some(body) = cosmos.find_mut::<RigidBody>(id) else {
            continue;
        };
        if let Some(kept_per_second) = damping {
            body.velocity *= repro::powf(kept_per_second, dt);
        }
        let body = *body;
        let transform = cosmos.get_mut::<Transform>(id);
        transform.pos += body.velocity * dt;
        transform.rotation += body.angular_velocity * dt;

        if radius > 0.0 {
            bodies.push(Body {
                id,
                pos: transform.pos,
                velocity: body.velocity,
                radius,
            });
        }
    }

    bodies.sort_by_key(|b| b.id);
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (a, b) = (&bodies[i], &bodies[j]);
            let offset = b.pos - a.pos;
            let distance = offset.length();
            let overlap = a.radius + b.radius - distance;
            if overlap <= 0.0 {
                continue;
            }
            let normal = if distance > 0.0 { offset / distance } else { Vec2::X };
            let point = a.pos + normal * a.radius;

            step.queues.post(CollisionMessage {
                subject: a.id,
                collider: b.id,
                point,
                normal,
                impact_velocity: b.velocity - a.velocity,
            });
            step.queues.post(CollisionMessage {
                subject: b.id,
                collider: a.id,
                point,
                normal: -normal,
                impact_velocity: a.velocity - b.velocity,
            });

            if is_solid(a.id) && is_solid(b.id) {
                let push = normal * (overlap * 0.5);
                let (a_id, b_id) = (a.id, b.id);
                bodies[i].pos -= push;
                bodies[j].pos += push;
                cosmos.get_mut::<Transform>(a_id).pos -= push;
                cosmos.get_mut::<Transform>(b_id).pos += push;
            }
        }
    }
}
