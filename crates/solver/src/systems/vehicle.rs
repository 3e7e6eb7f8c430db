use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{RigidBody, Vehicle};
use cosmos_ecs::invariants;
use cosmos_kernel::messages::IntentMessage;
use cosmos_kernel::LogicStep;

use super::movement::{accelerate, apply_intent};

pub fn set_steering_flags_from_intents(step: &mut LogicStep<'_>) {
    let cosmos = &mut *step.cosmos;
    for message in step.queues.get_queue::<IntentMessage>() {
        if let Some(vehicle) = cosmos.find_mut::<Vehicle>(message.subject) {
            apply_intent(&mut vehicle.steering, message.intent);
        }
    }
}

/// Only driven vehicles accelerate.
pub fn apply_movement_forces(step: &mut LogicStep<'_>) {
    let cosmos = &mut *step.cosmos;
    let dt = cosmos.delta().in_seconds();
    for id in cosmos.processing_list(ProcessingSubject::Vehicles) {
        let vehicle = *cosmos.get::<Vehicle>(id);
        let driven = vehicle.driver.is_some_and(|d| cosmos.is_alive(d));
        if !driven {
            continue;
        }
        let Some(def) = cosmos.get_handle(id).find_invariant::<invariants::Vehicle>().copied() else {
            continue;
        };
        let direction = vehicle.steering.direction().normalize_or_zero();
        if let Some(body) = cosmos.find_mut::<RigidBody>(id) {
            accelerate(body, direction, def.acceleration, def.max_speed, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, spawn};
    use cosmos_input::{CosmicEntropy, Intent, IntentKind};
    use cosmos_kernel::MessageQueues;
    use glam::Vec2;

    #[test]
    fn only_driven_vehicles_move() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let driven = spawn(&mut cosmos, f.car, Vec2::ZERO);
        let parked = spawn(&mut cosmos, f.car, Vec2::new(200.0, 0.0));
        cosmos.get_mut::<Vehicle>(driven).driver = Some(soldier);

        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        for car in [driven, parked] {
            queues.post(IntentMessage {
                subject: car,
                intent: Intent::pressed(IntentKind::MoveDown),
            });
        }
        let mut step = LogicStep::new(&mut cosmos, &entropy, &mut queues);
        set_steering_flags_from_intents(&mut step);
        apply_movement_forces(&mut step);

        assert!(cosmos.get::<RigidBody>(driven).velocity.y > 0.0);
        assert_eq!(cosmos.get::<RigidBody>(parked).velocity, Vec2::ZERO);
        assert!(cosmos.get::<Vehicle>(parked).steering.down);
    }
}
