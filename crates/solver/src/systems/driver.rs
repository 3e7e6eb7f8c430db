//! Taking and leaving the wheel of a vehicle.

use cosmos_common::{EntityId, Transform};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Driver, RigidBody, Vehicle};
use cosmos_ecs::invariants;
use cosmos_input::IntentKind;
use cosmos_kernel::messages::IntentMessage;
use cosmos_kernel::{Cosmos, LogicStep};
use glam::Vec2;

use super::radius_of;

fn use_button_presses(step: &LogicStep<'_>) -> Vec<EntityId> {
    step.get_queue::<IntentMessage>()
        .iter()
        .filter(|m| m.intent.pressed && m.intent.kind == IntentKind::UseButton)
        .map(|m| m.subject)
        .collect()
}

fn release(cosmos: &mut Cosmos, driver: EntityId) {
    let Some(vehicle) = cosmos.find_mut::<Driver>(driver).and_then(|d| d.vehicle.take()) else {
        return;
    };
    let exit = cosmos.find::<Transform>(vehicle).map(|t| {
        let offset = radius_of(cosmos, vehicle) + radius_of(cosmos, driver) + 1.0;
        t.pos + Vec2::new(0.0, offset)
    });
    if let Some(v) = cosmos.find_mut::<Vehicle>(vehicle) {
        v.driver = None;
        v.steering = Default::default();
    }
    if let Some(pos) = exit {
        cosmos.get_mut::<Transform>(driver).pos = pos;
    }
    tracing::debug!(%driver, %vehicle, "driver released");
}

/// Drivers of vehicles that no longer exist are set free.
pub fn release_drivers_of_dead_vehicles(cosmos: &mut Cosmos) {
    for id in cosmos.processing_list(ProcessingSubject::Drivers) {
        let vehicle = cosmos.get::<Driver>(id).vehicle;
        if vehicle.is_some_and(|v| !cosmos.is_alive(v)) {
            cosmos.get_mut::<Driver>(id).vehicle = None;
        }
    }
}

/// Closest free vehicle within its entry radius of `character`.
fn nearest_free_vehicle(cosmos: &Cosmos, character: EntityId) -> Option<EntityId> {
    let pos = cosmos.find::<Transform>(character)?.pos;
    let mut best: Option<(f32, EntityId)> = None;
    for id in cosmos.processing_list(ProcessingSubject::Vehicles) {
        if cosmos.get::<Vehicle>(id).driver.is_some_and(|d| cosmos.is_alive(d)) {
            continue;
        }
        let Some(def) = cosmos.get_handle(id).find_invariant::<invariants::Vehicle>() else {
            continue;
        };
        let distance = cosmos.get::<Transform>(id).pos.distance(pos);
        if distance <= def.entry_radius && best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, id));
        }
    }
    best.map(|(_, id)| id)
}

/// Use-button toggles: drivers leave, characters near a free vehicle take the wheel.
pub fn respond_to_use_button(step: &mut LogicStep<'_>) {
    let presses = use_button_presses(step);
    let cosmos = &mut *step.cosmos;

    for id in presses {
        let Some(driver) = cosmos.find::<Driver>(id) else {
            continue;
        };
        if driver.vehicle.is_some() {
            release(cosmos, id);
            continue;
        }
        let Some(vehicle) = nearest_free_vehicle(cosmos, id) else {
            continue;
        };
        cosmos.get_mut::<Driver>(id).vehicle = Some(vehicle);
        cosmos.get_mut::<Vehicle>(vehicle).driver = Some(id);
        cosmos.get_mut::<RigidBody>(id).velocity = Vec2::ZERO;
        tracing::debug!(driver = %id, %vehicle, "driver assigned");
    }
}
