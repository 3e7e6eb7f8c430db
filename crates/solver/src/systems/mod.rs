//! Stateless systems. Each is a set of free functions over a [`LogicStep`];
//! none keeps state between calls.
//!
//! [`LogicStep`]: cosmos_kernel::LogicStep

pub mod animation;
pub mod behaviour;
pub mod crosshair;
pub mod destroy;
pub mod driver;
pub mod effects;
pub mod force_joint;
pub mod gun;
pub mod input;
pub mod item;
pub mod melee;
pub mod missile;
pub mod movement;
pub mod physics;
pub mod position_copying;
pub mod sentience;
pub mod vehicle;

use cosmos_common::{EntityId, SlotFunction, SlotId};
use cosmos_ecs::invariants::Shape;
use cosmos_kernel::Cosmos;

/// Collision radius, zero for entities without a shape.
pub(crate) fn radius_of(cosmos: &Cosmos, id: EntityId) -> f32 {
    cosmos
        .get_handle(id)
        .find_invariant::<Shape>()
        .map_or(0.0, |s| s.radius)
}

/// First item held in a hand of `holder`, primary hand preferred.
pub(crate) fn wielded_item(cosmos: &Cosmos, holder: EntityId, primary: bool) -> Option<EntityId> {
    let order = if primary {
        [SlotFunction::PrimaryHand, SlotFunction::SecondaryHand]
    } else {
        [SlotFunction::SecondaryHand, SlotFunction::PrimaryHand]
    };
    order
        .into_iter()
        .find_map(|function| cosmos.children_of_slot(SlotId::new(holder, function)).first().copied())
}
