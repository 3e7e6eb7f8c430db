//! Shared ids and value types used by every layer of the simulation kernel.
//!
//! # Invariants
//! - Ids are plain values; liveness is only ever decided by the entity store.
//! - All orderings are total so BTree containers iterate deterministically.

pub mod repro;
mod types;

pub use types::{
    EntityId, EntityType, FixedDelta, FlavourId, SlotFunction, SlotId, Transform,
};
