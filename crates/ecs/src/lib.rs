//! Component model of the cosmos.
//!
//! Entities are split into flavour-owned, immutable *invariants* and
//! instance-owned, mutable *components*. The set of component slots an entity
//! has is fixed by its [`EntityType`](cosmos_common::EntityType); the set of
//! invariants is fixed by its flavour.
//!
//! # Invariants
//! - Invariants are never copied into instances; entities reference their flavour.
//! - Components whose values drive inferred caches are [`SynchronizedComponent`]s
//!   and can only be mutated through the cosmos, which re-infers synchronously.

pub mod components;
mod flavour;
pub mod invariants;
mod processing;

pub use components::{Component, EntityComponents, FreeComponent, SynchronizedComponent};
pub use flavour::{EntityFlavour, FlavourError, FlavourRegistry};
pub use invariants::{EntityInvariants, Invariant};
pub use processing::{ProcessingFlags, ProcessingSubject, default_processing};
