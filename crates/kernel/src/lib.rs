//! Cosmos kernel: entity storage, inferred caches, the message bus and the
//! [`Cosmos`] aggregate that keeps them consistent.
//!
//! # Invariants
//! - An [`EntityId`](cosmos_common::EntityId) whose slot was freed stays dead
//!   forever; every handle operation on it reports absence.
//! - Any mutation of a component that drives cache membership re-infers the
//!   entity before control returns to the caller.
//! - No cache ever holds an id that is not alive in the store.
//! - Iteration order of every store and cache is a pure function of the
//!   operation sequence, never of addresses or hashing.

pub mod caches;
mod cosmos;
mod handle;
pub mod messages;
mod pool;
pub mod rng;
mod solvable;
mod step;
mod store;

pub use caches::{InferredCache, InferredCaches};
pub use cosmos::Cosmos;
pub use handle::EntityHandle;
pub use messages::{Message, MessageQueues};
pub use pool::Pool;
pub use rng::CosmosRng;
pub use solvable::{CosmicClock, CosmosSettings, CosmosSolvable};
pub use step::{ConstLogicStep, LogicStep};
pub use store::{EntitySolvable, EntityStore};
