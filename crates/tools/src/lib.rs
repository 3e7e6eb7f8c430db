//! Developer tooling: read-only cosmos inspection and per-tick profiling.
//!
//! # Invariants
//! - Tools never mutate a cosmos.

mod inspector;
mod profiler;

pub use inspector::{CosmosInspector, CosmosSummary, EntityInfo};
pub use profiler::{PhaseStats, TickProfiler};
