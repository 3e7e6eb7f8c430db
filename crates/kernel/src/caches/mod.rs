//! Derived indices kept in lockstep with component state.
//!
//! # Invariants
//! - `infer_cache_for` is idempotent and may be called after every mutation
//!   of the driving component.
//! - `destroy_cache_of` runs before an entity's storage is released.
//! - Each cache remembers what it installed per entity, so destruction never
//!   depends on the component's current value.

mod name;
mod processing;
mod relational;
mod type_id;

pub use name::NameCache;
pub use processing::ProcessingListsCache;
pub use relational::RelationalCache;
pub use type_id::TypeIdCache;

use crate::handle::EntityHandle;

/// A cache derived from entity state.
pub trait InferredCache {
    /// (Re)compute and install this entity's membership.
    fn infer_cache_for(&mut self, entity: &EntityHandle<'_>);
    /// Remove every trace of this entity.
    fn destroy_cache_of(&mut self, entity: &EntityHandle<'_>);
}

/// Every inferred cache of a cosmos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferredCaches {
    pub type_ids: TypeIdCache,
    pub processing: ProcessingListsCache,
    pub names: NameCache,
    pub relations: RelationalCache,
}

impl InferredCaches {
    fn each(&mut self) -> [&mut dyn InferredCache; 4] {
        [
            &mut self.type_ids,
            &mut self.processing,
            &mut self.names,
            &mut self.relations,
        ]
    }
}

impl InferredCache for InferredCaches {
    fn infer_cache_for(&mut self, entity: &EntityHandle<'_>) {
        for cache in self.each() {
            cache.infer_cache_for(entity);
        }
    }

    fn destroy_cache_of(&mut self, entity: &EntityHandle<'_>) {
        for cache in self.each() {
            cache.destroy_cache_of(entity);
        }
    }
}
