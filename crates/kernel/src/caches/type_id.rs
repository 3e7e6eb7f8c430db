use cosmos_common::{EntityId, FlavourId};
use std::collections::{BTreeMap, BTreeSet};

use super::InferredCache;
use crate::handle::EntityHandle;

/// Entities grouped by the flavour they were created from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeIdCache {
    by_flavour: BTreeMap<FlavourId, BTreeSet<EntityId>>,
}

impl TypeIdCache {
    pub fn entities_of(&self, flavour: FlavourId) -> impl Iterator<Item = EntityId> + '_ {
        self.by_flavour.get(&flavour).into_iter().flatten().copied()
    }

    pub fn count_of(&self, flavour: FlavourId) -> usize {
        self.by_flavour.get(&flavour).map_or(0, BTreeSet::len)
    }

    fn remove(&mut self, flavour: FlavourId, id: EntityId) {
        if let Some(set) = self.by_flavour.get_mut(&flavour) {
            set.remove(&id);
            if set.is_empty() {
                self.by_flavour.remove(&flavour);
            }
        }
    }
}

impl InferredCache for TypeIdCache {
    fn infer_cache_for(&mut self, entity: &EntityHandle<'_>) {
        if entity.dead() {
            return;
        }
        self.by_flavour
            .entry(entity.flavour_id())
            .or_default()
            .insert(entity.id());
    }

    fn destroy_cache_of(&mut self, entity: &EntityHandle<'_>) {
        if entity.dead() {
            return;
        }
        self.remove(entity.flavour_id(), entity.id());
    }
}
