use cosmos_common::EntityId;
use std::collections::{BTreeMap, BTreeSet};

use super::InferredCache;
use crate::handle::EntityHandle;

/// Lookup of entities by their current display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameCache {
    by_name: BTreeMap<String, BTreeSet<EntityId>>,
    installed: BTreeMap<EntityId, String>,
}

impl NameCache {
    pub fn entities_named(&self, name: &str) -> impl Iterator<Item = EntityId> + '_ {
        self.by_name.get(name).into_iter().flatten().copied()
    }

    pub fn first_named(&self, name: &str) -> Option<EntityId> {
        self.entities_named(name).next()
    }

    fn remove(&mut self, id: EntityId) {
        let Some(name) = self.installed.remove(&id) else {
            return;
        };
        if let Some(set) = self.by_name.get_mut(&name) {
            set.remove(&id);
            if set.is_empty() {
                self.by_name.remove(&name);
            }
        }
    }
}

impl InferredCache for NameCache {
    fn infer_cache_for(&mut self, entity: &EntityHandle<'_>) {
        self.remove(entity.id());
        if entity.dead() {
            return;
        }
        let name = entity.name().to_owned();
        self.by_name.entry(name.clone()).or_default().insert(entity.id());
        self.installed.insert(entity.id(), name);
    }

    fn destroy_cache_of(&mut self, entity: &EntityHandle<'_>) {
        self.remove(entity.id());
    }
}
