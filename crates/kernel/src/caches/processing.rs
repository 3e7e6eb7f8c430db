use cosmos_common::EntityId;
use cosmos_ecs::components::Processing;
use cosmos_ecs::{ProcessingFlags, ProcessingSubject, default_processing};
use std::collections::{BTreeMap, BTreeSet};

use super::InferredCache;
use crate::handle::EntityHandle;

/// Per-subject lists of entities that systems iterate each tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingListsCache {
    lists: BTreeMap<ProcessingSubject, BTreeSet<EntityId>>,
    installed: BTreeMap<EntityId, ProcessingFlags>,
}

impl ProcessingListsCache {
    pub fn get(&self, subject: ProcessingSubject) -> impl Iterator<Item = EntityId> + '_ {
        self.lists.get(&subject).into_iter().flatten().copied()
    }

    pub fn len_of(&self, subject: ProcessingSubject) -> usize {
        self.lists.get(&subject).map_or(0, BTreeSet::len)
    }

    pub fn is_member(&self, id: EntityId, subject: ProcessingSubject) -> bool {
        self.installed
            .get(&id)
            .is_some_and(|flags| flags.contains(subject))
    }

    /// Membership an entity should have given its current state.
    pub fn membership_of(entity: &EntityHandle<'_>) -> ProcessingFlags {
        if entity.dead() {
            return ProcessingFlags::empty();
        }
        let defaults = default_processing(entity.entity_type(), &entity.flavour().invariants);
        let disabled = entity
            .find::<Processing>()
            .map(|p| p.disabled)
            .unwrap_or_default();
        let mut flags = defaults.without(disabled);

        // Items held in a container ride along with it instead of simulating.
        if entity.current_slot().is_some() {
            flags.remove(ProcessingSubject::Physics);
        }
        flags
    }

    fn remove(&mut self, id: EntityId) {
        let Some(flags) = self.installed.remove(&id) else {
            return;
        };
        for subject in flags.iter() {
            if let Some(list) = self.lists.get_mut(&subject) {
                list.remove(&id);
                if list.is_empty() {
                    self.lists.remove(&subject);
                }
            }
        }
    }
}

impl InferredCache for ProcessingListsCache {
    fn infer_cache_for(&mut self, entity: &EntityHandle<'_>) {
        self.remove(entity.id());
        let flags = Self::membership_of(entity);
        if flags.is_empty() {
            return;
        }
        for subject in flags.iter() {
            self.lists.entry(subject).or_default().insert(entity.id());
        }
        self.installed.insert(entity.id(), flags);
    }

    fn destroy_cache_of(&mut self, entity: &EntityHandle<'_>) {
        self.remove(entity.id());
    }
}
