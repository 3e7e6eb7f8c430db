use cosmos_common::{EntityId, EntityType, FlavourId};
use cosmos_ecs::{Component, EntityComponents};
use serde::{Deserialize, Serialize};

use crate::pool::Pool;

/// Stored state of one entity: which flavour it is and its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySolvable {
    pub flavour: FlavourId,
    pub components: EntityComponents,
}

/// Pooled storage of every entity, one generational pool per entity type.
///
/// The store knows nothing about caches; creating and destroying through it
/// directly leaves inferred state stale, so the cosmos is the only caller
/// outside of explicit bulk edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    pools: [Pool<EntitySolvable>; EntityType::COUNT],
}

impl Default for EntityStore {
    fn default() -> Self {
        Self {
            pools: std::array::from_fn(|_| Pool::new()),
        }
    }
}

impl EntityStore {
    /// An empty store with one pool per entity type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `entity` in its type's pool.
    pub fn create(&mut self, entity: EntitySolvable) -> EntityId {
        let entity_type = entity.flavour.entity_type;
        let (index, generation) = self.pools[entity_type.index()].allocate(entity);
        EntityId::new(entity_type, index, generation)
    }

    /// Remove a live entity. Returns `None` for ids that are already dead.
    pub fn destroy(&mut self, id: EntityId) -> Option<EntitySolvable> {
        self.pools[id.entity_type.index()].free(id.index, id.generation)
    }

    /// Whether `id` names a live entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.pools[id.entity_type.index()].is_alive(id.index, id.generation)
    }

    /// Entity for `id`, if it is still live.
    pub fn find(&self, id: EntityId) -> Option<&EntitySolvable> {
        self.pools[id.entity_type.index()].get(id.index, id.generation)
    }

    /// Mutable entity for `id`, if it is still live.
    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut EntitySolvable> {
        self.pools[id.entity_type.index()].get_mut(id.index, id.generation)
    }

    /// Component that must exist. A dead id or a missing slot is a logic error.
    pub fn get<C: Component>(&self, id: EntityId) -> &C {
        match self.find_component::<C>(id) {
            Some(c) => c,
            None => panic!("{id} has no {} component or is dead", C::NAME),
        }
    }

    /// Component of a live entity.
    pub fn find_component<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.find(id).and_then(|e| e.components.find::<C>())
    }

    /// Mutable component of a live entity; callers re-infer if it drives a cache.
    pub fn find_component_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        self.find_mut(id).and_then(|e| e.components.find_mut::<C>())
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.pools.iter().map(Pool::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live entities of `entity_type`.
    pub fn count_of(&self, entity_type: EntityType) -> usize {
        self.pools[entity_type.index()].len()
    }

    /// Live ids in canonical order: by type, then slot index.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        EntityType::ALL.into_iter().flat_map(move |t| {
            self.pools[t.index()]
                .iter()
                .map(move |(index, generation, _)| EntityId::new(t, index, generation))
        })
    }
}
