use cosmos_common::{EntityId, EntityType, FlavourId, SlotId, Transform};
use cosmos_ecs::components::{Item, Name};
use cosmos_ecs::{Component, EntityFlavour, Invariant};
use std::fmt;

use crate::solvable::CosmosSolvable;
use crate::store::EntitySolvable;

/// Read-only view of one entity, valid for the borrow of its cosmos.
///
/// A handle built from a stale id is simply dead: `find` returns `None`,
/// `alive` returns false. Only `get`-style accessors treat a dead handle as a
/// logic error.
#[derive(Clone, Copy)]
pub struct EntityHandle<'a> {
    solvable: &'a CosmosSolvable,
    id: EntityId,
    entity: Option<&'a EntitySolvable>,
}

impl<'a> EntityHandle<'a> {
    /// Resolve `id` against `solvable` once.
    pub fn new(solvable: &'a CosmosSolvable, id: EntityId) -> Self {
        Self {
            solvable,
            id,
            entity: solvable.store().find(id),
        }
    }

    /// Id the handle was built from, live or not.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the id resolved to a live entity.
    pub fn alive(&self) -> bool {
        self.entity.is_some()
    }

    pub fn dead(&self) -> bool {
        self.entity.is_none()
    }

    pub fn entity_type(&self) -> EntityType {
        self.id.entity_type
    }

    fn expect_alive(&self) -> &'a EntitySolvable {
        match self.entity {
            Some(e) => e,
            None => panic!("dead handle {} dereferenced as live", self.id),
        }
    }

    /// Component that must exist.
    pub fn get<C: Component>(&self) -> &'a C {
        match self.expect_alive().components.find::<C>() {
            Some(c) => c,
            None => panic!("{} has no {} component", self.id, C::NAME),
        }
    }

    /// Component, or `None` for a dead handle or a missing component.
    pub fn find<C: Component>(&self) -> Option<&'a C> {
        self.entity.and_then(|e| e.components.find::<C>())
    }

    pub fn has<C: Component>(&self) -> bool {
        self.find::<C>().is_some()
    }

    /// Flavour of a live entity.
    pub fn flavour_id(&self) -> FlavourId {
        self.expect_alive().flavour
    }

    /// Flavour definition of a live entity.
    pub fn flavour(&self) -> &'a EntityFlavour {
        self.solvable.flavours().get(self.flavour_id())
    }

    /// Per-flavour invariant, if the flavour defines one.
    pub fn find_invariant<I: Invariant>(&self) -> Option<&'a I> {
        let entity = self.entity?;
        self.solvable.flavours().get(entity.flavour).find::<I>()
    }

    /// Invariant that must exist.
    pub fn get_invariant<I: Invariant>(&self) -> &'a I {
        match self.find_invariant::<I>() {
            Some(i) => i,
            None => panic!("{} has no {} invariant", self.id, I::NAME),
        }
    }

    /// Current name, empty for unnamed or dead entities.
    pub fn name(&self) -> &'a str {
        self.find::<Name>().map(|n| n.0.as_str()).unwrap_or("")
    }

    /// Simulation-side transform, not the interpolated one.
    pub fn logic_transform(&self) -> Option<Transform> {
        self.find::<Transform>().copied()
    }

    /// Slot the entity sits in if it is an item.
    pub fn current_slot(&self) -> Option<SlotId> {
        self.find::<Item>().and_then(|i| i.current_slot)
    }

    pub fn solvable(&self) -> &'a CosmosSolvable {
        self.solvable
    }
}

impl fmt::Display for EntityHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alive() {
            write!(f, "{} {}", self.name(), self.id)
        } else {
            write!(f, "(dead) {}", self.id)
        }
    }
}

impl fmt::Debug for EntityHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
