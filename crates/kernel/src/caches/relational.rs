use cosmos_common::{EntityId, SlotFunction, SlotId};
use std::collections::{BTreeMap, BTreeSet};

use super::InferredCache;
use crate::handle::EntityHandle;

/// Index-based ownership graph derived from `Item::current_slot`.
///
/// The child is the source of truth (it names its slot); this cache gives the
/// parent side, slot to children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationalCache {
    children: BTreeMap<SlotId, BTreeSet<EntityId>>,
    parent_of: BTreeMap<EntityId, SlotId>,
}

impl RelationalCache {
    pub fn children_of_slot(&self, slot: SlotId) -> impl Iterator<Item = EntityId> + '_ {
        self.children.get(&slot).into_iter().flatten().copied()
    }

    pub fn items_in_slot(&self, slot: SlotId) -> usize {
        self.children.get(&slot).map_or(0, BTreeSet::len)
    }

    /// Direct children across every slot of `container`, in slot order.
    pub fn children_of(&self, container: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        let first = SlotId::new(container, SlotFunction::PrimaryHand);
        let last = SlotId::new(container, SlotFunction::Inside);
        self.children
            .range(first..=last)
            .flat_map(|(_, set)| set.iter().copied())
    }

    pub fn has_children(&self, container: EntityId) -> bool {
        self.children_of(container).next().is_some()
    }

    pub fn parent_of(&self, child: EntityId) -> Option<SlotId> {
        self.parent_of.get(&child).copied()
    }

    /// Every contained entity with its slot, in id order.
    pub fn slotted(&self) -> impl Iterator<Item = (EntityId, SlotId)> + '_ {
        self.parent_of.iter().map(|(child, slot)| (*child, *slot))
    }

    fn remove(&mut self, id: EntityId) {
        let Some(slot) = self.parent_of.remove(&id) else {
            return;
        };
        if let Some(set) = self.children.get_mut(&slot) {
            set.remove(&id);
            if set.is_empty() {
                self.children.remove(&slot);
            }
        }
    }
}

impl InferredCache for RelationalCache {
    fn infer_cache_for(&mut self, entity: &EntityHandle<'_>) {
        self.remove(entity.id());
        let Some(slot) = entity.current_slot() else {
            return;
        };
        self.children.entry(slot).or_default().insert(entity.id());
        self.parent_of.insert(entity.id(), slot);
    }

    fn destroy_cache_of(&mut self, entity: &EntityHandle<'_>) {
        self.remove(entity.id());
    }
}
