use cosmos_common::{EntityId, FixedDelta, FlavourId, SlotId};
use cosmos_ecs::components::Item;
use cosmos_ecs::{
    Component, FlavourRegistry, FreeComponent, ProcessingSubject, SynchronizedComponent,
};
use std::sync::Arc;

use crate::caches::{InferredCache, InferredCaches};
use crate::handle::EntityHandle;
use crate::rng::{self, CosmosRng};
use crate::solvable::{self, CosmicClock, CosmosSettings, CosmosSolvable};
use crate::store::EntitySolvable;

/// The world of one simulation instance.
///
/// Owns the significant state and the caches inferred from it. Every path
/// that changes cache-relevant state goes through here, so the caches are
/// always in sync by the time control returns to the caller.
#[derive(Debug, Clone)]
pub struct Cosmos {
    significant: CosmosSolvable,
    inferred: InferredCaches,
    resample_requested: bool,
}

impl Cosmos {
    /// Empty cosmos over `flavours`.
    pub fn new(flavours: FlavourRegistry, settings: CosmosSettings) -> Self {
        Self::with_shared_flavours(Arc::new(flavours), settings)
    }

    /// Empty cosmos sharing an already registered flavour set.
    pub fn with_shared_flavours(flavours: Arc<FlavourRegistry>, settings: CosmosSettings) -> Self {
        Self::from_significant(CosmosSolvable::new(flavours, settings))
    }

    /// Adopt significant state, e.g. a restored snapshot, and infer its caches.
    pub fn from_significant(significant: CosmosSolvable) -> Self {
        let mut cosmos = Self {
            significant,
            inferred: InferredCaches::default(),
            resample_requested: false,
        };
        cosmos.reinfer_all_entities();
        cosmos
    }

    /// The serializable state everything else is inferred from.
    pub fn significant(&self) -> &CosmosSolvable {
        &self.significant
    }

    /// Replace the whole significant state. Raises the resample flag.
    pub fn assign_significant(&mut self, significant: CosmosSolvable) {
        self.significant = significant;
        self.reinfer_all_entities();
        self.request_resample();
    }

    /// Flavours entities of this cosmos are built from.
    pub fn flavours(&self) -> &FlavourRegistry {
        self.significant.flavours()
    }

    /// Current step and timestep.
    pub fn clock(&self) -> CosmicClock {
        self.significant.clock()
    }

    pub fn step(&self) -> u64 {
        self.significant.clock().step
    }

    pub fn delta(&self) -> FixedDelta {
        self.significant.clock().delta
    }

    pub fn seed(&self) -> u64 {
        self.significant.seed()
    }

    /// Advance the clock by one step; the solver calls this once per tick.
    pub fn increment_step(&mut self) {
        self.significant.increment_step();
    }

    /// Handle for `id`, dead if the id is stale.
    pub fn get_handle(&self, id: EntityId) -> EntityHandle<'_> {
        EntityHandle::new(&self.significant, id)
    }

    /// Whether `id` names a live entity of the current generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.significant.store().is_alive(id)
    }

    /// Number of live entities of every type.
    pub fn entity_count(&self) -> usize {
        self.significant.store().len()
    }

    /// Live ids in canonical order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.significant.store().ids().collect()
    }

    /// Construct an entity: flavour defaults, `init`, inference, warnings.
    pub fn create_entity(
        &mut self,
        flavour: FlavourId,
        init: impl FnOnce(&mut cosmos_ecs::EntityComponents),
    ) -> EntityId {
        let id = self.significant.allocate_entity(flavour, init);
        self.infer_caches_for(id);
        solvable::emit_warnings(id, self.flavours().get(flavour));
        tracing::trace!(%id, "created entity");
        id
    }

    /// Copy an entity's components into a new entity of the same flavour.
    ///
    /// The clone is never placed in a slot; containment is not duplicated.
    pub fn clone_entity(&mut self, source: EntityId) -> Option<EntityId> {
        let EntitySolvable {
            flavour,
            mut components,
        } = self.significant.store().find(source)?.clone();
        if let Some(item) = components.item.as_mut() {
            item.current_slot = None;
        }
        let id = self.significant.allocate_entity(flavour, |c| *c = components);
        self.infer_caches_for(id);
        tracing::trace!(%source, clone = %id, "cloned entity");
        Some(id)
    }

    /// Destroy one entity.
    ///
    /// Children must be gone already; cascades are the solver's business.
    pub fn delete_entity(&mut self, id: EntityId) {
        assert!(self.is_alive(id), "deleting dead entity {id}");
        assert!(
            !self.inferred.relations.has_children(id),
            "deleting {id} while it still has children"
        );
        let handle = EntityHandle::new(&self.significant, id);
        self.inferred.destroy_cache_of(&handle);
        self.significant.store_mut().destroy(id);
        tracing::trace!(%id, "deleted entity");
    }

    /// Component of a live entity, if it has one.
    pub fn find<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.significant.store().find_component::<C>(id)
    }

    /// Component that must exist.
    pub fn get<C: Component>(&self, id: EntityId) -> &C {
        self.significant.store().get::<C>(id)
    }

    /// Mutable access to a component that drives no cache.
    pub fn find_mut<C: FreeComponent>(&mut self, id: EntityId) -> Option<&mut C> {
        self.significant.store_mut().find_component_mut::<C>(id)
    }

    /// Free component that must exist.
    pub fn get_mut<C: FreeComponent>(&mut self, id: EntityId) -> &mut C {
        match self.find_mut::<C>(id) {
            Some(c) => c,
            None => panic!("{id} has no {} component or is dead", C::NAME),
        }
    }

    /// Mutate a cache-driving component and re-infer before returning.
    ///
    /// Returns `None` when the entity is dead or lacks the component.
    pub fn modify<C: SynchronizedComponent, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut C) -> R,
    ) -> Option<R> {
        let component = self.significant.store_mut().find_component_mut::<C>(id)?;
        let result = f(component);
        self.infer_caches_for(id);
        Some(result)
    }

    fn infer_caches_for(&mut self, id: EntityId) {
        let handle = EntityHandle::new(&self.significant, id);
        self.inferred.infer_cache_for(&handle);
    }

    /// All inferred caches, read-only.
    pub fn caches(&self) -> &InferredCaches {
        &self.inferred
    }

    /// Entities a system of `subject` iterates, in canonical order.
    pub fn processing_list(&self, subject: ProcessingSubject) -> Vec<EntityId> {
        self.inferred.processing.get(subject).collect()
    }

    /// Live entities built from `flavour`.
    pub fn entities_of_flavour(&self, flavour: FlavourId) -> Vec<EntityId> {
        self.inferred.type_ids.entities_of(flavour).collect()
    }

    /// Live entities currently called `name`.
    pub fn entities_named(&self, name: &str) -> Vec<EntityId> {
        self.inferred.names.entities_named(name).collect()
    }

    /// Lowest id called `name`.
    pub fn first_named(&self, name: &str) -> Option<EntityId> {
        self.inferred.names.first_named(name)
    }

    /// Direct children of a container, across all of its slots.
    pub fn children_of(&self, container: EntityId) -> Vec<EntityId> {
        self.inferred.relations.children_of(container).collect()
    }

    /// Items in `slot`, in id order.
    pub fn children_of_slot(&self, slot: SlotId) -> Vec<EntityId> {
        self.inferred.relations.children_of_slot(slot).collect()
    }

    /// Slot `child` sits in.
    pub fn parent_of(&self, child: EntityId) -> Option<SlotId> {
        self.inferred.relations.parent_of(child)
    }

    /// Every contained entity with the slot holding it.
    pub fn slotted_entities(&self) -> Vec<(EntityId, SlotId)> {
        self.inferred.relations.slotted().collect()
    }

    /// The outermost container holding `id`, or `id` itself.
    pub fn root_container_of(&self, id: EntityId) -> EntityId {
        let mut current = id;
        while let Some(slot) = self.parent_of(current) {
            current = slot.container;
        }
        current
    }

    /// Whether `ancestor` contains `id`, directly or transitively.
    pub fn is_descendant_of(&self, id: EntityId, ancestor: EntityId) -> bool {
        let mut current = id;
        while let Some(slot) = self.parent_of(current) {
            if slot.container == ancestor {
                return true;
            }
            current = slot.container;
        }
        false
    }

    /// Depth-first, parents before children, in slot order.
    pub fn for_each_descendant(&self, id: EntityId, mut f: impl FnMut(EntityId)) {
        let mut stack: Vec<EntityId> = self.children_of(id);
        stack.reverse();
        while let Some(child) = stack.pop() {
            f(child);
            let mut grandchildren = self.children_of(child);
            grandchildren.reverse();
            stack.extend(grandchildren);
        }
    }

    /// Rebuild every cache from scratch.
    pub fn reinfer_all_entities(&mut self) {
        let _span = tracing::debug_span!("reinfer_all_entities").entered();
        self.inferred = InferredCaches::default();
        for id in self.ids() {
            self.infer_caches_for(id);
        }
    }

    /// Fatal if the incrementally maintained caches differ from a fresh build.
    pub fn assert_caches_consistent(&self) {
        let mut fresh = InferredCaches::default();
        for id in self.significant.store().ids() {
            fresh.infer_cache_for(&EntityHandle::new(&self.significant, id));
        }
        assert!(
            fresh == self.inferred,
            "inferred caches diverged from significant state at step {}",
            self.step()
        );
    }

    /// Mutate significant state directly, then rebuild every cache.
    ///
    /// The only sanctioned way to bypass the solver; raises the resample flag.
    pub fn bulk_edit<R>(&mut self, f: impl FnOnce(&mut CosmosSolvable) -> R) -> R {
        let result = f(&mut self.significant);
        self.reinfer_all_entities();
        self.request_resample();
        result
    }

    /// Per-entity random stream for the current step.
    pub fn rng_for(&self, id: EntityId) -> CosmosRng {
        rng::rng_for(self.seed(), self.step(), id)
    }

    /// Ask viewers to drop per-entity state sampled from this cosmos.
    pub fn request_resample(&mut self) {
        self.resample_requested = true;
    }

    pub fn resample_requested(&self) -> bool {
        self.resample_requested
    }

    /// Read and lower the resample flag.
    pub fn take_resample_request(&mut self) -> bool {
        std::mem::take(&mut self.resample_requested)
    }

    /// Held-item convenience: the item's slot, if any.
    pub fn current_slot(&self, item: EntityId) -> Option<SlotId> {
        self.find::<Item>(item).and_then(|i| i.current_slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_common::{EntityType, SlotFunction, Transform};
    use cosmos_ecs::components::{Name, Processing, RigidBody};
    use cosmos_ecs::invariants::{self, Container, SlotDefinition};
    use cosmos_ecs::{EntityFlavour, EntityInvariants};
    use glam::Vec2;

    struct Fixture {
        cosmos: Cosmos,
        soldier: FlavourId,
        rifle: FlavourId,
        magazine: FlavourId,
    }

    fn fixture() -> Fixture {
        let mut reg = FlavourRegistry::new();
        let soldier = reg
            .register(
                EntityFlavour::new("soldier", EntityType::Character).with_invariants(
                    EntityInvariants {
                        shape: Some(invariants::Shape { radius: 10.0 }),
                        movement: Some(invariants::Movement::default()),
                        sentience: Some(invariants::Sentience { max_health: 100 }),
                        container: Some(Container {
                            slots: vec![
                                SlotDefinition {
                                    function: SlotFunction::PrimaryHand,
                                    capacity: 1,
                                    allows_containers: true,
                                },
                                SlotDefinition {
                                    function: SlotFunction::Back,
                                    capacity: 4,
                                    allows_containers: true,
                                },
                            ],
                        }),
                        ..Default::default()
                    },
                ),
            )
            .unwrap();
        let rifle = reg
            .register(
                EntityFlavour::new("rifle", EntityType::Item).with_invariants(EntityInvariants {
                    item: Some(invariants::Item::default()),
                    container: Some(Container {
                        slots: vec![SlotDefinition {
                            function: SlotFunction::Inside,
                            capacity: 1,
                            allows_containers: false,
                        }],
                    }),
                    ..Default::default()
                }),
            )
            .unwrap();
        let magazine = reg
            .register(
                EntityFlavour::new("magazine", EntityType::Item).with_invariants(
                    EntityInvariants {
                        item: Some(invariants::Item::default()),
                        ..Default::default()
                    },
                ),
            )
            .unwrap();
        Fixture {
            cosmos: Cosmos::new(reg, CosmosSettings::default()),
            soldier,
            rifle,
            magazine,
        }
    }

    fn put(cosmos: &mut Cosmos, item: EntityId, slot: SlotId) {
        cosmos.modify::<Item, _>(item, |i| i.current_slot = Some(slot));
    }

    #[test]
    fn creation_infers_every_cache() {
        let Fixture {
            mut cosmos,
            soldier,
            ..
        } = fixture();
        let id = cosmos.create_entity(soldier, |c| {
            c.transform = Some(Transform::at(Vec2::new(5.0, 5.0)));
        });
        assert_eq!(cosmos.entities_of_flavour(soldier), vec![id]);
        assert_eq!(cosmos.first_named("soldier"), Some(id));
        assert!(cosmos.processing_list(ProcessingSubject::Physics).contains(&id));
        assert!(cosmos.processing_list(ProcessingSubject::Sentience).contains(&id));
        cosmos.assert_caches_consistent();
    }

    #[test]
    fn modify_reinfers_synchronously() {
        let Fixture {
            mut cosmos,
            soldier,
            ..
        } = fixture();
        let id = cosmos.create_entity(soldier, |_| {});

        cosmos.modify::<Name, _>(id, |n| n.0 = "sergeant".into());
        assert!(cosmos.entities_named("soldier").is_empty());
        assert_eq!(cosmos.first_named("sergeant"), Some(id));

        cosmos.modify::<Processing, _>(id, |p| p.disabled.insert(ProcessingSubject::Physics));
        assert!(!cosmos.processing_list(ProcessingSubject::Physics).contains(&id));
        cosmos.assert_caches_consistent();
    }

    #[test]
    fn slotted_items_leave_physics() {
        let Fixture {
            mut cosmos,
            soldier,
            rifle,
            ..
        } = fixture();
        let owner = cosmos.create_entity(soldier, |_| {});
        let gun = cosmos.create_entity(rifle, |_| {});
        assert!(cosmos.processing_list(ProcessingSubject::Physics).contains(&gun));

        let hand = SlotId::new(owner, SlotFunction::PrimaryHand);
        put(&mut cosmos, gun, hand);
        assert!(!cosmos.processing_list(ProcessingSubject::Physics).contains(&gun));
        assert_eq!(cosmos.children_of(owner), vec![gun]);
        assert_eq!(cosmos.parent_of(gun), Some(hand));

        cosmos.modify::<Item, _>(gun, |i| i.current_slot = None);
        assert!(cosmos.children_of(owner).is_empty());
        assert!(cosmos.processing_list(ProcessingSubject::Physics).contains(&gun));
        cosmos.assert_caches_consistent();
    }

    #[test]
    fn descendants_are_depth_first() {
        let Fixture {
            mut cosmos,
            soldier,
            rifle,
            magazine,
        } = fixture();
        let owner = cosmos.create_entity(soldier, |_| {});
        let gun = cosmos.create_entity(rifle, |_| {});
        let mag = cosmos.create_entity(magazine, |_| {});
        let spare = cosmos.create_entity(magazine, |_| {});
        put(&mut cosmos, gun, SlotId::new(owner, SlotFunction::PrimaryHand));
        put(&mut cosmos, mag, SlotId::new(gun, SlotFunction::Inside));
        put(&mut cosmos, spare, SlotId::new(owner, SlotFunction::Back));

        let mut visited = Vec::new();
        cosmos.for_each_descendant(owner, |id| visited.push(id));
        assert_eq!(visited, vec![gun, mag, spare]);
        assert_eq!(cosmos.root_container_of(mag), owner);
        assert!(cosmos.is_descendant_of(mag, owner));
        assert!(!cosmos.is_descendant_of(owner, mag));
    }

    #[test]
    #[should_panic(expected = "still has children")]
    fn deleting_a_parent_first_is_fatal() {
        let Fixture {
            mut cosmos,
            soldier,
            rifle,
            ..
        } = fixture();
        let owner = cosmos.create_entity(soldier, |_| {});
        let gun = cosmos.create_entity(rifle, |_| {});
        put(&mut cosmos, gun, SlotId::new(owner, SlotFunction::PrimaryHand));
        cosmos.delete_entity(owner);
    }

    #[test]
    fn stale_handle_reports_dead_after_reuse() {
        let Fixture {
            mut cosmos,
            magazine,
            ..
        } = fixture();
        let old = cosmos.create_entity(magazine, |_| {});
        cosmos.delete_entity(old);
        let new = cosmos.create_entity(magazine, |_| {});
        assert_eq!(old.index, new.index);
        assert_ne!(old, new);

        let stale = cosmos.get_handle(old);
        assert!(stale.dead());
        assert!(stale.find::<Item>().is_none());
        assert!(cosmos.get_handle(new).alive());
        assert_eq!(cosmos.entities_of_flavour(magazine), vec![new]);
        cosmos.assert_caches_consistent();
    }

    #[test]
    #[should_panic(expected = "dereferenced as live")]
    fn stale_handle_get_is_fatal() {
        let Fixture {
            mut cosmos,
            magazine,
            ..
        } = fixture();
        let id = cosmos.create_entity(magazine, |_| {});
        cosmos.delete_entity(id);
        cosmos.get_handle(id).get::<Item>();
    }

    #[test]
    fn clone_is_unslotted_copy() {
        let Fixture {
            mut cosmos,
            soldier,
            magazine,
            ..
        } = fixture();
        let owner = cosmos.create_entity(soldier, |_| {});
        let mag = cosmos.create_entity(magazine, |c| {
            c.item.as_mut().unwrap().charges = 7;
        });
        put(&mut cosmos, mag, SlotId::new(owner, SlotFunction::Back));

        let copy = cosmos.clone_entity(mag).unwrap();
        assert_eq!(cosmos.get::<Item>(copy).charges, 7);
        assert_eq!(cosmos.current_slot(copy), None);
        assert_eq!(cosmos.children_of(owner), vec![mag]);
        cosmos.assert_caches_consistent();
    }

    #[test]
    fn bulk_edit_reinfers_and_requests_resample() {
        let Fixture {
            mut cosmos,
            soldier,
            ..
        } = fixture();
        let id = cosmos.create_entity(soldier, |_| {});
        cosmos.bulk_edit(|s| {
            s.store_mut().find_component_mut::<Name>(id).unwrap().0 = "renamed".into();
        });
        assert_eq!(cosmos.first_named("renamed"), Some(id));
        assert!(cosmos.take_resample_request());
        assert!(!cosmos.resample_requested());
        cosmos.assert_caches_consistent();
    }

    #[test]
    #[should_panic(expected = "inferred caches diverged")]
    fn skipped_inference_is_detected() {
        let Fixture {
            mut cosmos,
            soldier,
            ..
        } = fixture();
        let id = cosmos.create_entity(soldier, |_| {});
        // Writing through the raw store skips inference.
        cosmos
            .significant
            .store_mut()
            .find_component_mut::<Name>(id)
            .unwrap()
            .0 = "ghost".into();
        cosmos.assert_caches_consistent();
    }

    #[test]
    fn free_components_are_mutable_in_place() {
        let Fixture {
            mut cosmos,
            soldier,
            ..
        } = fixture();
        let id = cosmos.create_entity(soldier, |_| {});
        cosmos.get_mut::<RigidBody>(id).velocity = Vec2::X;
        assert_eq!(cosmos.get::<RigidBody>(id).velocity, Vec2::X);
    }

    #[test]
    fn from_significant_matches_incremental_build() {
        let Fixture {
            mut cosmos,
            soldier,
            rifle,
            ..
        } = fixture();
        let owner = cosmos.create_entity(soldier, |_| {});
        let gun = cosmos.create_entity(rifle, |_| {});
        put(&mut cosmos, gun, SlotId::new(owner, SlotFunction::PrimaryHand));

        let rebuilt = Cosmos::from_significant(cosmos.significant().clone());
        assert!(rebuilt.caches() == cosmos.caches());
    }

    #[test]
    fn per_entity_rng_depends_on_step() {
        use rand::Rng;
        let Fixture {
            mut cosmos,
            soldier,
            ..
        } = fixture();
        let id = cosmos.create_entity(soldier, |_| {});
        let a: u64 = cosmos.rng_for(id).r#gen();
        let again: u64 = cosmos.rng_for(id).r#gen();
        cosmos.increment_step();
        let b: u64 = cosmos.rng_for(id).r#gen();
        assert_eq!(a, again);
        assert_ne!(a, b);
    }
}
