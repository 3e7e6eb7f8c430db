use cosmos_common::{EntityId, FixedDelta, FlavourId};
use cosmos_ecs::components::{self, Meter};
use cosmos_ecs::{EntityComponents, EntityFlavour, FlavourRegistry, invariants};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{EntitySolvable, EntityStore};

/// Parameters fixed when a cosmos is created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmosSettings {
    pub delta: FixedDelta,
    /// Root of every per-entity random stream.
    pub seed: u64,
}

impl Default for CosmosSettings {
    fn default() -> Self {
        Self {
            delta: FixedDelta::from_tickrate(60),
            seed: 0,
        }
    }
}

/// Logical clock of a cosmos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmicClock {
    pub step: u64,
    pub delta: FixedDelta,
}

impl CosmicClock {
    pub fn now_ms(&self) -> u64 {
        self.step * self.delta.ms as u64
    }
}

/// The significant (authoritative, serializable) state of a cosmos.
///
/// Everything needed to reproduce the future of a simulation lives here;
/// inferred caches are derived from it and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmosSolvable {
    flavours: Arc<FlavourRegistry>,
    store: EntityStore,
    clock: CosmicClock,
    seed: u64,
}

impl CosmosSolvable {
    pub fn new(flavours: Arc<FlavourRegistry>, settings: CosmosSettings) -> Self {
        Self {
            flavours,
            store: EntityStore::new(),
            clock: CosmicClock {
                step: 0,
                delta: settings.delta,
            },
            seed: settings.seed,
        }
    }

    pub fn flavours(&self) -> &FlavourRegistry {
        &self.flavours
    }

    pub fn shared_flavours(&self) -> Arc<FlavourRegistry> {
        Arc::clone(&self.flavours)
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Raw store access for bulk edits; callers must reinfer afterwards.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn clock(&self) -> CosmicClock {
        self.clock
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn increment_step(&mut self) {
        self.clock.step += 1;
    }

    /// Allocate an entity with flavour defaults, then apply `init`.
    ///
    /// This is the pre-inference half of entity construction; the cosmos
    /// infers caches right after.
    pub fn allocate_entity(
        &mut self,
        flavour_id: FlavourId,
        init: impl FnOnce(&mut EntityComponents),
    ) -> EntityId {
        let flavour = self.flavours.get(flavour_id);
        let mut components = construct_components(flavour);
        init(&mut components);
        self.store.create(EntitySolvable {
            flavour: flavour_id,
            components,
        })
    }
}

fn construct_components(flavour: &EntityFlavour) -> EntityComponents {
    let mut c = EntityComponents::for_type(flavour.entity_type);

    c.name = Some(components::Name(flavour.name.clone()));

    if let (Some(sentience), Some(def)) = (
        c.sentience.as_mut(),
        flavour.find::<invariants::Sentience>(),
    ) {
        sentience.health = Meter::full(def.max_health);
    }

    if let (Some(missile), Some(def)) = (c.missile.as_mut(), flavour.find::<invariants::Missile>()) {
        missile.lifetime_left_ms = def.lifetime_ms;
    }

    if let (Some(animation), Some(def)) = (
        c.animation.as_mut(),
        flavour.find::<invariants::Animation>(),
    ) {
        animation.playing = def.looping;
    }

    c
}

/// Post-inference checks on a freshly constructed entity's flavour.
pub(crate) fn emit_warnings(id: EntityId, flavour: &EntityFlavour) {
    if let Some(sprite) = flavour.find::<invariants::Sprite>() {
        if sprite.size == glam::Vec2::ZERO {
            tracing::warn!(%id, flavour = %flavour.name, "unset field: sprite.size");
        }
    }
    if let Some(container) = flavour.find::<invariants::Container>() {
        if container.slots.is_empty() {
            tracing::warn!(%id, flavour = %flavour.name, "unset field: container.slots");
        }
    }
    if let Some(animation) = flavour.find::<invariants::Animation>() {
        if animation.frame_count == 0 || animation.frame_duration_ms == 0 {
            tracing::warn!(%id, flavour = %flavour.name, "unset field: animation frames");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_common::EntityType;
    use cosmos_ecs::EntityInvariants;

    fn registry() -> (Arc<FlavourRegistry>, FlavourId) {
        let mut reg = FlavourRegistry::new();
        let id = reg
            .register(
                EntityFlavour::new("soldier", EntityType::Character).with_invariants(
                    EntityInvariants {
                        shape: Some(invariants::Shape { radius: 10.0 }),
                        movement: Some(invariants::Movement::default()),
                        sentience: Some(invariants::Sentience { max_health: 80 }),
                        ..Default::default()
                    },
                ),
            )
            .unwrap();
        (Arc::new(reg), id)
    }

    #[test]
    fn construction_applies_flavour_defaults() {
        let (flavours, soldier) = registry();
        let mut s = CosmosSolvable::new(flavours, CosmosSettings::default());
        let id = s.allocate_entity(soldier, |_| {});
        let health = s.store().get::<components::Sentience>(id).health;
        assert_eq!(health, Meter::full(80));
        assert_eq!(s.store().get::<components::Name>(id).0, "soldier");
    }

    #[test]
    fn init_runs_after_defaults() {
        let (flavours, soldier) = registry();
        let mut s = CosmosSolvable::new(flavours, CosmosSettings::default());
        let id = s.allocate_entity(soldier, |c| {
            c.sentience.as_mut().unwrap().health.value = 5;
        });
        assert_eq!(s.store().get::<components::Sentience>(id).health.value, 5);
    }

    #[test]
    fn clock_advances() {
        let (flavours, _) = registry();
        let mut s = CosmosSolvable::new(
            flavours,
            CosmosSettings {
                delta: FixedDelta { ms: 10 },
                seed: 1,
            },
        );
        s.increment_step();
        s.increment_step();
        assert_eq!(s.clock().step, 2);
        assert_eq!(s.clock().now_ms(), 20);
    }
}
