use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of entity types a cosmos can hold.
///
/// Every type owns its own entity pool and a fixed set of component slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Character,
    Item,
    Missile,
    Vehicle,
    Decoration,
}

impl EntityType {
    pub const COUNT: usize = 5;

    pub const ALL: [EntityType; Self::COUNT] = [
        EntityType::Character,
        EntityType::Item,
        EntityType::Missile,
        EntityType::Vehicle,
        EntityType::Decoration,
    ];

    /// Position of this type in per-type arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Generational identifier of an entity.
///
/// A slot index is reused only after its generation is bumped, so an id that
/// outlived its entity can never alias the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub entity_type: EntityType,
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(entity_type: EntityType, index: u32, generation: u32) -> Self {
        Self {
            entity_type,
            index,
            generation,
        }
    }

    /// Stable 64-bit key, used to seed per-entity randomness.
    pub fn to_bits(self) -> u64 {
        ((self.entity_type.index() as u64) << 56)
            ^ ((self.index as u64) << 24)
            ^ self.generation as u64
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}#{}v{}",
            self.entity_type, self.index, self.generation
        )
    }
}

/// Identifies a flavour (entity template) inside the flavour registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlavourId {
    pub entity_type: EntityType,
    pub index: u32,
}

impl FlavourId {
    pub fn new(entity_type: EntityType, index: u32) -> Self {
        Self { entity_type, index }
    }
}

/// Role of a container slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotFunction {
    PrimaryHand,
    SecondaryHand,
    Back,
    Inside,
}

/// A slot on a specific container entity.
///
/// Children refer to their parent only through this id; parents never hold
/// references, only the relational cache derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId {
    pub container: EntityId,
    pub function: SlotFunction,
}

impl SlotId {
    pub fn new(container: EntityId, function: SlotFunction) -> Self {
        Self {
            container,
            function,
        }
    }
}

/// 2D logic transform: position in world units, rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub pos: Vec2,
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn at(pos: Vec2) -> Self {
        Self { pos, rotation: 0.0 }
    }

    pub fn new(pos: Vec2, rotation: f32) -> Self {
        Self { pos, rotation }
    }

    /// Unit vector the transform is facing.
    pub fn direction(&self) -> Vec2 {
        crate::repro::unit_vector(self.rotation.to_radians())
    }

    /// Linear blend towards `target`, used by presentation-side smoothing.
    pub fn interpolated(&self, target: &Transform, alpha: f32) -> Transform {
        Transform {
            pos: self.pos.lerp(target.pos, alpha),
            rotation: self.rotation + (target.rotation - self.rotation) * alpha,
        }
    }
}

/// Fixed simulation timestep in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDelta {
    pub ms: u32,
}

impl Default for FixedDelta {
    fn default() -> Self {
        Self::from_tickrate(60)
    }
}

impl FixedDelta {
    pub fn from_tickrate(ticks_per_second: u32) -> Self {
        assert!(ticks_per_second > 0, "tickrate must be positive");
        Self {
            ms: (1000 / ticks_per_second).max(1),
        }
    }

    pub fn in_seconds(&self) -> f32 {
        self.ms as f32 / 1000.0
    }
}
