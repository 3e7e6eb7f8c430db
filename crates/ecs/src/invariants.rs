//! Flavour-owned, immutable data shared by every instance of a flavour.

use cosmos_common::{FlavourId, SlotFunction};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An invariant slot of [`EntityInvariants`], addressable by type.
pub trait Invariant: Sized + 'static {
    const NAME: &'static str;

    fn slot(invariants: &EntityInvariants) -> Option<&Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub size: Vec2,
    pub color: [u8; 4],
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            size: Vec2::ZERO,
            color: [255; 4],
        }
    }
}

/// Collision circle used by the physics step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub acceleration: f32,
    pub max_speed: f32,
    /// Fraction of velocity kept per second when no force is applied.
    pub damping: f32,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            acceleration: 2000.0,
            max_speed: 300.0,
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentience {
    pub max_health: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub function: SlotFunction,
    pub capacity: u32,
    /// Whether items that are themselves containers may be placed here.
    pub allows_containers: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub slots: Vec<SlotDefinition>,
}

impl Container {
    pub fn slot(&self, function: SlotFunction) -> Option<&SlotDefinition> {
        self.slots.iter().find(|s| s.function == function)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub stackable: bool,
    pub max_charges: u32,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            stackable: false,
            max_charges: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gun {
    pub missile_flavour: FlavourId,
    pub muzzle_speed: f32,
    pub cooldown_ms: u32,
    pub spread_degrees: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Melee {
    pub range: f32,
    pub damage: i32,
    pub cooldown_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missile {
    pub damage: i32,
    pub lifetime_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub acceleration: f32,
    pub max_speed: f32,
    /// Distance within which a character may take the wheel.
    pub entry_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub frame_count: u32,
    pub frame_duration_ms: u32,
    pub looping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ai {
    pub sight_range: f32,
}

/// All invariant slots of one flavour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityInvariants {
    pub sprite: Option<Sprite>,
    pub shape: Option<Shape>,
    pub movement: Option<Movement>,
    pub sentience: Option<Sentience>,
    pub container: Option<Container>,
    pub item: Option<Item>,
    pub gun: Option<Gun>,
    pub melee: Option<Melee>,
    pub missile: Option<Missile>,
    pub vehicle: Option<Vehicle>,
    pub animation: Option<Animation>,
    pub ai: Option<Ai>,
}

impl EntityInvariants {
    pub fn find<I: Invariant>(&self) -> Option<&I> {
        I::slot(self)
    }

    pub fn has<I: Invariant>(&self) -> bool {
        I::slot(self).is_some()
    }
}

macro_rules! invariant_slot {
    ($ty:ty, $field:ident) => {
        impl Invariant for $ty {
            const NAME: &'static str = stringify!($field);

            fn slot(invariants: &EntityInvariants) -> Option<&Self> {
                invariants.$field.as_ref()
            }
        }
    };
}

invariant_slot!(Sprite, sprite);
invariant_slot!(Shape, shape);
invariant_slot!(Movement, movement);
invariant_slot!(Sentience, sentience);
invariant_slot!(Container, container);
invariant_slot!(Item, item);
invariant_slot!(Gun, gun);
invariant_slot!(Melee, melee);
invariant_slot!(Missile, missile);
invariant_slot!(Vehicle, vehicle);
invariant_slot!(Animation, animation);
invariant_slot!(Ai, ai);
