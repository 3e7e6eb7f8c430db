//! Per-instance mutable state.

use cosmos_common::{EntityId, EntityType, SlotId, Transform};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::processing::ProcessingFlags;

/// A component slot of [`EntityComponents`], addressable by type.
pub trait Component: Sized + 'static {
    const NAME: &'static str;

    fn slot(components: &EntityComponents) -> Option<&Self>;
    fn slot_mut(components: &mut EntityComponents) -> Option<&mut Self>;
}

/// A component that no inferred cache depends on; it may be borrowed mutably.
pub trait FreeComponent: Component {}

/// A component that drives inferred cache membership.
///
/// Mutation must go through `Cosmos::modify`, which re-infers the entity's
/// caches before returning.
pub trait SynchronizedComponent: Component {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub velocity: Vec2,
    pub angular_velocity: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementFlags {
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub flags: MovementFlags,
    /// Direction requested by the behaviour system, added to `flags`.
    pub steering: Vec2,
}

impl Movement {
    pub fn requested_direction(&self) -> Vec2 {
        (self.flags.direction() + self.steering).normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub value: i32,
    pub maximum: i32,
}

impl Meter {
    pub fn full(maximum: i32) -> Self {
        Self {
            value: maximum,
            maximum,
        }
    }

    /// Applies a signed change clamped to `[0, maximum]`; returns the effective amount.
    pub fn apply(&mut self, amount: i32) -> i32 {
        let before = self.value;
        self.value = (self.value + amount).clamp(0, self.maximum);
        self.value - before
    }

    pub fn is_depleted(&self) -> bool {
        self.value <= 0
    }

    pub fn ratio(&self) -> f32 {
        if self.maximum == 0 {
            return 0.0;
        }
        self.value as f32 / self.maximum as f32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentience {
    pub health: Meter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Crosshair {
    pub base_offset: Vec2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Melee {
    pub cooldown_left_ms: u32,
    pub swing_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub current_slot: Option<SlotId>,
    pub charges: u32,
    /// Time left before a dropped item may be picked up again.
    pub pickup_timeout_ms: u32,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            current_slot: None,
            charges: 1,
            pickup_timeout_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gun {
    pub cooldown_left_ms: u32,
    pub trigger_pressed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missile {
    pub lifetime_left_ms: u32,
    pub sender: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceJoint {
    pub target: Option<EntityId>,
    pub strength: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub driver: Option<EntityId>,
    pub steering: MovementFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub vehicle: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ai {
    pub target: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub frame: u32,
    pub elapsed_ms: u32,
    pub playing: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionCopying {
    pub target: Option<EntityId>,
    pub offset: Vec2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processing {
    /// Subjects this entity opts out of, on top of its type defaults.
    pub disabled: ProcessingFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

/// All component slots of one entity. A `None` slot is one its type does not own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityComponents {
    pub transform: Option<Transform>,
    pub rigid_body: Option<RigidBody>,
    pub movement: Option<Movement>,
    pub sentience: Option<Sentience>,
    pub crosshair: Option<Crosshair>,
    pub melee: Option<Melee>,
    pub item: Option<Item>,
    pub gun: Option<Gun>,
    pub missile: Option<Missile>,
    pub force_joint: Option<ForceJoint>,
    pub vehicle: Option<Vehicle>,
    pub driver: Option<Driver>,
    pub ai: Option<Ai>,
    pub animation: Option<Animation>,
    pub position_copying: Option<PositionCopying>,
    pub processing: Option<Processing>,
    pub name: Option<Name>,
}

impl EntityComponents {
    /// Default-initialized slots for every component the type owns.
    pub fn for_type(entity_type: EntityType) -> Self {
        let mut c = EntityComponents {
            transform: Some(Transform::default()),
            processing: Some(Processing::default()),
            name: Some(Name::default()),
            ..Default::default()
        };

        match entity_type {
            EntityType::Character => {
                c.rigid_body = Some(RigidBody::default());
                c.movement = Some(Movement::default());
                c.sentience = Some(Sentience::default());
                c.crosshair = Some(Crosshair::default());
                c.melee = Some(Melee::default());
                c.driver = Some(Driver::default());
                c.ai = Some(Ai::default());
                c.animation = Some(Animation::default());
            }
            EntityType::Item => {
                c.rigid_body = Some(RigidBody::default());
                c.item = Some(Item::default());
                c.gun = Some(Gun::default());
            }
            EntityType::Missile => {
                c.rigid_body = Some(RigidBody::default());
                c.missile = Some(Missile::default());
                c.force_joint = Some(ForceJoint::default());
            }
            EntityType::Vehicle => {
                c.rigid_body = Some(RigidBody::default());
                c.vehicle = Some(Vehicle::default());
            }
            EntityType::Decoration => {
                c.animation = Some(Animation::default());
                c.position_copying = Some(PositionCopying::default());
            }
        }

        c
    }

    pub fn find<C: Component>(&self) -> Option<&C> {
        C::slot(self)
    }

    pub fn find_mut<C: Component>(&mut self) -> Option<&mut C> {
        C::slot_mut(self)
    }

    pub fn has<C: Component>(&self) -> bool {
        C::slot(self).is_some()
    }
}

macro_rules! component_slot {
    ($ty:ty, $field:ident, $kind:ident) => {
        impl Component for $ty {
            const NAME: &'static str = stringify!($field);

            fn slot(components: &EntityComponents) -> Option<&Self> {
                components.$field.as_ref()
            }

            fn slot_mut(components: &mut EntityComponents) -> Option<&mut Self> {
                components.$field.as_mut()
            }
        }

        impl $kind for $ty {}
    };
}

component_slot!(Transform, transform, FreeComponent);
component_slot!(RigidBody, rigid_body, FreeComponent);
component_slot!(Movement, movement, FreeComponent);
component_slot!(Sentience, sentience, FreeComponent);
component_slot!(Crosshair, crosshair, FreeComponent);
component_slot!(Melee, melee, FreeComponent);
component_slot!(Item, item, SynchronizedComponent);
component_slot!(Gun, gun, FreeComponent);
component_slot!(Missile, missile, FreeComponent);
component_slot!(ForceJoint, force_joint, FreeComponent);
component_slot!(Vehicle, vehicle, FreeComponent);
component_slot!(Driver, driver, FreeComponent);
component_slot!(Ai, ai, FreeComponent);
component_slot!(Animation, animation, FreeComponent);
component_slot!(PositionCopying, position_copying, FreeComponent);
component_slot!(Processing, processing, SynchronizedComponent);
component_slot!(Name, name, SynchronizedComponent);
