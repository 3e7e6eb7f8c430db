//! Step-scoped message types and their queues.
//!
//! Queues are plain FIFOs. Nothing is dropped implicitly: the system that
//! fully consumes a queue clears it, and the solver clears everything left at
//! the end of the step.

use cosmos_common::{EntityId, Transform};
use cosmos_input::{Intent, TransferRequest};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value that can be posted to a [`MessageQueues`].
pub trait Message: Clone + fmt::Debug + 'static {
    const NAME: &'static str;

    fn queue(queues: &MessageQueues) -> &Vec<Self>;
    fn queue_mut(queues: &mut MessageQueues) -> &mut Vec<Self>;
}

/// An intent bound to the character that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentMessage {
    pub subject: EntityId,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionMessage {
    pub subject: EntityId,
    pub offset: Vec2,
}

/// Posted once per contact pair and per participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionMessage {
    pub subject: EntityId,
    pub collider: EntityId,
    pub point: Vec2,
    /// Unit vector from `subject` towards `collider`.
    pub normal: Vec2,
    pub impact_velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageMessage {
    pub subject: EntityId,
    pub amount: i32,
    pub origin: Option<EntityId>,
    pub point: Vec2,
    pub impact_velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthEventResult {
    None,
    Death,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub subject: EntityId,
    /// Signed change actually applied after clamping.
    pub effective_amount: i32,
    pub point: Vec2,
    pub origin: Option<EntityId>,
    pub result: HealthEventResult,
}

/// Request to destroy an entity and everything it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDestruction {
    pub subject: EntityId,
}

impl QueueDestruction {
    pub fn new(subject: EntityId) -> Self {
        Self { subject }
    }
}

/// An entity doomed this step, in deletion order reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WillBeDeleted {
    pub subject: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GunshotMessage {
    pub gun: EntityId,
    pub shooter: Option<EntityId>,
    pub muzzle: Transform,
    pub missile: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeleeSwingMessage {
    pub subject: EntityId,
    pub hit: Option<EntityId>,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoundKind {
    Gunshot,
    Swing,
    Impact,
    Death,
    Pickup,
    Engine,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundEffect {
    pub kind: SoundKind,
    pub pos: Vec2,
    /// Entity the sound should follow, if any.
    pub subject: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParticleKind {
    MuzzleFlash,
    Blood,
    Sparks,
    Debris,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleEffect {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub direction: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationAction {
    Start,
    Stop,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationMessage {
    pub subject: EntityId,
    pub action: AnimationAction,
}

macro_rules! message_queues {
    ($($ty:ty => $field:ident),* $(,)?) => {
        /// One FIFO queue per message type.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct MessageQueues {
            $($field: Vec<$ty>,)*
        }

        $(
            impl Message for $ty {
                const NAME: &'static str = stringify!($field);

                fn queue(queues: &MessageQueues) -> &Vec<Self> {
                    &queues.$field
                }

                fn queue_mut(queues: &mut MessageQueues) -> &mut Vec<Self> {
                    &mut queues.$field
                }
            }
        )*

        impl MessageQueues {
            pub fn clear_all(&mut self) {
                $(self.$field.clear();)*
            }

            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_empty())*
            }

            pub fn total_len(&self) -> usize {
                0 $(+ self.$field.len())*
            }

            /// Pending count per queue, in declaration order.
            pub fn lens(&self) -> Vec<(&'static str, usize)> {
                vec![$((<$ty as Message>::NAME, self.$field.len()),)*]
            }
        }
    };
}

message_queues! {
    IntentMessage => intents,
    MotionMessage => motions,
    CollisionMessage => collisions,
    DamageMessage => damages,
    HealthEvent => health_events,
    QueueDestruction => queue_destruction,
    WillBeDeleted => will_be_deleted,
    TransferRequest => transfer_requests,
    GunshotMessage => gunshots,
    MeleeSwingMessage => melee_swings,
    SoundEffect => sounds,
    ParticleEffect => particles,
    AnimationMessage => animations,
}

impl MessageQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post<M: Message>(&mut self, message: M) {
        M::queue_mut(self).push(message);
    }

    pub fn get_queue<M: Message>(&self) -> &[M] {
        M::queue(self)
    }

    pub fn get_queue_mut<M: Message>(&mut self) -> &mut Vec<M> {
        M::queue_mut(self)
    }

    /// Move a queue out, leaving it empty. For systems that fully consume it.
    pub fn take_queue<M: Message>(&mut self) -> Vec<M> {
        std::mem::take(M::queue_mut(self))
    }

    pub fn len_of<M: Message>(&self) -> usize {
        M::queue(self).len()
    }
}
