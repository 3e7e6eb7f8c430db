use cosmos_common::{EntityId, SlotId};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A high-level intent produced by the input translation layer.
///
/// The kernel consumes intents, never raw key or mouse events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Shoot,
    Melee,
    /// Enter or leave a nearby vehicle.
    UseButton,
    /// Drop whatever is held in the primary hand.
    ThrowItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub pressed: bool,
}

impl Intent {
    pub fn pressed(kind: IntentKind) -> Self {
        Self {
            kind,
            pressed: true,
        }
    }

    pub fn released(kind: IntentKind) -> Self {
        Self {
            kind,
            pressed: false,
        }
    }
}

/// Move an item into a slot, or drop it when `target` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub item: EntityId,
    pub target: Option<SlotId>,
    /// Number of charges to move; `None` moves the whole stack.
    pub quantity: Option<u32>,
}

impl TransferRequest {
    pub fn to_slot(item: EntityId, target: SlotId) -> Self {
        Self {
            item,
            target: Some(target),
            quantity: None,
        }
    }

    pub fn drop_item(item: EntityId) -> Self {
        Self {
            item,
            target: None,
            quantity: None,
        }
    }
}

/// Input of a single controlled character for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntropy {
    pub intents: Vec<Intent>,
    /// Accumulated crosshair motion in world units.
    pub motion: Vec2,
}

impl PlayerEntropy {
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty() && self.motion == Vec2::ZERO
    }
}

/// All entropy applied in one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CosmicEntropy {
    pub players: BTreeMap<EntityId, PlayerEntropy>,
    pub transfer_requests: Vec<TransferRequest>,
}

impl CosmicEntropy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.players.values().all(PlayerEntropy::is_empty) && self.transfer_requests.is_empty()
    }

    /// Number of discrete entries, used for profiling.
    pub fn length(&self) -> usize {
        self.players
            .values()
            .map(|p| p.intents.len() + usize::from(p.motion != Vec2::ZERO))
            .sum::<usize>()
            + self.transfer_requests.len()
    }

    pub fn player(&mut self, character: EntityId) -> &mut PlayerEntropy {
        self.players.entry(character).or_default()
    }

    pub fn with_intent(mut self, character: EntityId, intent: Intent) -> Self {
        self.player(character).intents.push(intent);
        self
    }

    pub fn with_motion(mut self, character: EntityId, motion: Vec2) -> Self {
        self.player(character).motion += motion;
        self
    }

    pub fn with_transfer(mut self, request: TransferRequest) -> Self {
        self.transfer_requests.push(request);
        self
    }

    /// Fold another entropy into this one, preserving order of arrival.
    pub fn merge(&mut self, other: CosmicEntropy) {
        for (id, p) in other.players {
            let mine = self.player(id);
            mine.intents.extend(p.intents);
            mine.motion += p.motion;
        }
        self.transfer_requests.extend(other.transfer_requests);
    }
}
