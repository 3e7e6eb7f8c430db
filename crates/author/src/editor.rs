use cosmos_common::{EntityId, FlavourId, SlotId, Transform};
use cosmos_ecs::components::{Item, Name, Sentience};
use cosmos_ecs::invariants::Container;
use cosmos_input::TransferRequest;
use cosmos_kernel::{Cosmos, CosmosSolvable};
use cosmos_solver::{TransferResult, query_transfer_result};

/// An edit applied directly to significant state.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    Spawn {
        flavour: FlavourId,
        transform: Transform,
    },
    /// Deletes the entity and everything it carries.
    Delete { id: EntityId },
    SetTransform { id: EntityId, transform: Transform },
    Rename { id: EntityId, name: String },
    SetHealth { id: EntityId, value: i32 },
    /// Put an item into a slot, or on the ground when `slot` is `None`.
    MoveItem { item: EntityId, slot: Option<SlotId> },
}

impl EditCommand {
    fn label(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Delete { .. } => "delete",
            Self::SetTransform { .. } => "set transform",
            Self::Rename { .. } => "rename",
            Self::SetHealth { .. } => "set health",
            Self::MoveItem { .. } => "move item",
        }
    }
}

/// Errors from edit operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EditError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("flavour {0:?} is not registered")]
    UnknownFlavour(FlavourId),
    #[error("entity {id} has no {component} component")]
    MissingComponent {
        id: EntityId,
        component: &'static str,
    },
    #[error("item move rejected: {0:?}")]
    TransferRejected(TransferResult),
}

struct Memento {
    label: &'static str,
    state: CosmosSolvable,
}

/// Applies edits to a cosmos and keeps the state before each one.
///
/// Entity ids are generational, so re-creating a deleted entity under its
/// old id is impossible; history stores whole significant states instead of
/// inverse commands.
pub struct Editor {
    undo_stack: Vec<Memento>,
    redo_stack: Vec<Memento>,
    max_history: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_history(64)
    }

    /// Keep at most `max_history` undo steps; older ones are forgotten.
    pub fn with_history(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    /// Validate and apply `command`. Returns the spawned entity for `Spawn`.
    pub fn apply(
        &mut self,
        cosmos: &mut Cosmos,
        command: EditCommand,
    ) -> Result<Option<EntityId>, EditError> {
        validate(cosmos, &command)?;

        let before = cosmos.significant().clone();
        let resolved = resolve(cosmos, &command);
        let spawned = cosmos.bulk_edit(|s| perform(s, &command, &resolved));
        tracing::debug!(edit = command.label(), step = cosmos.step(), "applied edit");

        self.push_undo(Memento {
            label: command.label(),
            state: before,
        });
        self.redo_stack.clear();
        Ok(spawned)
    }

    fn push_undo(&mut self, memento: Memento) {
        if self.undo_stack.len() == self.max_history {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(memento);
    }

    /// Undo the last edit. Returns true if an edit was undone.
    pub fn undo(&mut self, cosmos: &mut Cosmos) -> bool {
        let Some(memento) = self.undo_stack.pop() else {
            return false;
        };
        let label = memento.label;
        let after = cosmos.significant().clone();
        cosmos.assign_significant(memento.state);
        self.redo_stack.push(Memento {
            label,
            state: after,
        });
        tracing::debug!(edit = label, "undone");
        true
    }

    /// Redo the last undone edit. Returns true if an edit was redone.
    pub fn redo(&mut self, cosmos: &mut Cosmos) -> bool {
        let Some(memento) = self.redo_stack.pop() else {
            return false;
        };
        let label = memento.label;
        let before = cosmos.significant().clone();
        cosmos.assign_significant(memento.state);
        self.push_undo(Memento {
            label,
            state: before,
        });
        tracing::debug!(edit = label, "redone");
        true
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the edit `undo` would revert.
    pub fn next_undo(&self) -> Option<&'static str> {
        self.undo_stack.last().map(|m| m.label)
    }
}

fn require_alive(cosmos: &Cosmos, id: EntityId) -> Result<(), EditError> {
    if cosmos.is_alive(id) {
        Ok(())
    } else {
        Err(EditError::EntityNotFound(id))
    }
}

fn validate(cosmos: &Cosmos, command: &EditCommand) -> Result<(), EditError> {
    match command {
        EditCommand::Spawn { flavour, .. } => {
            if cosmos.flavours().find(*flavour).is_none() {
                return Err(EditError::UnknownFlavour(*flavour));
            }
        }
        EditCommand::Delete { id }
        | EditCommand::SetTransform { id, .. }
        | EditCommand::Rename { id, .. } => require_alive(cosmos, *id)?,
        EditCommand::SetHealth { id, .. } => {
            require_alive(cosmos, *id)?;
            if cosmos.find::<Sentience>(*id).is_none() {
                return Err(EditError::MissingComponent {
                    id: *id,
                    component: "sentience",
                });
            }
        }
        EditCommand::MoveItem { item, slot } => {
            require_alive(cosmos, *item)?;
            let request = TransferRequest {
                item: *item,
                target: *slot,
                quantity: None,
            };
            let result = query_transfer_result(cosmos, &request);
            if !result.is_successful() {
                return Err(EditError::TransferRejected(result));
            }
            // Edits never merge stacks, so a matching stack does not make room.
            if let Some(slot) = slot {
                let capacity = cosmos
                    .get_handle(slot.container)
                    .find_invariant::<Container>()
                    .and_then(|c| c.slot(slot.function))
                    .map_or(0, |d| d.capacity as usize);
                if cosmos.children_of_slot(*slot).len() >= capacity {
                    return Err(EditError::TransferRejected(TransferResult::SlotFull));
                }
            }
        }
    }
    Ok(())
}

/// Facts about the cosmos an edit needs once the caches are out of reach.
#[derive(Default)]
struct Resolved {
    /// Children first, the edited entity last.
    doomed: Vec<EntityId>,
    /// Where an item lands when moved to the ground.
    drop_at: Option<Transform>,
}

fn resolve(cosmos: &Cosmos, command: &EditCommand) -> Resolved {
    match command {
        EditCommand::Delete { id } => {
            let mut doomed = Vec::new();
            cosmos.for_each_descendant(*id, |d| doomed.push(d));
            doomed.reverse();
            doomed.push(*id);
            Resolved {
                doomed,
                ..Default::default()
            }
        }
        EditCommand::MoveItem { item, slot: None } => {
            let root = cosmos.root_container_of(*item);
            Resolved {
                drop_at: cosmos.find::<Transform>(root).copied(),
                ..Default::default()
            }
        }
        _ => Resolved::default(),
    }
}

/// Apply a validated command to raw significant state.
fn perform(
    s: &mut CosmosSolvable,
    command: &EditCommand,
    resolved: &Resolved,
) -> Option<EntityId> {
    if let EditCommand::Spawn { flavour, transform } = command {
        let transform = *transform;
        return Some(s.allocate_entity(*flavour, |c| c.transform = Some(transform)));
    }

    let store = s.store_mut();
    match command {
        EditCommand::Spawn { .. } => {}
        EditCommand::Delete { .. } => {
            for id in &resolved.doomed {
                store.destroy(*id);
            }
        }
        EditCommand::SetTransform { id, transform } => {
            if let Some(t) = store.find_component_mut::<Transform>(*id) {
                *t = *transform;
            }
        }
        EditCommand::Rename { id, name } => {
            if let Some(n) = store.find_component_mut::<Name>(*id) {
                n.0.clone_from(name);
            }
        }
        EditCommand::SetHealth { id, value } => {
            if let Some(sentience) = store.find_component_mut::<Sentience>(*id) {
                sentience.health.value = (*value).clamp(0, sentience.health.maximum);
            }
        }
        EditCommand::MoveItem { item, slot } => {
            if let Some(i) = store.find_component_mut::<Item>(*item) {
                i.current_slot = *slot;
            }
            if let Some(at) = resolved.drop_at {
                if let Some(t) = store.find_component_mut::<Transform>(*item) {
                    *t = at;
                }
            }
        }
    }
    None
}
