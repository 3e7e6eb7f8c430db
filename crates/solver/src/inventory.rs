//! Item slot transfers: validation, stacking, splitting and dropping.

use cosmos_common::{EntityId, SlotId, Transform, repro};
use cosmos_ecs::components::{Gun, Item, RigidBody};
use cosmos_ecs::invariants::{self, Container};
use cosmos_input::TransferRequest;
use cosmos_kernel::messages::{QueueDestruction, SoundEffect, SoundKind};
use cosmos_kernel::{Cosmos, LogicStep};
use rand::Rng;

/// Time a dropped item ignores touching characters.
pub const DROP_PICKUP_TIMEOUT_MS: u32 = 500;
const DROP_SPEED: f32 = 60.0;
const DROP_SCATTER: f32 = 20.0;

/// Outcome of validating a [`TransferRequest`] against the current cosmos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    Successful { charges: u32 },
    InvalidItem,
    InvalidQuantity,
    InvalidSlot,
    /// The target slot is inside the item being moved.
    WouldCreateCycle,
    ContainerNotAllowed,
    SlotFull,
    NoChange,
}

impl TransferResult {
    pub fn is_successful(self) -> bool {
        matches!(self, TransferResult::Successful { .. })
    }
}

/// A stack in `slot` that `item` can merge into.
fn stack_target(cosmos: &Cosmos, item: EntityId, slot: SlotId) -> Option<EntityId> {
    let handle = cosmos.get_handle(item);
    let stackable = handle
        .find_invariant::<invariants::Item>()
        .is_some_and(|def| def.stackable);
    if !stackable {
        return None;
    }
    let flavour = handle.flavour_id();
    cosmos
        .children_of_slot(slot)
        .into_iter()
        .find(|other| *other != item && cosmos.get_handle(*other).flavour_id() == flavour)
}

/// Validate a request without touching the cosmos.
pub fn query_transfer_result(cosmos: &Cosmos, request: &TransferRequest) -> TransferResult {
    let handle = cosmos.get_handle(request.item);
    let Some(item) = handle.find::<Item>() else {
        return TransferResult::InvalidItem;
    };

    let charges = request.quantity.unwrap_or(item.charges).min(item.charges);
    if charges == 0 {
        return TransferResult::InvalidQuantity;
    }

    let Some(slot) = request.target else {
        return match item.current_slot {
            Some(_) => TransferResult::Successful { charges },
            None => TransferResult::NoChange,
        };
    };

    if item.current_slot == Some(slot) {
        return TransferResult::NoChange;
    }

    let container = cosmos.get_handle(slot.container);
    let Some(definition) = container
        .find_invariant::<Container>()
        .and_then(|c| c.slot(slot.function))
    else {
        return TransferResult::InvalidSlot;
    };

    if slot.container == request.item || cosmos.is_descendant_of(slot.container, request.item) {
        return TransferResult::WouldCreateCycle;
    }

    if handle.find_invariant::<Container>().is_some() && !definition.allows_containers {
        return TransferResult::ContainerNotAllowed;
    }

    if stack_target(cosmos, request.item, slot).is_none()
        && cosmos.children_of_slot(slot).len() >= definition.capacity as usize
    {
        return TransferResult::SlotFull;
    }

    TransferResult::Successful { charges }
}

/// Validate and apply one request.
pub fn perform_transfer(step: &mut LogicStep<'_>, request: &TransferRequest) -> TransferResult {
    let result = query_transfer_result(step.cosmos, request);
    let TransferResult::Successful { charges } = result else {
        tracing::debug!(item = %request.item, ?result, "transfer rejected");
        return result;
    };

    let cosmos = &mut *step.cosmos;
    let item = *cosmos.get::<Item>(request.item);
    let whole = charges == item.charges;

    if let Some(slot) = request.target {
        if let Some(stack) = stack_target(cosmos, request.item, slot) {
            cosmos.modify::<Item, _>(stack, |s| s.charges += charges);
            if whole {
                // Emptied now so a later request this tick cannot merge it again.
                cosmos.modify::<Item, _>(request.item, |i| i.charges = 0);
                step.queues.post(QueueDestruction::new(request.item));
            } else {
                cosmos.modify::<Item, _>(request.item, |i| i.charges -= charges);
            }
            tracing::trace!(item = %request.item, %stack, charges, "merged stack");
            return result;
        }
    }

    let previous_root = item.current_slot.map(|_| cosmos.root_container_of(request.item));
    let previous_transform = previous_root
        .and_then(|root| cosmos.find::<Transform>(root).copied())
        .or_else(|| cosmos.find::<Transform>(request.item).copied())
        .unwrap_or_default();

    let moved = if whole {
        request.item
    } else {
        let Some(split) = cosmos.clone_entity(request.item) else {
            return TransferResult::InvalidItem;
        };
        cosmos.modify::<Item, _>(request.item, |i| i.charges -= charges);
        cosmos.modify::<Item, _>(split, |i| i.charges = charges);
        split
    };

    cosmos.modify::<Item, _>(moved, |i| i.current_slot = request.target);

    match request.target {
        Some(_) => {
            let pos = previous_transform.pos;
            step.queues.post(SoundEffect {
                kind: SoundKind::Pickup,
                pos,
                subject: Some(moved),
            });
        }
        None => drop_item(cosmos, moved, previous_transform),
    }

    tracing::trace!(item = %moved, target = ?request.target, charges, "transferred");
    result
}

fn drop_item(cosmos: &mut Cosmos, item: EntityId, from: Transform) {
    let mut rng = cosmos.rng_for(item);
    let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let scatter = repro::unit_vector(angle) * DROP_SCATTER;

    if let Some(transform) = cosmos.find_mut::<Transform>(item) {
        *transform = Transform::new(from.pos + scatter, from.rotation);
    }
    if let Some(body) = cosmos.find_mut::<RigidBody>(item) {
        body.velocity = from.direction() * DROP_SPEED;
    }
    if let Some(gun) = cosmos.find_mut::<Gun>(item) {
        gun.trigger_pressed = false;
    }
    cosmos.modify::<Item, _>(item, |i| i.pickup_timeout_ms = DROP_PICKUP_TIMEOUT_MS);
}

/// Apply requests in order. Later requests see the effects of earlier ones.
pub fn perform_transfers(requests: &[TransferRequest], step: &mut LogicStep<'_>) -> usize {
    requests
        .iter()
        .filter(|r| perform_transfer(step, r).is_successful())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, spawn};
    use cosmos_common::SlotFunction;
    use cosmos_ecs::ProcessingSubject;
    use cosmos_input::CosmicEntropy;
    use cosmos_kernel::MessageQueues;
    use glam::Vec2;

    fn run(cosmos: &mut Cosmos, requests: &[TransferRequest]) -> (usize, MessageQueues) {
        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        let mut step = LogicStep::new(cosmos, &entropy, &mut queues);
        let n = perform_transfers(requests, &mut step);
        (n, queues)
    }

    #[test]
    fn pickup_moves_item_into_slot() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::new(5.0, 0.0));
        let hand = SlotId::new(soldier, SlotFunction::PrimaryHand);

        let (n, queues) = run(&mut cosmos, &[TransferRequest::to_slot(rifle, hand)]);
        assert_eq!(n, 1);
        assert_eq!(cosmos.current_slot(rifle), Some(hand));
        assert!(!cosmos.processing_list(ProcessingSubject::Physics).contains(&rifle));
        assert_eq!(queues.get_queue::<SoundEffect>()[0].kind, SoundKind::Pickup);
        cosmos.assert_caches_consistent();
    }

    #[test]
    fn full_slot_and_missing_slot_are_rejected() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let a = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        let b = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        let hand = SlotId::new(soldier, SlotFunction::PrimaryHand);
        run(&mut cosmos, &[TransferRequest::to_slot(a, hand)]);

        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::to_slot(b, hand)),
            TransferResult::SlotFull
        );
        let inside = SlotId::new(soldier, SlotFunction::Inside);
        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::to_slot(b, inside)),
            TransferResult::InvalidSlot
        );
        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::to_slot(a, hand)),
            TransferResult::NoChange
        );
    }

    #[test]
    fn cycles_and_nested_containers_are_rejected() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let pack = spawn(&mut cosmos, f.backpack, Vec2::ZERO);
        let other = spawn(&mut cosmos, f.backpack, Vec2::ZERO);
        run(
            &mut cosmos,
            &[TransferRequest::to_slot(
                pack,
                SlotId::new(soldier, SlotFunction::Back),
            )],
        );

        let inside = SlotId::new(pack, SlotFunction::Inside);
        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::to_slot(pack, inside)),
            TransferResult::WouldCreateCycle
        );
        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::to_slot(other, inside)),
            TransferResult::ContainerNotAllowed
        );
    }

    #[test]
    fn stackables_merge_and_queue_the_mover() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let held = cosmos.create_entity(f.ammo, |c| c.item.as_mut().unwrap().charges = 10);
        let loose = cosmos.create_entity(f.ammo, |c| c.item.as_mut().unwrap().charges = 5);
        let hand = SlotId::new(soldier, SlotFunction::SecondaryHand);

        let (_, queues) = run(
            &mut cosmos,
            &[
                TransferRequest::to_slot(held, hand),
                TransferRequest::to_slot(loose, hand),
            ],
        );
        assert_eq!(cosmos.get::<Item>(held).charges, 15);
        assert_eq!(
            queues.get_queue::<QueueDestruction>(),
            &[QueueDestruction::new(loose)]
        );
    }

    #[test]
    fn merged_stack_cannot_merge_twice_in_one_tick() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let hand = SlotId::new(soldier, SlotFunction::SecondaryHand);
        let back = SlotId::new(soldier, SlotFunction::Back);
        let in_hand = cosmos.create_entity(f.ammo, |c| c.item.as_mut().unwrap().charges = 10);
        let on_back = cosmos.create_entity(f.ammo, |c| c.item.as_mut().unwrap().charges = 10);
        let loose = cosmos.create_entity(f.ammo, |c| c.item.as_mut().unwrap().charges = 5);
        run(
            &mut cosmos,
            &[
                TransferRequest::to_slot(in_hand, hand),
                TransferRequest::to_slot(on_back, back),
            ],
        );

        let (n, queues) = run(
            &mut cosmos,
            &[
                TransferRequest::to_slot(loose, hand),
                TransferRequest::to_slot(loose, back),
            ],
        );
        assert_eq!(n, 1);
        let total = cosmos.get::<Item>(in_hand).charges + cosmos.get::<Item>(on_back).charges;
        assert_eq!(total, 25);
        assert_eq!(cosmos.get::<Item>(loose).charges, 0);
        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::to_slot(loose, back)),
            TransferResult::InvalidQuantity
        );
        assert_eq!(
            queues.get_queue::<QueueDestruction>(),
            &[QueueDestruction::new(loose)]
        );
    }

    #[test]
    fn partial_quantity_splits_the_stack() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let stack = cosmos.create_entity(f.ammo, |c| c.item.as_mut().unwrap().charges = 30);
        let back = SlotId::new(soldier, SlotFunction::Back);

        let request = TransferRequest {
            item: stack,
            target: Some(back),
            quantity: Some(12),
        };
        run(&mut cosmos, &[request]);

        let moved = cosmos.children_of_slot(back);
        assert_eq!(moved.len(), 1);
        assert_ne!(moved[0], stack);
        assert_eq!(cosmos.get::<Item>(moved[0]).charges, 12);
        assert_eq!(cosmos.get::<Item>(stack).charges, 18);
        assert_eq!(cosmos.current_slot(stack), None);
        cosmos.assert_caches_consistent();
    }

    #[test]
    fn drop_places_item_near_its_former_owner() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::new(100.0, 100.0));
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        let hand = SlotId::new(soldier, SlotFunction::PrimaryHand);
        run(&mut cosmos, &[TransferRequest::to_slot(rifle, hand)]);
        cosmos.get_mut::<Gun>(rifle).trigger_pressed = true;

        run(&mut cosmos, &[TransferRequest::drop_item(rifle)]);
        assert_eq!(cosmos.current_slot(rifle), None);
        let pos = cosmos.get::<Transform>(rifle).pos;
        assert!((pos - Vec2::new(100.0, 100.0)).length() <= DROP_SCATTER + 1e-3);
        assert!(!cosmos.get::<Gun>(rifle).trigger_pressed);
        assert_eq!(cosmos.get::<Item>(rifle).pickup_timeout_ms, DROP_PICKUP_TIMEOUT_MS);

        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::drop_item(rifle)),
            TransferResult::NoChange
        );
    }

    #[test]
    fn dead_items_are_invalid() {
        let (mut cosmos, f) = testing::cosmos();
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        cosmos.delete_entity(rifle);
        assert_eq!(
            query_transfer_result(&cosmos, &TransferRequest::drop_item(rifle)),
            TransferResult::InvalidItem
        );
    }
}
