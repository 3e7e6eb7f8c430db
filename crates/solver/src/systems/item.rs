//! Pickup of touched items and throwing of held ones.

use cosmos_common::{EntityId, EntityType, SlotId};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::Item;
use cosmos_ecs::invariants::Container;
use cosmos_input::{IntentKind, TransferRequest};
use cosmos_kernel::messages::{CollisionMessage, IntentMessage};
use cosmos_kernel::{Cosmos, LogicStep};
use std::collections::BTreeSet;

use super::wielded_item;
use crate::inventory::query_transfer_result;

pub fn handle_throw_item_intents(step: &mut LogicStep<'_>) {
    let mut requests = Vec::new();
    for message in step.get_queue::<IntentMessage>() {
        if message.intent.kind != IntentKind::ThrowItem || !message.intent.pressed {
            continue;
        }
        if let Some(item) = wielded_item(step.cosmos, message.subject, true) {
            requests.push(TransferRequest::drop_item(item));
        }
    }
    for request in requests {
        step.post(request);
    }
}

/// Dropped items count down before they can be picked up again.
pub fn tick_pickup_timeouts(cosmos: &mut Cosmos) {
    let delta_ms = cosmos.delta().ms;
    for id in cosmos.processing_list(ProcessingSubject::Items) {
        if cosmos.get::<Item>(id).pickup_timeout_ms > 0 {
            cosmos.modify::<Item, _>(id, |i| {
                i.pickup_timeout_ms = i.pickup_timeout_ms.saturating_sub(delta_ms);
            });
        }
    }
}

/// First slot of `picker`, in definition order, that would accept `item`.
pub fn determine_pickup_target_slot(cosmos: &Cosmos, item: EntityId, picker: EntityId) -> Option<SlotId> {
    let container = cosmos.get_handle(picker).find_invariant::<Container>()?;
    container
        .slots
        .iter()
        .map(|def| SlotId::new(picker, def.function))
        .find(|slot| query_transfer_result(cosmos, &TransferRequest::to_slot(item, *slot)).is_successful())
}

/// Characters pick up loose items they touch. Each item goes to the first
/// character that touched it this step.
pub fn pick_up_touching_items(step: &mut LogicStep<'_>) {
    let mut claimed = BTreeSet::new();
    let mut requests = Vec::new();

    for contact in step.get_queue::<CollisionMessage>() {
        if contact.subject.entity_type != EntityType::Character
            || contact.collider.entity_type != EntityType::Item
            || claimed.contains(&contact.collider)
        {
            continue;
        }
        let Some(item) = step.cosmos.find::<Item>(contact.collider) else {
            continue;
        };
        if item.current_slot.is_some() || item.pickup_timeout_ms > 0 {
            continue;
        }
        if let Some(slot) = determine_pickup_target_slot(step.cosmos, contact.collider, contact.subject) {
            claimed.insert(contact.collider);
            requests.push(TransferRequest::to_slot(contact.collider, slot));
        }
    }
    for request in requests {
        step.post(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, spawn};
    use cosmos_common::SlotFunction;
    use cosmos_input::{CosmicEntropy, Intent};
    use cosmos_kernel::MessageQueues;
    use glam::Vec2;

    fn touch(queues: &mut MessageQueues, subject: EntityId, collider: EntityId) {
        queues.post(CollisionMessage {
            subject,
            collider,
            point: Vec2::ZERO,
            normal: Vec2::X,
            impact_velocity: Vec2::ZERO,
        });
    }

    #[test]
    fn touching_requests_first_free_slot() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let other = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::ZERO);

        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        touch(&mut queues, soldier, rifle);
        touch(&mut queues, other, rifle);
        touch(&mut queues, rifle, soldier);
        pick_up_touching_items(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));

        assert_eq!(
            queues.get_queue::<TransferRequest>(),
            &[TransferRequest::to_slot(
                rifle,
                SlotId::new(soldier, SlotFunction::PrimaryHand)
            )]
        );
    }

    #[test]
    fn recently_dropped_items_are_ignored_until_timeout() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        cosmos.modify::<Item, _>(rifle, |i| i.pickup_timeout_ms = 20);

        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        touch(&mut queues, soldier, rifle);
        pick_up_touching_items(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        assert!(queues.get_queue::<TransferRequest>().is_empty());

        tick_pickup_timeouts(&mut cosmos);
        tick_pickup_timeouts(&mut cosmos);
        assert_eq!(cosmos.get::<Item>(rifle).pickup_timeout_ms, 0);
        pick_up_touching_items(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        assert_eq!(queues.get_queue::<TransferRequest>().len(), 1);
    }

    #[test]
    fn throw_intent_drops_wielded_item() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::ZERO);
        let rifle = spawn(&mut cosmos, f.rifle, Vec2::ZERO);
        cosmos.modify::<Item, _>(rifle, |i| {
            i.current_slot = Some(SlotId::new(soldier, SlotFunction::SecondaryHand))
        });

        let entropy = CosmicEntropy::new();
        let mut queues = MessageQueues::new();
        queues.post(IntentMessage {
            subject: soldier,
            intent: Intent::pressed(IntentKind::ThrowItem),
        });
        handle_throw_item_intents(&mut LogicStep::new(&mut cosmos, &entropy, &mut queues));
        assert_eq!(
            queues.get_queue::<TransferRequest>(),
            &[TransferRequest::drop_item(rifle)]
        );
    }
}
