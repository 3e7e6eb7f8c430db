//! Two-phase destruction.
//!
//! Marking enumerates every queued entity and its descendants into the
//! will-be-deleted queue, leaving the queue-destruction queue untouched.
//! Deletion happens after observers have seen the step, children first.

use cosmos_common::EntityId;
use cosmos_kernel::messages::{QueueDestruction, WillBeDeleted};
use cosmos_kernel::{Cosmos, LogicStep, MessageQueues};
use std::collections::BTreeSet;

fn depth_of(cosmos: &Cosmos, id: EntityId) -> usize {
    let mut depth = 0;
    let mut current = id;
    while let Some(slot) = cosmos.parent_of(current) {
        depth += 1;
        current = slot.container;
    }
    depth
}

/// Returns the number of entities marked.
pub fn mark_queued_entities_and_their_descendants(step: &mut LogicStep<'_>) -> usize {
    let _span = tracing::debug_span!("mark_for_deletion").entered();
    let cosmos = &*step.cosmos;
    let mut seen = BTreeSet::new();
    let mut marked = Vec::new();

    for queued in step.queues.get_queue::<QueueDestruction>() {
        if !cosmos.is_alive(queued.subject) {
            tracing::debug!(subject = %queued.subject, "dead entity queued for destruction");
            continue;
        }
        if seen.insert(queued.subject) {
            marked.push(queued.subject);
        }
        cosmos.for_each_descendant(queued.subject, |descendant| {
            if seen.insert(descendant) {
                marked.push(descendant);
            }
        });
    }

    // A queued child may precede its queued ancestor. Ordering by depth keeps
    // every parent ahead of its children while preserving enumeration order
    // among peers.
    marked.sort_by_cached_key(|id| depth_of(cosmos, *id));

    let count = marked.len();
    let deletions = step.queues.get_queue_mut::<WillBeDeleted>();
    deletions.extend(marked.into_iter().map(|subject| WillBeDeleted { subject }));
    count
}

/// Delete marked entities in reverse order and consume the queue.
pub fn perform_deletions(cosmos: &mut Cosmos, queues: &mut MessageQueues) -> Vec<EntityId> {
    let _span = tracing::debug_span!("perform_deletions").entered();
    let deletions = queues.take_queue::<WillBeDeleted>();
    let mut destroyed = Vec::with_capacity(deletions.len());

    for doomed in deletions.iter().rev() {
        assert!(
            cosmos.is_alive(doomed.subject),
            "{} marked for deletion died before its turn",
            doomed.subject
        );
        cosmos.delete_entity(doomed.subject);
        destroyed.push(doomed.subject);
    }
    destroyed
}
