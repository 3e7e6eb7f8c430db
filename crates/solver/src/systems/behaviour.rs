//! Visibility queries and the AI that acts on them. Pathfinding is folded
//! into direct steering towards the chosen target.

use cosmos_common::{EntityId, EntityType, Transform};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Ai, Crosshair, Gun, Melee, Movement, Sentience};
use cosmos_ecs::invariants;
use cosmos_kernel::{Cosmos, LogicStep};
use glam::Vec2;

use super::{radius_of, wielded_item};

/// Distance gun-wielding AI keeps from its target.
pub const SHOOTING_DISTANCE: f32 = 200.0;

/// Live entities within `range` of `origin`, nearest first, ties by id.
///
/// Read-only; safe to run on a frozen cosmos from worker threads.
pub fn visible_entities(cosmos: &Cosmos, origin: Vec2, range: f32) -> Vec<EntityId> {
    let mut seen: Vec<(f32, EntityId)> = cosmos
        .ids()
        .into_iter()
        .filter_map(|id| {
            let d = cosmos.find::<Transform>(id)?.pos.distance(origin);
            (d <= range).then_some((d, id))
        })
        .collect();
    seen.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    seen.into_iter().map(|(_, id)| id).collect()
}

fn is_hostile_to_ai(cosmos: &Cosmos, id: EntityId) -> bool {
    let handle = cosmos.get_handle(id);
    id.entity_type == EntityType::Character
        && handle.find_invariant::<invariants::Ai>().is_none()
        && handle
            .find::<Sentience>()
            .is_some_and(|s| !s.health.is_depleted())
}

/// Closest visible living non-AI character.
pub fn choose_target(cosmos: &Cosmos, id: EntityId) -> Option<EntityId> {
    let sight = cosmos
        .get_handle(id)
        .find_invariant::<invariants::Ai>()?
        .sight_range;
    let origin = cosmos.find::<Transform>(id)?.pos;
    visible_entities(cosmos, origin, sight)
        .into_iter()
        .find(|other| *other != id && is_hostile_to_ai(cosmos, *other))
}

fn engage(cosmos: &mut Cosmos, id: EntityId, target: Option<EntityId>) {
    cosmos.get_mut::<Ai>(id).target = target;
    let gun = wielded_item(cosmos, id, true).filter(|item| cosmos.find::<Gun>(*item).is_some());

    let Some(target_pos) = target.and_then(|t| cosmos.find::<Transform>(t)).map(|t| t.pos) else {
        cosmos.get_mut::<Movement>(id).steering = Vec2::ZERO;
        if let Some(gun) = gun {
            cosmos.get_mut::<Gun>(gun).trigger_pressed = false;
        }
        return;
    };

    let pos = cosmos.get::<Transform>(id).pos;
    let to_target = target_pos - pos;
    let distance = to_target.length();
    let melee_reach = cosmos
        .get_handle(id)
        .find_invariant::<invariants::Melee>()
        .map(|m| m.range + radius_of(cosmos, id));
    let gap = target
        .map(|t| distance - radius_of(cosmos, t))
        .unwrap_or(distance);

    let keep_distance = match (gun, melee_reach) {
        (Some(_), _) => SHOOTING_DISTANCE,
        (None, Some(reach)) => reach * 0.8,
        (None, None) => 0.0,
    };
    cosmos.get_mut::<Movement>(id).steering = if gap > keep_distance {
        to_target.normalize_or_zero()
    } else {
        Vec2::ZERO
    };
    cosmos.get_mut::<Crosshair>(id).base_offset = to_target;

    if let Some(gun) = gun {
        cosmos.get_mut::<Gun>(gun).trigger_pressed = true;
    }
    if melee_reach.is_some_and(|reach| gap <= reach) {
        cosmos.get_mut::<Melee>(id).swing_requested = true;
    }
}

pub fn evaluate_ai(step: &mut LogicStep<'_>) {
    let _span = tracing::debug_span!("ai").entered();
    let cosmos = &mut *step.cosmos;
    for id in cosmos.processing_list(ProcessingSubject::Ai) {
        let target = choose_target(cosmos, id);
        if target != cosmos.get::<Ai>(id).target {
            tracing::trace!(%id, ?target, "ai retargeted");
        }
        engage(cosmos, id, target);
    }
}
