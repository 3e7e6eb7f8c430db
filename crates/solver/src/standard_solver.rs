use cosmos_common::EntityId;
use cosmos_input::{CosmicEntropy, TransferRequest};
use cosmos_kernel::messages::QueueDestruction;
use cosmos_kernel::{ConstLogicStep, Cosmos, LogicStep, MessageQueues};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::inventory::perform_transfers;
use crate::systems::{
    animation, behaviour, crosshair, destroy, driver, effects, force_joint, gun, input, item,
    melee, missile, movement, physics, position_copying, sentience, vehicle,
};

/// Knobs of the solver, carried by value into every solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Rebuild all caches after each step and assert they match.
    pub verify_caches_every_step: bool,
}

/// Wall-clock cost of the expensive phases of one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveProfile {
    pub entropy_length: usize,
    pub phases: Vec<(&'static str, Duration)>,
    pub total: Duration,
}

impl SolveProfile {
    fn measure<R>(&mut self, phase: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.phases.push((phase, start.elapsed()));
        result
    }

    pub fn phase(&self, name: &str) -> Option<Duration> {
        self.phases.iter().find(|(n, _)| *n == name).map(|(_, d)| *d)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveReport {
    /// Step counter after the solve.
    pub step: u64,
    /// Entities deleted this step, in deletion order.
    pub destroyed: Vec<EntityId>,
    /// Messages still queued when the pipeline finished.
    pub messages_pending: usize,
    pub profile: SolveProfile,
}

/// Hooks around a solve. Observers drain queues in `post_solve`, while
/// doomed entities are still alive.
pub trait SolverCallbacks {
    fn pre_solve(&mut self, _step: &mut LogicStep<'_>) {}
    fn post_solve(&mut self, _step: ConstLogicStep<'_>) {}
    fn post_cleanup(&mut self, _step: ConstLogicStep<'_>) {}
}

/// Callbacks that do nothing.
pub struct NoCallbacks;

impl SolverCallbacks for NoCallbacks {}

/// The fixed system order of one tick. Reordering changes game semantics.
pub fn standard_solve(step: &mut LogicStep<'_>, profile: &mut SolveProfile) {
    let entropy = step.entropy;
    profile.entropy_length = entropy.length();

    perform_transfers(&entropy.transfer_requests, step);

    input::make_input_messages(step);
    input::contextualize_movement_intents(step);

    movement::set_movement_flags_from_input(step);
    movement::apply_movement_forces(step.cosmos);
    vehicle::set_steering_flags_from_intents(step);
    vehicle::apply_movement_forces(step);

    gun::consume_gun_intents(step);
    gun::launch_shots_due_to_pressed_triggers(step);
    melee::consume_melee_intents(step);
    melee::initiate_and_update_moves(step);
    force_joint::apply_forces_towards_target_entities(step.cosmos);
    item::handle_throw_item_intents(step);

    profile.measure("physics", || physics::step_and_set_new_transforms(step));

    position_copying::update_transforms(step.cosmos);
    position_copying::items_follow_containers(step.cosmos);
    position_copying::drivers_follow_vehicles(step.cosmos);
    crosshair::apply_crosshair_motions_to_base_offsets(step);
    crosshair::apply_base_offsets_to_rotations(step);

    item::tick_pickup_timeouts(step.cosmos);
    item::pick_up_touching_items(step);

    missile::detonate_colliding_missiles(step);
    missile::detonate_expired_missiles(step);

    sentience::apply_damage_and_generate_health_events(step);

    driver::release_drivers_of_dead_vehicles(step.cosmos);
    driver::respond_to_use_button(step);

    effects::game_responses_to_particle_effects(step);
    effects::create_sounds_from_game_events(step);

    profile.measure("ai", || behaviour::evaluate_ai(step));

    let transfers = step.take_queue::<TransferRequest>();
    perform_transfers(&transfers, step);

    let queued_before_marking = step.queues.len_of::<QueueDestruction>();
    profile.measure("destruction", || {
        destroy::mark_queued_entities_and_their_descendants(step)
    });

    animation::generate_movement_animations(step);
    animation::handle_animation_messages(step);
    animation::progress_animation_states(step.cosmos);

    step.cosmos.increment_step();

    assert_no_destruction_after_marking(step, queued_before_marking);
}

/// Fatal if anything queued a destruction once marking had run.
pub(crate) fn assert_no_destruction_after_marking(step: &LogicStep<'_>, queued_before: usize) {
    let queued_at_end = step.queues.len_of::<QueueDestruction>();
    assert_eq!(
        queued_at_end,
        queued_before,
        "destruction queued after marking at step {}",
        step.cosmos.step()
    );
}

/// Run one full tick: pipeline, observers, deletions, cleanup.
pub fn solve(
    cosmos: &mut Cosmos,
    entropy: &CosmicEntropy,
    settings: SolverSettings,
    callbacks: &mut impl SolverCallbacks,
) -> SolveReport {
    let _span = tracing::info_span!("standard_solve", step = cosmos.step()).entered();
    let started = Instant::now();
    let mut queues = MessageQueues::new();
    let mut profile = SolveProfile::default();

    {
        let mut step = LogicStep::new(cosmos, entropy, &mut queues);
        callbacks.pre_solve(&mut step);
        standard_solve(&mut step, &mut profile);
        callbacks.post_solve(step.as_const());
    }

    let messages_pending = queues.total_len();
    let destroyed = destroy::perform_deletions(cosmos, &mut queues);
    callbacks.post_cleanup(ConstLogicStep {
        cosmos,
        entropy,
        queues: &queues,
    });
    queues.clear_all();

    if settings.verify_caches_every_step {
        cosmos.assert_caches_consistent();
    }
    profile.total = started.elapsed();

    if !destroyed.is_empty() {
        tracing::debug!(count = destroyed.len(), "entities destroyed");
    }
    SolveReport {
        step: cosmos.step(),
        destroyed,
        messages_pending,
        profile,
    }
}
