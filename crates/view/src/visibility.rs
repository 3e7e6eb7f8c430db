use cosmos_common::{EntityId, Transform};
use cosmos_ecs::ProcessingSubject;
use cosmos_kernel::Cosmos;
use cosmos_solver::systems::behaviour::visible_entities;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::ViewError;

/// Threads for order-independent, read-only jobs over a frozen cosmos.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// `threads == 0` lets rayon pick one per core.
    pub fn new(threads: usize) -> Result<Self, ViewError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("cosmos-worker-{i}"))
            .build()?;
        tracing::debug!(threads = pool.current_num_threads(), "worker pool started");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn install<R: Send>(&self, job: impl FnOnce() -> R + Send) -> R {
        self.pool.install(job)
    }
}

/// What each observer can see within `range`.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityJob {
    pub observers: Vec<EntityId>,
    pub range: f32,
}

impl VisibilityJob {
    /// Every sentient entity observes.
    pub fn for_sentient(cosmos: &Cosmos, range: f32) -> Self {
        Self {
            observers: cosmos.processing_list(ProcessingSubject::Sentience),
            range,
        }
    }

    fn visible_from(&self, cosmos: &Cosmos, observer: EntityId) -> Option<(EntityId, Vec<EntityId>)> {
        let origin = cosmos.find::<Transform>(observer)?.pos;
        let mut seen = visible_entities(cosmos, origin, self.range);
        seen.retain(|id| *id != observer);
        Some((observer, seen))
    }

    pub fn run(&self, cosmos: &Cosmos, pool: &WorkerPool) -> BTreeMap<EntityId, Vec<EntityId>> {
        let _span = tracing::debug_span!("visibility", observers = self.observers.len()).entered();
        pool.install(|| {
            self.observers
                .par_iter()
                .filter_map(|&observer| self.visible_from(cosmos, observer))
                .collect()
        })
    }

    /// Same result on the calling thread.
    pub fn run_serial(&self, cosmos: &Cosmos) -> BTreeMap<EntityId, Vec<EntityId>> {
        self.observers
            .iter()
            .filter_map(|&observer| self.visible_from(cosmos, observer))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_kernel::CosmosSettings;
    use cosmos_solver::test_scenes::test_scene_cosmos;

    #[test]
    fn parallel_matches_serial() {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let pool = WorkerPool::new(4).unwrap();
        assert_eq!(pool.threads(), 4);

        let job = VisibilityJob::for_sentient(&cosmos, 350.0);
        assert_eq!(job.observers.len(), 3);
        let parallel = job.run(&cosmos, &pool);
        assert_eq!(parallel, job.run_serial(&cosmos));

        let player_sees = &parallel[&scene.player];
        assert!(!player_sees.contains(&scene.player));
        assert!(player_sees.contains(&scene.grunts[0]));
    }

    #[test]
    fn short_range_sees_only_neighbours() {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let job = VisibilityJob {
            observers: vec![scene.player],
            range: 1.0,
        };
        let seen = &job.run_serial(&cosmos)[&scene.player];
        // Everything the player carries shares its position.
        assert!(seen.contains(&scene.rifle));
        assert!(seen.contains(&scene.backpack));
        assert!(!seen.contains(&scene.car));
    }
}
