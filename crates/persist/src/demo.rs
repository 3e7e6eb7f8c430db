use cosmos_input::CosmicEntropy;
use cosmos_kernel::Cosmos;
use cosmos_solver::{NoCallbacks, SolverCallbacks, SolverSettings, solve};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::SnapshotError;
use crate::codec::{pack, unpack};
use crate::snapshot::CosmosSnapshot;

/// Entropy applied by the solve that started at `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEntropy {
    pub step: u64,
    pub entropy: CosmicEntropy,
}

/// Append-only record of the entropy fed to a cosmos, one entry per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntropyLog {
    entries: Vec<LoggedEntropy>,
}

impl EntropyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the entropy for `step`. Steps must follow each other without gaps.
    pub fn record(&mut self, step: u64, entropy: CosmicEntropy) {
        if let Some(last) = self.entries.last() {
            assert_eq!(
                step,
                last.step + 1,
                "entropy log must be contiguous: {} follows {}",
                step,
                last.step
            );
        }
        self.entries.push(LoggedEntropy { step, entropy });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LoggedEntropy] {
        &self.entries
    }

    pub fn first_step(&self) -> Option<u64> {
        self.entries.first().map(|e| e.step)
    }

    /// One past the last recorded step.
    pub fn end_step(&self) -> Option<u64> {
        self.entries.last().map(|e| e.step + 1)
    }

    /// Entries for steps at or after `step`.
    pub fn since(&self, step: u64) -> &[LoggedEntropy] {
        let start = self.entries.partition_point(|e| e.step < step);
        &self.entries[start..]
    }

    /// Drop entries for steps before `step`.
    pub fn forget_before(&mut self, step: u64) {
        let keep_from = self.entries.partition_point(|e| e.step < step);
        self.entries.drain(..keep_from);
    }

    /// Append another log that continues this one.
    pub fn extend(&mut self, other: EntropyLog) {
        for entry in other.entries {
            self.record(entry.step, entry.entropy);
        }
    }

    /// Advance `cosmos` through every recorded step from its current one.
    ///
    /// Returns the number of steps solved.
    pub fn replay_onto(
        &self,
        cosmos: &mut Cosmos,
        settings: SolverSettings,
        callbacks: &mut impl SolverCallbacks,
    ) -> Result<usize, SnapshotError> {
        let pending = self.since(cosmos.step());
        if let Some(first) = pending.first() {
            if first.step != cosmos.step() {
                return Err(SnapshotError::MissingEntropy {
                    step: cosmos.step(),
                });
            }
        }
        let _span = tracing::debug_span!("replay", from = cosmos.step(), steps = pending.len())
            .entered();
        for entry in pending {
            solve(cosmos, &entry.entropy, settings, callbacks);
        }
        Ok(pending.len())
    }

    /// Restore `snapshot` and replay everything recorded after it.
    pub fn replay_from(
        &self,
        snapshot: &CosmosSnapshot,
        settings: SolverSettings,
    ) -> Result<Cosmos, SnapshotError> {
        let mut cosmos = snapshot.restore()?;
        self.replay_onto(&mut cosmos, settings, &mut NoCallbacks)?;
        Ok(cosmos)
    }
}

/// A recorded run: starting snapshot plus every entropy after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demo {
    pub start: CosmosSnapshot,
    pub log: EntropyLog,
}

impl Demo {
    /// Start recording from the current state of `cosmos`.
    pub fn begin(cosmos: &Cosmos) -> Result<Self, SnapshotError> {
        Ok(Self {
            start: CosmosSnapshot::capture(cosmos)?,
            log: EntropyLog::new(),
        })
    }

    pub fn record(&mut self, step: u64, entropy: CosmicEntropy) {
        self.log.record(step, entropy);
    }

    /// Play the demo to its end.
    pub fn play(&self, settings: SolverSettings) -> Result<Cosmos, SnapshotError> {
        self.log.replay_from(&self.start, settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        std::fs::write(path, pack(self)?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let demo: Self = unpack(&std::fs::read(path)?)?;
        demo.start.verify()?;
        Ok(demo)
    }
}
