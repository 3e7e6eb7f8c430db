use cosmos_input::CosmicEntropy;
use cosmos_kernel::Cosmos;
use cosmos_persist::{CosmosSnapshot, EntropyLog, SnapshotError};
use cosmos_solver::{NoCallbacks, SolveReport, SolverCallbacks, SolverSettings, solve};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionSettings {
    /// How far the predicted cosmos may run ahead of the referential one.
    pub max_predicted_steps: u32,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            max_predicted_steps: 64,
        }
    }
}

/// Entropy the server applied to the solve starting at `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedStep {
    pub step: u64,
    pub entropy: CosmicEntropy,
}

/// Anything that caches per-entity state sampled from the predicted cosmos.
pub trait ResampleSink {
    /// Drop all per-entity state and re-derive it from `cosmos`.
    fn resample(&mut self, cosmos: &Cosmos);
}

/// Owns the referential and predicted cosmoi of a client.
pub struct PredictionCoordinator {
    referential: Cosmos,
    predicted: Cosmos,
    local: EntropyLog,
    settings: PredictionSettings,
    solver: SolverSettings,
}

impl PredictionCoordinator {
    pub fn new(cosmos: Cosmos, settings: PredictionSettings, solver: SolverSettings) -> Self {
        Self {
            predicted: cosmos.clone(),
            referential: cosmos,
            local: EntropyLog::new(),
            settings,
            solver,
        }
    }

    pub fn referential(&self) -> &Cosmos {
        &self.referential
    }

    pub fn predicted(&self) -> &Cosmos {
        &self.predicted
    }

    pub fn settings(&self) -> PredictionSettings {
        self.settings
    }

    /// Local entropy not yet covered by confirmed state.
    pub fn buffered_entropy(&self) -> &EntropyLog {
        &self.local
    }

    pub fn predicted_ahead(&self) -> u64 {
        self.predicted.step().saturating_sub(self.referential.step())
    }

    pub fn is_synced(&self) -> bool {
        self.predicted_ahead() == 0 && !self.predicted.resample_requested()
    }

    /// Advance the predicted cosmos with local input.
    ///
    /// Returns `None` without simulating once the prediction window is full.
    pub fn predict_step(
        &mut self,
        local: CosmicEntropy,
        callbacks: &mut impl SolverCallbacks,
    ) -> Option<SolveReport> {
        if self.predicted_ahead() >= u64::from(self.settings.max_predicted_steps) {
            tracing::debug!(
                ahead = self.predicted_ahead(),
                "prediction window full, holding local input"
            );
            return None;
        }
        let step = self.predicted.step();
        let report = solve(&mut self.predicted, &local, self.solver, callbacks);
        self.local.record(step, local);
        Some(report)
    }

    /// Advance the referential cosmos by server-confirmed steps, then
    /// re-predict. Stale steps are skipped; a gap stops the advance.
    pub fn apply_confirmed_steps(&mut self, steps: &[ConfirmedStep]) -> usize {
        let mut applied = 0;
        for confirmed in steps {
            let expected = self.referential.step();
            if confirmed.step < expected {
                tracing::trace!(step = confirmed.step, expected, "stale confirmed step");
                continue;
            }
            if confirmed.step > expected {
                tracing::warn!(
                    step = confirmed.step,
                    expected,
                    "gap in confirmed steps, waiting for a snapshot"
                );
                break;
            }
            solve(
                &mut self.referential,
                &confirmed.entropy,
                self.solver,
                &mut NoCallbacks,
            );
            applied += 1;
        }
        if applied > 0 {
            self.repredict();
        }
        applied
    }

    /// Replace the referential cosmos with confirmed state and re-predict.
    /// Snapshots older than the referential cosmos are ignored.
    pub fn apply_confirmed_snapshot(
        &mut self,
        snapshot: &CosmosSnapshot,
    ) -> Result<(), SnapshotError> {
        let expected = self.referential.step();
        if snapshot.step() < expected {
            tracing::trace!(step = snapshot.step(), expected, "stale confirmed snapshot");
            return Ok(());
        }
        snapshot.restore_into(&mut self.referential)?;
        self.repredict();
        Ok(())
    }

    pub fn request_resample(&mut self) {
        self.predicted.request_resample();
    }

    pub fn resample_requested(&self) -> bool {
        self.predicted.resample_requested()
    }

    /// Hand a pending resample to `sink`. Returns whether one was pending.
    pub fn propagate_resample(&mut self, sink: &mut impl ResampleSink) -> bool {
        if !self.predicted.take_resample_request() {
            return false;
        }
        let _span = tracing::info_span!("resample", step = self.predicted.step()).entered();
        sink.resample(&self.predicted);
        true
    }

    fn repredict(&mut self) {
        let _span =
            tracing::debug_span!("repredict", referential = self.referential.step()).entered();
        let forced = self.referential.take_resample_request();
        let pending = self.predicted.resample_requested();
        self.local.forget_before(self.referential.step());

        let mut rebuilt = self.referential.clone();
        if let Err(error) = self
            .local
            .replay_onto(&mut rebuilt, self.solver, &mut NoCallbacks)
        {
            tracing::warn!(%error, "buffered input does not continue confirmed state, dropping it");
            self.local = EntropyLog::new();
            rebuilt = self.referential.clone();
        }

        let diverged = rebuilt.step() != self.predicted.step()
            || rebuilt.significant() != self.predicted.significant();
        if diverged {
            tracing::warn!(
                predicted = self.predicted.step(),
                rebuilt = rebuilt.step(),
                "prediction diverged from confirmed state"
            );
        }
        self.predicted = rebuilt;
        if forced || diverged || pending {
            self.predicted.request_resample();
        }
    }
}
