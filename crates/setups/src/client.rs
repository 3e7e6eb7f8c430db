use cosmos_common::EntityId;
use cosmos_input::CosmicEntropy;
use cosmos_kernel::Cosmos;
use cosmos_persist::CosmosSnapshot;
use cosmos_predict::{ConfirmedStep, PredictionCoordinator, PredictionSettings};
use cosmos_solver::{SolveReport, SolverSettings};
use cosmos_view::{AudiovisualState, FrameSettings};

use crate::SetupError;

/// A predicting client: shows the predicted cosmos, sends local entropy to
/// the server and reconciles with what the server confirms.
pub struct ClientSetup {
    coordinator: PredictionCoordinator,
    audiovisual: AudiovisualState,
    character: EntityId,
    outbox: Vec<CosmicEntropy>,
}

impl ClientSetup {
    /// Start from state received from the server.
    pub fn new(
        cosmos: Cosmos,
        character: EntityId,
        prediction: PredictionSettings,
        solver: SolverSettings,
        frame: FrameSettings,
    ) -> Self {
        let mut audiovisual = AudiovisualState::new(frame);
        audiovisual.resample(&cosmos);
        Self {
            coordinator: PredictionCoordinator::new(cosmos, prediction, solver),
            audiovisual,
            character,
            outbox: Vec::new(),
        }
    }

    /// Predict one step with local input. Input is only sent to the server
    /// for steps that were actually predicted.
    pub fn advance(&mut self, local: &CosmicEntropy) -> Option<SolveReport> {
        let mut own = local.clone();
        own.players.retain(|id, _| *id == self.character);
        let report = self
            .coordinator
            .predict_step(own.clone(), &mut self.audiovisual)?;
        self.outbox.push(own);
        Some(report)
    }

    /// Entropy to send to the server, oldest first.
    pub fn take_outbox(&mut self) -> Vec<CosmicEntropy> {
        std::mem::take(&mut self.outbox)
    }

    pub fn receive_confirmed(&mut self, steps: &[ConfirmedStep]) -> usize {
        self.coordinator.apply_confirmed_steps(steps)
    }

    pub fn receive_snapshot(&mut self, snapshot: &CosmosSnapshot) -> Result<(), SetupError> {
        self.coordinator.apply_confirmed_snapshot(snapshot)?;
        Ok(())
    }

    /// Hand a pending resample to the audiovisual state.
    pub fn reload_viewables(&mut self) -> bool {
        self.coordinator.propagate_resample(&mut self.audiovisual)
    }

    pub fn character(&self) -> EntityId {
        self.character
    }

    pub fn coordinator(&self) -> &PredictionCoordinator {
        &self.coordinator
    }

    pub fn predicted(&self) -> &Cosmos {
        self.coordinator.predicted()
    }

    pub fn audiovisual(&self) -> &AudiovisualState {
        &self.audiovisual
    }

    pub(crate) fn audiovisual_mut(&mut self) -> &mut AudiovisualState {
        &mut self.audiovisual
    }
}
