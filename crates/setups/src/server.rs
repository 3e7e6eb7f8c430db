use cosmos_common::EntityId;
use cosmos_input::CosmicEntropy;
use cosmos_kernel::Cosmos;
use cosmos_persist::CosmosSnapshot;
use cosmos_predict::ConfirmedStep;
use cosmos_solver::{SolveReport, SolverSettings, solve};
use cosmos_view::{AudiovisualState, FrameSettings};

use crate::SetupError;

/// The authoritative cosmos. Collects entropy from clients and turns every
/// solve into a confirmed step for them.
pub struct ServerSetup {
    cosmos: Cosmos,
    solver: SolverSettings,
    pending: CosmicEntropy,
    confirmed: Vec<ConfirmedStep>,
    audiovisual: AudiovisualState,
}

impl ServerSetup {
    pub fn new(cosmos: Cosmos, solver: SolverSettings, frame: FrameSettings) -> Self {
        let mut audiovisual = AudiovisualState::new(frame);
        audiovisual.resample(&cosmos);
        Self {
            cosmos,
            solver,
            pending: CosmicEntropy::new(),
            confirmed: Vec::new(),
            audiovisual,
        }
    }

    /// Queue entropy sent by the client controlling `character`.
    ///
    /// A client may only steer its own character, and may only move loose
    /// items or items it carries, to the ground or into its own slots.
    pub fn accept_client_entropy(&mut self, character: EntityId, mut entropy: CosmicEntropy) {
        let before = entropy.length();
        entropy.players.retain(|id, _| *id == character);
        let cosmos = &self.cosmos;
        let owned = |id: EntityId| cosmos.is_alive(id) && cosmos.root_container_of(id) == character;
        entropy.transfer_requests.retain(|r| {
            let item_ok = cosmos.is_alive(r.item)
                && (cosmos.current_slot(r.item).is_none() || owned(r.item));
            let target_ok = r.target.is_none_or(|slot| owned(slot.container));
            item_ok && target_ok
        });
        let dropped = before - entropy.length();
        if dropped > 0 {
            tracing::debug!(%character, dropped, "dropped foreign entropy from client");
        }
        self.pending.merge(entropy);
    }

    /// Solve one step with the server's own input plus everything clients
    /// sent since the last step.
    pub fn advance(&mut self, local: &CosmicEntropy) -> SolveReport {
        let mut entropy = std::mem::take(&mut self.pending);
        entropy.merge(local.clone());
        let step = self.cosmos.step();
        let report = solve(&mut self.cosmos, &entropy, self.solver, &mut self.audiovisual);
        self.confirmed.push(ConfirmedStep { step, entropy });
        report
    }

    /// Confirmed steps produced since the last call, oldest first.
    pub fn drain_confirmed(&mut self) -> Vec<ConfirmedStep> {
        std::mem::take(&mut self.confirmed)
    }

    /// Full state for clients that joined late or fell behind.
    pub fn snapshot(&self) -> Result<CosmosSnapshot, SetupError> {
        Ok(CosmosSnapshot::capture(&self.cosmos)?)
    }

    pub fn cosmos(&self) -> &Cosmos {
        &self.cosmos
    }

    pub fn audiovisual(&self) -> &AudiovisualState {
        &self.audiovisual
    }

    pub(crate) fn viewables_mut(&mut self) -> (&mut Cosmos, &mut AudiovisualState) {
        (&mut self.cosmos, &mut self.audiovisual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_common::{SlotFunction, SlotId};
    use cosmos_input::{Intent, IntentKind, TransferRequest};
    use cosmos_kernel::CosmosSettings;
    use cosmos_solver::test_scenes::test_scene_cosmos;

    #[test]
    fn every_step_is_confirmed_in_order() {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let mut server = ServerSetup::new(cosmos, SolverSettings::default(), FrameSettings::default());
        server.accept_client_entropy(
            scene.player,
            CosmicEntropy::new().with_intent(scene.player, Intent::pressed(IntentKind::MoveUp)),
        );
        server.advance(&CosmicEntropy::new());
        server.advance(&CosmicEntropy::new());

        let confirmed = server.drain_confirmed();
        assert_eq!(confirmed.len(), 2);
        assert_eq!(confirmed[0].step, 0);
        assert_eq!(confirmed[1].step, 1);
        assert_eq!(confirmed[0].entropy.players[&scene.player].intents.len(), 1);
        assert!(confirmed[1].entropy.is_empty());
        assert!(server.drain_confirmed().is_empty());
    }

    #[test]
    fn clients_cannot_steer_others() {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let mut server = ServerSetup::new(cosmos, SolverSettings::default(), FrameSettings::default());
        let grunt = scene.grunts[0];
        let forged = CosmicEntropy::new()
            .with_intent(grunt, Intent::pressed(IntentKind::Shoot))
            .with_intent(scene.player, Intent::pressed(IntentKind::MoveLeft))
            .with_transfer(TransferRequest::to_slot(
                scene.rifle,
                SlotId::new(grunt, SlotFunction::PrimaryHand),
            ))
            .with_transfer(TransferRequest::drop_item(scene.backpack));
        server.accept_client_entropy(scene.player, forged);
        server.advance(&CosmicEntropy::new());

        let entropy = &server.drain_confirmed()[0].entropy;
        assert!(!entropy.players.contains_key(&grunt));
        assert!(entropy.players.contains_key(&scene.player));
        assert_eq!(entropy.transfer_requests, vec![TransferRequest::drop_item(scene.backpack)]);
    }

    #[test]
    fn snapshot_matches_cosmos() {
        let (cosmos, _) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let mut server = ServerSetup::new(cosmos, SolverSettings::default(), FrameSettings::default());
        server.advance(&CosmicEntropy::new());
        let snapshot = server.snapshot().unwrap();
        assert_eq!(snapshot.step(), 1);
        assert_eq!(snapshot.restore().unwrap().significant(), server.cosmos().significant());
    }
}
