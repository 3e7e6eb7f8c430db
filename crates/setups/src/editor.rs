use cosmos_author::{EditCommand, Editor};
use cosmos_common::EntityId;
use cosmos_input::CosmicEntropy;
use cosmos_kernel::{Cosmos, CosmosSolvable};
use cosmos_solver::{SolveReport, SolverSettings, solve};
use cosmos_view::{AudiovisualState, FrameSettings};

use crate::SetupError;

/// Edits a paused cosmos. A playtest runs the solver on the edited state and
/// throws the result away when it stops.
pub struct EditorSetup {
    cosmos: Cosmos,
    editor: Editor,
    audiovisual: AudiovisualState,
    solver: SolverSettings,
    playtest_origin: Option<CosmosSolvable>,
}

impl EditorSetup {
    pub fn new(cosmos: Cosmos, solver: SolverSettings, frame: FrameSettings) -> Self {
        let mut audiovisual = AudiovisualState::new(frame);
        audiovisual.resample(&cosmos);
        Self {
            cosmos,
            editor: Editor::new(),
            audiovisual,
            solver,
            playtest_origin: None,
        }
    }

    /// Apply an edit. Edits during a playtest are refused.
    pub fn apply(&mut self, command: EditCommand) -> Result<Option<EntityId>, SetupError> {
        if self.is_playtesting() {
            tracing::debug!("edit ignored during playtest");
            return Ok(None);
        }
        Ok(self.editor.apply(&mut self.cosmos, command)?)
    }

    pub fn undo(&mut self) -> bool {
        !self.is_playtesting() && self.editor.undo(&mut self.cosmos)
    }

    pub fn redo(&mut self) -> bool {
        !self.is_playtesting() && self.editor.redo(&mut self.cosmos)
    }

    pub fn start_playtest(&mut self) {
        if self.playtest_origin.is_none() {
            self.playtest_origin = Some(self.cosmos.significant().clone());
            tracing::info!(step = self.cosmos.step(), "playtest started");
        }
    }

    /// Restore the state the playtest started from.
    pub fn stop_playtest(&mut self) {
        if let Some(origin) = self.playtest_origin.take() {
            self.cosmos.assign_significant(origin);
            tracing::info!(step = self.cosmos.step(), "playtest stopped");
        }
    }

    pub fn is_playtesting(&self) -> bool {
        self.playtest_origin.is_some()
    }

    /// Solve only while playtesting.
    pub fn advance(&mut self, input: &CosmicEntropy) -> Option<SolveReport> {
        self.is_playtesting()
            .then(|| solve(&mut self.cosmos, input, self.solver, &mut self.audiovisual))
    }

    pub fn cosmos(&self) -> &Cosmos {
        &self.cosmos
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
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
    use cosmos_common::Transform;
    use cosmos_input::{Intent, IntentKind};
    use cosmos_kernel::CosmosSettings;
    use cosmos_solver::test_scenes::{TestScene, test_scene_cosmos};
    use glam::Vec2;

    fn setup() -> (EditorSetup, TestScene) {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        (
            EditorSetup::new(cosmos, SolverSettings::default(), FrameSettings::default()),
            scene,
        )
    }

    #[test]
    fn paused_until_playtest() {
        let (mut setup, _) = setup();
        assert!(setup.advance(&CosmicEntropy::new()).is_none());
        assert_eq!(setup.cosmos().step(), 0);
    }

    #[test]
    fn playtest_is_discarded() {
        let (mut setup, scene) = setup();
        setup
            .apply(EditCommand::SetTransform {
                id: scene.car,
                transform: Transform::at(Vec2::new(10.0, 10.0)),
            })
            .unwrap();
        let edited = setup.cosmos().significant().clone();

        setup.start_playtest();
        let walk = CosmicEntropy::new().with_intent(scene.player, Intent::pressed(IntentKind::MoveUp));
        for _ in 0..10 {
            assert!(setup.advance(&walk).is_some());
        }
        assert_eq!(setup.cosmos().step(), 10);
        assert!(!setup.undo());

        setup.stop_playtest();
        assert_eq!(setup.cosmos().significant(), &edited);
        assert!(setup.cosmos().resample_requested());
        assert!(setup.undo());
    }

    #[test]
    fn edits_surface_errors() {
        let (mut setup, scene) = setup();
        setup.apply(EditCommand::Delete { id: scene.car }).unwrap();
        let err = setup.apply(EditCommand::Delete { id: scene.car }).unwrap_err();
        assert!(matches!(err, SetupError::Edit(_)));
        assert_eq!(setup.editor().undo_count(), 1);
    }
}
