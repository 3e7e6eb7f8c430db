use cosmos_common::EntityId;
use cosmos_input::CosmicEntropy;
use cosmos_kernel::Cosmos;
use cosmos_solver::SolveReport;
use cosmos_view::AudiovisualState;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    ClientSetup, EditorSetup, MainMenuSetup, ServerSetup, SetupError, TestSceneSetup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupKind {
    Server,
    Client,
    Editor,
    MainMenu,
    TestScene,
}

impl fmt::Display for SetupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetupKind::Server => "server",
            SetupKind::Client => "client",
            SetupKind::Editor => "editor",
            SetupKind::MainMenu => "main-menu",
            SetupKind::TestScene => "test-scene",
        })
    }
}

/// Whichever setup the process is currently running.
pub enum Setup {
    Server(ServerSetup),
    Client(ClientSetup),
    Editor(EditorSetup),
    MainMenu(MainMenuSetup),
    TestScene(TestSceneSetup),
}

impl Setup {
    pub fn kind(&self) -> SetupKind {
        match self {
            Setup::Server(_) => SetupKind::Server,
            Setup::Client(_) => SetupKind::Client,
            Setup::Editor(_) => SetupKind::Editor,
            Setup::MainMenu(_) => SetupKind::MainMenu,
            Setup::TestScene(_) => SetupKind::TestScene,
        }
    }

    /// Run one logic step with `input`. `None` when the setup did not
    /// simulate: a paused editor, or a client with a full prediction window.
    pub fn advance(&mut self, input: &CosmicEntropy) -> Result<Option<SolveReport>, SetupError> {
        Ok(match self {
            Setup::Server(s) => Some(s.advance(input)),
            Setup::Client(s) => s.advance(input),
            Setup::Editor(s) => s.advance(input),
            Setup::MainMenu(s) => Some(s.advance()?),
            Setup::TestScene(s) => Some(s.advance(input)),
        })
    }

    /// The cosmos presented to the user.
    pub fn viewed_cosmos(&self) -> &Cosmos {
        match self {
            Setup::Server(s) => s.cosmos(),
            Setup::Client(s) => s.predicted(),
            Setup::Editor(s) => s.cosmos(),
            Setup::MainMenu(s) => s.cosmos(),
            Setup::TestScene(s) => s.cosmos(),
        }
    }

    /// The character local input steers, if any.
    pub fn viewed_character(&self) -> Option<EntityId> {
        match self {
            Setup::Client(s) => Some(s.character()),
            Setup::TestScene(s) => Some(s.scene().player),
            Setup::Server(_) | Setup::Editor(_) | Setup::MainMenu(_) => None,
        }
    }

    pub fn audiovisual(&self) -> &AudiovisualState {
        match self {
            Setup::Server(s) => s.audiovisual(),
            Setup::Client(s) => s.audiovisual(),
            Setup::Editor(s) => s.audiovisual(),
            Setup::MainMenu(s) => s.audiovisual(),
            Setup::TestScene(s) => s.audiovisual(),
        }
    }

    /// Resample the audiovisual state if the viewed cosmos asked for it.
    pub fn reload_viewables(&mut self) -> bool {
        let (cosmos, audiovisual) = match self {
            Setup::Client(s) => return s.reload_viewables(),
            Setup::Server(s) => s.viewables_mut(),
            Setup::Editor(s) => s.viewables_mut(),
            Setup::MainMenu(s) => s.viewables_mut(),
            Setup::TestScene(s) => s.viewables_mut(),
        };
        if !cosmos.take_resample_request() {
            return false;
        }
        let _span = tracing::info_span!("resample", step = cosmos.step()).entered();
        audiovisual.resample(cosmos);
        true
    }

    /// Advance presentation by `dt` seconds of wall time.
    pub fn advance_audiovisual(&mut self, dt: f32) {
        let audiovisual = match self {
            Setup::Client(s) => s.audiovisual_mut(),
            Setup::Server(s) => s.viewables_mut().1,
            Setup::Editor(s) => s.viewables_mut().1,
            Setup::MainMenu(s) => s.viewables_mut().1,
            Setup::TestScene(s) => s.viewables_mut().1,
        };
        audiovisual.advance(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;
    use cosmos_author::EditCommand;

    #[test]
    fn every_kind_advances_or_pauses() {
        let config = AppConfig::default();
        let test_scene = TestSceneSetup::new(&config).unwrap();
        let player = test_scene.scene().player;
        let cosmos = test_scene.cosmos().clone();

        let mut setups = vec![
            Setup::TestScene(test_scene),
            Setup::Server(ServerSetup::new(cosmos.clone(), config.solver, config.frame)),
            Setup::Client(ClientSetup::new(
                cosmos.clone(),
                player,
                config.prediction,
                config.solver,
                config.frame,
            )),
            Setup::MainMenu(
                MainMenuSetup::new(cosmos.clone(), 100, config.solver, config.frame).unwrap(),
            ),
            Setup::Editor(EditorSetup::new(cosmos, config.solver, config.frame)),
        ];

        for setup in &mut setups {
            let advanced = setup.advance(&CosmicEntropy::new()).unwrap();
            let expected_step = if setup.kind() == SetupKind::Editor { 0 } else { 1 };
            assert_eq!(advanced.is_some(), expected_step == 1, "{}", setup.kind());
            assert_eq!(setup.viewed_cosmos().step(), expected_step, "{}", setup.kind());
        }
        assert_eq!(setups[2].viewed_character(), Some(player));
        assert_eq!(setups[4].viewed_character(), None);
    }

    #[test]
    fn editor_edit_resamples_on_reload() {
        let config = AppConfig::default();
        let test_scene = TestSceneSetup::new(&config).unwrap();
        let car = test_scene.scene().car;
        let mut editor = EditorSetup::new(test_scene.cosmos().clone(), config.solver, config.frame);
        editor.apply(EditCommand::Delete { id: car }).unwrap();

        let mut setup = Setup::Editor(editor);
        let before = setup.audiovisual().resample_count();
        assert!(setup.reload_viewables());
        assert!(!setup.reload_viewables());
        assert_eq!(setup.audiovisual().resample_count(), before + 1);
        assert!(setup.audiovisual().displayed_transform(car).is_none());
    }

    #[test]
    fn kind_names() {
        assert_eq!(SetupKind::MainMenu.to_string(), "main-menu");
        assert_eq!(SetupKind::TestScene.to_string(), "test-scene");
    }
}
