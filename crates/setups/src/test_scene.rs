use cosmos_input::CosmicEntropy;
use cosmos_kernel::Cosmos;
use cosmos_solver::test_scenes::{TestScene, test_scene_cosmos};
use cosmos_solver::{SolveReport, solve};
use cosmos_view::AudiovisualState;

use crate::{AppConfig, SetupError};

/// Single-player sandbox over the built-in test scene.
pub struct TestSceneSetup {
    cosmos: Cosmos,
    scene: TestScene,
    audiovisual: AudiovisualState,
    config: AppConfig,
}

impl TestSceneSetup {
    pub fn new(config: &AppConfig) -> Result<Self, SetupError> {
        let (cosmos, scene) = test_scene_cosmos(config.cosmos)?;
        let mut audiovisual = AudiovisualState::new(config.frame);
        audiovisual.resample(&cosmos);
        Ok(Self {
            cosmos,
            scene,
            audiovisual,
            config: config.clone(),
        })
    }

    pub fn advance(&mut self, input: &CosmicEntropy) -> SolveReport {
        solve(
            &mut self.cosmos,
            input,
            self.config.solver,
            &mut self.audiovisual,
        )
    }

    /// Rebuild the scene from scratch.
    pub fn restart(&mut self) -> Result<(), SetupError> {
        let (cosmos, scene) = test_scene_cosmos(self.config.cosmos)?;
        self.cosmos = cosmos;
        self.scene = scene;
        self.cosmos.request_resample();
        Ok(())
    }

    pub fn scene(&self) -> &TestScene {
        &self.scene
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
