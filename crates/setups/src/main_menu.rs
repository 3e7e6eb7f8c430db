use cosmos_input::CosmicEntropy;
use cosmos_kernel::Cosmos;
use cosmos_persist::CosmosSnapshot;
use cosmos_solver::{SolveReport, SolverSettings, solve};
use cosmos_view::{AudiovisualState, FrameSettings};

use crate::SetupError;

/// Background scene behind the menu. Ignores player input and rewinds to
/// its opening state every `loop_steps`.
pub struct MainMenuSetup {
    cosmos: Cosmos,
    intro: CosmosSnapshot,
    loop_steps: u64,
    audiovisual: AudiovisualState,
    solver: SolverSettings,
}

impl MainMenuSetup {
    pub fn new(
        cosmos: Cosmos,
        loop_steps: u64,
        solver: SolverSettings,
        frame: FrameSettings,
    ) -> Result<Self, SetupError> {
        let intro = CosmosSnapshot::capture(&cosmos)?;
        let mut audiovisual = AudiovisualState::new(frame);
        audiovisual.resample(&cosmos);
        Ok(Self {
            cosmos,
            intro,
            loop_steps: loop_steps.max(1),
            audiovisual,
            solver,
        })
    }

    pub fn advance(&mut self) -> Result<SolveReport, SetupError> {
        if self.cosmos.step() >= self.intro.step() + self.loop_steps {
            tracing::debug!(step = self.cosmos.step(), "menu background rewinds");
            self.intro.restore_into(&mut self.cosmos)?;
        }
        Ok(solve(
            &mut self.cosmos,
            &CosmicEntropy::new(),
            self.solver,
            &mut self.audiovisual,
        ))
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
