use cosmos_kernel::CosmosSettings;
use cosmos_predict::PredictionSettings;
use cosmos_solver::SolverSettings;
use cosmos_view::FrameSettings;
use serde::{Deserialize, Serialize};

/// Frame loop knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopSettings {
    /// Logic steps one frame may run before the loop gives up catching up.
    pub max_steps_per_frame: u32,
    /// Range of the per-frame visibility job.
    pub visibility_range: f32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_steps_per_frame: 5,
            visibility_range: 400.0,
        }
    }
}

/// Every setting a process needs, passed explicitly into each entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub cosmos: CosmosSettings,
    pub solver: SolverSettings,
    pub prediction: PredictionSettings,
    pub frame: FrameSettings,
    pub frame_loop: LoopSettings,
}
