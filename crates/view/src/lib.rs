//! Presentation side of the cosmos.
//!
//! # Invariants
//! - Nothing here mutates a cosmos; every entry point takes `&Cosmos` or a
//!   [`ConstLogicStep`](cosmos_kernel::ConstLogicStep).
//! - Per-entity presentation state never outlives its entity, and a resample
//!   rebuilds all of it from the current cosmos.
//! - Readers of a [`DoubleBuffer`] see whole frames only.

mod audiovisual;
mod buffer;
mod frame;
mod renderer;
mod visibility;

pub use audiovisual::{AudiovisualState, FrameSettings, ParticleStream, SoundInstance};
pub use buffer::{DoubleBuffer, FramePublisher, FrameSubscriber, frame_channel};
pub use frame::{Frame, FrameEntity};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use visibility::{VisibilityJob, WorkerPool};

/// Errors from setting up presentation resources.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
