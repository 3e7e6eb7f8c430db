//! Setups: the closed set of ways a process drives a cosmos, and the frame
//! loop that runs whichever one is active.
//!
//! # Invariants
//! - Every setup exposes the same surface: advance by input, report the
//!   cosmos it shows, keep its audiovisual state in step with that cosmos.
//! - A setup owns its cosmoi outright; nothing else mutates them.
//! - Presentation reads published frames only, never a live cosmos.

mod client;
mod config;
mod editor;
mod frame_loop;
mod main_menu;
mod server;
mod setup;
mod test_scene;

pub use client::ClientSetup;
pub use config::{AppConfig, LoopSettings};
pub use editor::EditorSetup;
pub use frame_loop::{FrameLoop, FrameOutcome, FramePhase};
pub use main_menu::MainMenuSetup;
pub use server::ServerSetup;
pub use setup::{Setup, SetupKind};
pub use test_scene::TestSceneSetup;

use cosmos_author::EditError;
use cosmos_ecs::FlavourError;
use cosmos_persist::SnapshotError;
use cosmos_view::ViewError;

/// Errors from building or driving a setup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to register flavours: {0}")]
    Flavours(#[from] FlavourError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("view error: {0}")]
    View(#[from] ViewError),
    #[error("edit rejected: {0}")]
    Edit(#[from] EditError),
}
