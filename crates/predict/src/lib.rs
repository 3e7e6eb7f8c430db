//! Client-side prediction.
//!
//! A client keeps two cosmoi: the *referential* one, advanced only by state
//! and entropy the server has confirmed, and the *predicted* one, run ahead
//! with local input. Whenever confirmed state arrives the predicted cosmos is
//! rebuilt from the referential one by replaying buffered local entropy.
//!
//! # Invariants
//! - The referential cosmos never sees unconfirmed entropy.
//! - After every reconciliation, predicted equals referential plus the
//!   replayed local entropies, step for step.
//! - A rebuilt prediction that differs from the one it replaces raises the
//!   resample flag, and the flag reaches every [`ResampleSink`] exactly once.

mod coordinator;

pub use coordinator::{ConfirmedStep, PredictionCoordinator, PredictionSettings, ResampleSink};
