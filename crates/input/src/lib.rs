//! Input entropy: everything a tick consumes from outside the cosmos.
//!
//! # Invariants
//! - Entropy is opaque, ordered data; the same entropy on the same cosmos
//!   yields the same next state on every machine.
//! - Server, predicting client and demo playback all feed the solver the
//!   same type.

pub mod entropy;

pub use entropy::{CosmicEntropy, Intent, IntentKind, PlayerEntropy, TransferRequest};
