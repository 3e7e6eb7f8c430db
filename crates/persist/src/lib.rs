//! Persistence: content-addressed cosmos snapshots, entropy logs and demos.
//!
//! # Invariants
//! - A snapshot's digest is the SHA-256 of its CBOR bytes; nothing is
//!   restored from bytes that fail verification.
//! - Entropy logs are append-only and contiguous in step.
//! - Restoring a snapshot and replaying the entropies recorded after it
//!   reproduces the original run exactly.

mod codec;
mod demo;
mod snapshot;
mod store;

#[cfg(test)]
mod fixture;

pub use demo::{Demo, EntropyLog, LoggedEntropy};
pub use snapshot::{CosmosSnapshot, state_digest};
pub use store::{CosmosStore, IntegrityManifest, ManifestEntry, StoreMeta};

/// Errors from encoding, decoding and file-backed persistence.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("entropy for step {step} is missing from the log")]
    MissingEntropy { step: u64 },
    #[error("no snapshots found")]
    NoSnapshots,
}
