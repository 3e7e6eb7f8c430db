use cosmos_kernel::{Cosmos, CosmosSolvable};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::SnapshotError;
use crate::codec::{cbor_decode, cbor_encode, pack, sha256_hex, unpack};

/// Significant state of a cosmos at one step, as verifiable CBOR bytes.
///
/// The digest covers the encoded bytes, so two cosmoi with equal significant
/// state always produce equal digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosSnapshot {
    step: u64,
    digest: String,
    bytes: Vec<u8>,
}

impl CosmosSnapshot {
    pub fn capture(cosmos: &Cosmos) -> Result<Self, SnapshotError> {
        let bytes = cbor_encode(cosmos.significant())?;
        let digest = sha256_hex(&bytes);
        tracing::trace!(step = cosmos.step(), size = bytes.len(), %digest, "captured snapshot");
        Ok(Self {
            step: cosmos.step(),
            digest,
            bytes,
        })
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Size of the uncompressed CBOR payload.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn verify(&self) -> Result<(), SnapshotError> {
        let actual = sha256_hex(&self.bytes);
        if actual != self.digest {
            return Err(SnapshotError::DigestMismatch {
                expected: self.digest.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn decode(&self) -> Result<CosmosSolvable, SnapshotError> {
        self.verify()?;
        cbor_decode(&self.bytes)
    }

    /// A fresh cosmos with caches inferred from the snapshot.
    pub fn restore(&self) -> Result<Cosmos, SnapshotError> {
        Ok(Cosmos::from_significant(self.decode()?))
    }

    /// Overwrite an existing cosmos in place. Raises its resample flag.
    pub fn restore_into(&self, cosmos: &mut Cosmos) -> Result<(), SnapshotError> {
        let significant = self.decode()?;
        let _span = tracing::info_span!("restore_snapshot", step = self.step).entered();
        cosmos.assign_significant(significant);
        Ok(())
    }

    /// Compressed form for the network or disk.
    pub fn to_wire(&self) -> Result<Vec<u8>, SnapshotError> {
        pack(self)
    }

    /// Decode and verify a wire blob.
    pub fn from_wire(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = unpack(data)?;
        snapshot.verify()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        std::fs::write(path, self.to_wire()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Self::from_wire(&std::fs::read(path)?)
    }
}

/// Digest of a cosmos's significant state, for determinism checks.
pub fn state_digest(cosmos: &Cosmos) -> Result<String, SnapshotError> {
    Ok(sha256_hex(&cbor_encode(cosmos.significant())?))
}
