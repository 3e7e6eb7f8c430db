//! File-backed cosmos persistence.
//!
//! Layout inside the store directory:
//! ```text
//! store.meta.json              - metadata and schema versions
//! snapshots/
//!   000001.snapshot.cbor.zst   - compressed snapshots
//! entropy/
//!   000001.entropy.cbor.zst    - compressed entropy log segments
//! integrity/
//!   manifest.json              - hash chain over every file above
//! ```

use cosmos_kernel::Cosmos;
use cosmos_solver::{NoCallbacks, SolverSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::SnapshotError;
use crate::codec::{pack, sha256_hex, unpack};
use crate::demo::EntropyLog;
use crate::snapshot::CosmosSnapshot;

const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
const ENTROPY_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "store.meta.json";
const SNAPSHOTS_DIR: &str = "snapshots";
const ENTROPY_DIR: &str = "entropy";
const INTEGRITY_DIR: &str = "integrity";
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub snapshot_schema_version: u32,
    pub entropy_schema_version: u32,
    pub snapshot_count: u32,
    pub entropy_segment_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub prev_hash: Option<String>,
}

/// Every written file in order, each entry chained to the previous hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

/// Snapshots plus entropy segments on disk, with schema checks and a hash chain.
pub struct CosmosStore {
    root: PathBuf,
    meta: StoreMeta,
    manifest: IntegrityManifest,
}

impl CosmosStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let root = path.as_ref().to_path_buf();
        for dir in [SNAPSHOTS_DIR, ENTROPY_DIR, INTEGRITY_DIR] {
            std::fs::create_dir_all(root.join(dir))?;
        }

        let meta_path = root.join(META_FILE);
        let manifest_path = root.join(INTEGRITY_DIR).join(MANIFEST_FILE);

        let (meta, manifest) = if meta_path.exists() {
            let meta: StoreMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            check_schema(meta.snapshot_schema_version, SNAPSHOT_SCHEMA_VERSION)?;
            check_schema(meta.entropy_schema_version, ENTROPY_SCHEMA_VERSION)?;
            let manifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            (meta, manifest)
        } else {
            let store = Self {
                root: root.clone(),
                meta: StoreMeta {
                    snapshot_schema_version: SNAPSHOT_SCHEMA_VERSION,
                    entropy_schema_version: ENTROPY_SCHEMA_VERSION,
                    snapshot_count: 0,
                    entropy_segment_count: 0,
                },
                manifest: IntegrityManifest::default(),
            };
            store.save_meta()?;
            store.save_manifest()?;
            (store.meta, store.manifest)
        };

        tracing::debug!(root = %root.display(), snapshots = meta.snapshot_count, "opened cosmos store");
        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    pub fn manifest(&self) -> &IntegrityManifest {
        &self.manifest
    }

    /// Write a snapshot of `cosmos` as the newest one.
    pub fn take_snapshot(&mut self, cosmos: &Cosmos) -> Result<(), SnapshotError> {
        let snapshot = CosmosSnapshot::capture(cosmos)?;
        self.meta.snapshot_count += 1;
        let filename = snapshot_filename(self.meta.snapshot_count);
        self.write_chained(SNAPSHOTS_DIR, filename, &snapshot.to_wire()?)
    }

    /// Append an entropy log as a new segment.
    pub fn append_entropy(&mut self, log: &EntropyLog) -> Result<(), SnapshotError> {
        if log.is_empty() {
            return Ok(());
        }
        self.meta.entropy_segment_count += 1;
        let filename = entropy_filename(self.meta.entropy_segment_count);
        self.write_chained(ENTROPY_DIR, filename, &pack(log)?)
    }

    /// Restore the newest snapshot and replay every stored entropy after it.
    pub fn load_latest(&self, settings: SolverSettings) -> Result<Cosmos, SnapshotError> {
        if self.meta.snapshot_count == 0 {
            return Err(SnapshotError::NoSnapshots);
        }
        let snapshot = self.load_snapshot(self.meta.snapshot_count)?;
        let mut cosmos = snapshot.restore()?;

        for segment in 1..=self.meta.entropy_segment_count {
            let log = self.load_entropy_segment(segment)?;
            if log.end_step().is_some_and(|end| end <= cosmos.step()) {
                continue;
            }
            log.replay_onto(&mut cosmos, settings, &mut NoCallbacks)?;
        }
        Ok(cosmos)
    }

    /// Check every file against the manifest and the manifest's own chain.
    pub fn verify_integrity(&self) -> Result<(), SnapshotError> {
        let mut prev_hash: Option<String> = None;
        for entry in &self.manifest.entries {
            if entry.prev_hash != prev_hash {
                return Err(SnapshotError::DigestMismatch {
                    expected: prev_hash.unwrap_or_else(|| "None".into()),
                    actual: entry.prev_hash.clone().unwrap_or_else(|| "None".into()),
                });
            }
            let data = std::fs::read(self.path_of(&entry.filename))?;
            let actual = sha256_hex(&data);
            if actual != entry.sha256 {
                return Err(SnapshotError::DigestMismatch {
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
            prev_hash = Some(entry.sha256.clone());
        }
        Ok(())
    }

    fn path_of(&self, filename: &str) -> PathBuf {
        let dir = if filename.contains(".snapshot.") {
            SNAPSHOTS_DIR
        } else {
            ENTROPY_DIR
        };
        self.root.join(dir).join(filename)
    }

    fn write_chained(
        &mut self,
        dir: &str,
        filename: String,
        data: &[u8],
    ) -> Result<(), SnapshotError> {
        let sha256 = sha256_hex(data);
        let prev_hash = self.manifest.entries.last().map(|e| e.sha256.clone());
        std::fs::write(self.root.join(dir).join(&filename), data)?;
        tracing::debug!(%filename, bytes = data.len(), "wrote store file");

        self.manifest.entries.push(ManifestEntry {
            filename,
            sha256,
            prev_hash,
        });
        self.save_meta()?;
        self.save_manifest()
    }

    fn read_verified(&self, filename: &str) -> Result<Vec<u8>, SnapshotError> {
        let data = std::fs::read(self.path_of(filename))?;
        if let Some(entry) = self.manifest.entries.iter().find(|e| e.filename == filename) {
            let actual = sha256_hex(&data);
            if entry.sha256 != actual {
                return Err(SnapshotError::DigestMismatch {
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }
        Ok(data)
    }

    fn load_snapshot(&self, index: u32) -> Result<CosmosSnapshot, SnapshotError> {
        CosmosSnapshot::from_wire(&self.read_verified(&snapshot_filename(index))?)
    }

    fn load_entropy_segment(&self, index: u32) -> Result<EntropyLog, SnapshotError> {
        unpack(&self.read_verified(&entropy_filename(index))?)
    }

    fn save_meta(&self) -> Result<(), SnapshotError> {
        let path = self.root.join(META_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), SnapshotError> {
        let path = self.root.join(INTEGRITY_DIR).join(MANIFEST_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.manifest)?;
        Ok(())
    }
}

fn check_schema(file_version: u32, expected_version: u32) -> Result<(), SnapshotError> {
    if file_version != expected_version {
        return Err(SnapshotError::SchemaMismatch {
            file_version,
            expected_version,
        });
    }
    Ok(())
}

fn snapshot_filename(index: u32) -> String {
    format!("{index:06}.snapshot.cbor.zst")
}

fn entropy_filename(index: u32) -> String {
    format!("{index:06}.entropy.cbor.zst")
}
