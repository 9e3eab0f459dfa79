//! Durable snapshot store
//!
//! One file per exchange name inside the configured directory, written
//! atomically (tmp + fsync + rename) and wrapped in an envelope carrying a
//! format version and a SHA-256 checksum of the serialized state. Loads
//! verify both before handing the state back.

use crate::snapshot::ExchangeSnapshot;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

const PLAIN_EXT: &str = "snap";
const COMPRESSED_EXT: &str = "snap.zst";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("compression error: {0}")]
    Compression(String),
}

/// On-disk wrapper around the exchange state.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    version: u32,
    /// SHA-256 hex digest of the bincode-serialized state.
    checksum: String,
    state: ExchangeSnapshot,
}

fn state_checksum(state: &ExchangeSnapshot) -> Result<String, SnapshotError> {
    let bytes =
        bincode::serialize(state).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Snapshot store keyed by exchange name
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    compress: bool,
}

impl SnapshotStore {
    /// Create a store rooted at `dir`; `compress` enables zstd
    pub fn new(dir: impl Into<PathBuf>, compress: bool) -> Self {
        Self {
            dir: dir.into(),
            compress,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist the state under `name`, replacing any previous snapshot
    pub fn save(&self, name: &str, state: &ExchangeSnapshot) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.dir)?;

        let envelope = SnapshotEnvelope {
            version: SNAPSHOT_VERSION,
            checksum: state_checksum(state)?,
            state: state.clone(),
        };
        let data = bincode::serialize(&envelope)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        let (final_data, ext) = if self.compress {
            let compressed = zstd::encode_all(data.as_slice(), 3)
                .map_err(|e| SnapshotError::Compression(e.to_string()))?;
            (compressed, COMPRESSED_EXT)
        } else {
            (data, PLAIN_EXT)
        };

        let path = self.dir.join(format!("{name}.{ext}"));
        let tmp_path = self.dir.join(format!("{name}.{ext}.tmp"));

        // Atomic replace: write to tmp, fsync, rename.
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&final_data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        // A previous save with the other compression setting would shadow
        // this one on load; clear it out.
        let other = self.dir.join(format!(
            "{name}.{}",
            if self.compress { PLAIN_EXT } else { COMPRESSED_EXT }
        ));
        if other.exists() {
            fs::remove_file(&other)?;
        }

        info!(name, path = %path.display(), bytes = final_data.len(), "snapshot saved");
        Ok(path)
    }

    /// Load the state stored under `name`, or `None` if there is none
    pub fn load(&self, name: &str) -> Result<Option<ExchangeSnapshot>, SnapshotError> {
        let Some(path) = self.find(name) else {
            return Ok(None);
        };

        let mut data = Vec::new();
        File::open(&path)?.read_to_end(&mut data)?;

        let is_compressed = path.to_string_lossy().ends_with(COMPRESSED_EXT);
        let decompressed = if is_compressed {
            zstd::decode_all(data.as_slice())
                .map_err(|e| SnapshotError::Compression(e.to_string()))?
        } else {
            data
        };

        let envelope: SnapshotEnvelope = bincode::deserialize(&decompressed)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        if envelope.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(envelope.version));
        }

        let actual = state_checksum(&envelope.state)?;
        if actual != envelope.checksum {
            return Err(SnapshotError::IntegrityFailure {
                expected: envelope.checksum,
                actual,
            });
        }

        debug!(name, path = %path.display(), "snapshot loaded");
        Ok(Some(envelope.state))
    }

    /// Whether a snapshot exists under `name`
    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Remove the snapshot stored under `name`, if any
    pub fn delete(&self, name: &str) -> Result<(), SnapshotError> {
        for ext in [COMPRESSED_EXT, PLAIN_EXT] {
            let path = self.dir.join(format!("{name}.{ext}"));
            if path.exists() {
                fs::remove_file(&path)?;
                info!(name, path = %path.display(), "snapshot deleted");
            }
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<PathBuf> {
        for ext in [COMPRESSED_EXT, PLAIN_EXT] {
            let path = self.dir.join(format!("{name}.{ext}"));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }
}
