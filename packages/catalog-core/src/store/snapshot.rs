//! Checksummed JSON snapshots of the catalog state.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::io_utils::{classify_io_error, retry_io_operation};
use super::CatalogState;
use crate::config::CatalogConfig;
use crate::error::{StoreError, StoreResult};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk snapshot layout.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Snapshot format version
    pub version: u32,
    /// CRC32 of the canonical JSON encoding of `state`
    pub checksum: u32,
    /// Catalog rows
    pub state: serde_json::Value,
}

/// Reads and writes the snapshot file of one data directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    data_dir: PathBuf,
    path: PathBuf,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl SnapshotWriter {
    /// Creates a writer for the snapshot configured in `config`.
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            path: config.snapshot_path(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads the snapshot, or `None` if none has been written yet.
    ///
    /// # Returns
    /// `StoreResult<Option<CatalogState>>`; a version or checksum mismatch is
    /// reported as `StoreError::Corrupt`.
    pub fn load(&self) -> StoreResult<Option<CatalogState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut bytes = Vec::new();
        File::open(&self.path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|e| classify_io_error(e, "read snapshot"))?;

        let file: SnapshotFile = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("Failed to parse snapshot: {}", e)))?;

        if file.version != SNAPSHOT_VERSION {
            return Err(StoreError::Corrupt(format!(
                "Unsupported snapshot version {} (expected {})",
                file.version, SNAPSHOT_VERSION
            )));
        }

        let actual = checksum(&file.state)?;
        if actual != file.checksum {
            return Err(StoreError::Corrupt(format!(
                "Snapshot checksum mismatch: expected {:08x}, got {:08x}",
                file.checksum, actual
            )));
        }

        let state = serde_json::from_value(file.state)
            .map_err(|e| StoreError::Corrupt(format!("Invalid snapshot contents: {}", e)))?;
        Ok(Some(state))
    }

    /// Writes `state` atomically: temp file, fsync, rename.
    pub fn save(&self, state: &CatalogState) -> StoreResult<()> {
        let value = serde_json::to_value(state)
            .map_err(|e| StoreError::Io(format!("Failed to serialize snapshot: {}", e)))?;
        let file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            checksum: checksum(&value)?,
            state: value,
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| StoreError::Io(format!("Failed to serialize snapshot: {}", e)))?;

        retry_io_operation(
            || self.write_atomically(&bytes),
            self.max_retries,
            self.retry_delay_ms,
            "snapshot write",
        )
    }

    fn write_atomically(&self, bytes: &[u8]) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| classify_io_error(e, "create data directory"))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut temp = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "create temp snapshot"))?;
        temp.write_all(bytes)
            .map_err(|e| classify_io_error(e, "write temp snapshot"))?;
        temp.sync_all()
            .map_err(|e| classify_io_error(e, "sync temp snapshot"))?;

        // Atomic rename
        fs::rename(&temp_path, &self.path).map_err(|e| classify_io_error(e, "rename snapshot"))
    }
}

fn checksum(state: &serde_json::Value) -> StoreResult<u32> {
    let bytes = serde_json::to_vec(state)
        .map_err(|e| StoreError::Io(format!("Failed to encode snapshot state: {}", e)))?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize())
}
