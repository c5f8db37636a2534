//! Catalog configuration.

use std::path::PathBuf;

/// Catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Data directory for snapshot persistence
    pub data_dir: PathBuf,
    /// Whether committed state is written to disk
    pub persist: bool,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Serialize layout changes per file within this process
    pub serialize_layout_changes: bool,
    /// Identifiers shorter than this are rejected as malformed
    pub min_id_len: usize,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl CatalogConfig {
    /// Path of the snapshot file inside the data directory.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    /// Configuration for a purely in-memory catalog.
    pub fn in_memory() -> Self {
        Self {
            persist: false,
            ..Default::default()
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            persist: true,
            request_timeout_ms: 5000, // 5 seconds default
            serialize_layout_changes: true,
            min_id_len: 5,
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
        }
    }
}
