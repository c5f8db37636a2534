//! Per-file serialization of structural changes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

/// One async mutex per data file, created on first use.
#[derive(Debug, Default)]
pub(crate) struct FileLocks {
    files: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FileLocks {
    /// Waits until no other structural change of `file_id` is in progress.
    pub(crate) async fn acquire(&self, file_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut files = self.files.lock();
            Arc::clone(files.entry(file_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Forgets the lock of a deleted file.
    pub(crate) fn release_file(&self, file_id: &str) {
        self.files.lock().remove(file_id);
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.files.lock().len()
    }
}
