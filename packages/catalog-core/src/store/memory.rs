//! Copy-on-write in-memory store with optional snapshot persistence.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CatalogState, CatalogStore, Change, SnapshotWriter, StoreTransaction};
use crate::config::CatalogConfig;
use crate::error::{StoreError, StoreResult};
use crate::layout::{check_contiguity, layout_length};
use crate::model::{DataField, DataFile, DataStructure, ValidData};

#[derive(Debug)]
struct StoreInner {
    /// Last committed state
    state: ArcSwap<CatalogState>,
    /// Serializes commits
    commit_lock: Mutex<()>,
    /// Present when commits must reach disk
    snapshot: Option<SnapshotWriter>,
}

impl StoreInner {
    /// Replays `changes` onto the latest committed state and publishes the
    /// result. Either every change lands or none does.
    ///
    /// Blocks on the commit lock and on snapshot I/O; call it from a
    /// blocking task.
    fn publish(&self, changes: &[Change]) -> StoreResult<()> {
        let _guard = self.commit_lock.lock();
        let mut next = self.state.load_full().as_ref().clone();
        for change in changes {
            next.apply(change).inspect_err(|e| {
                tracing::debug!(change = change.kind(), "Replay onto latest state failed: {}", e);
            })?;
        }
        if let Some(snapshot) = &self.snapshot {
            snapshot.save(&next)?;
        }
        self.state.store(Arc::new(next));
        Ok(())
    }
}

/// Store keeping every row in memory.
///
/// Readers see the last committed state without locking; commits swap in a
/// new state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty, non-persistent store.
    pub fn new() -> Self {
        Self::from_parts(CatalogState::default(), None)
    }

    /// Opens the store described by `config`, loading the snapshot from the
    /// data directory when persistence is enabled.
    ///
    /// # Returns
    /// `StoreResult<MemoryStore>`; a damaged snapshot is `StoreError::Corrupt`.
    pub fn open(config: &CatalogConfig) -> StoreResult<Self> {
        if !config.persist {
            return Ok(Self::new());
        }
        let writer = SnapshotWriter::new(config);
        let state = writer.load()?.unwrap_or_default();
        tracing::info!(
            "Loaded catalog from {}: {} files, {} fields",
            writer.path().display(),
            state.files.len(),
            state.fields.len()
        );
        report_layouts(&state);
        Ok(Self::from_parts(state, Some(writer)))
    }

    fn from_parts(state: CatalogState, snapshot: Option<SnapshotWriter>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: ArcSwap::new(Arc::new(state)),
                commit_lock: Mutex::new(()),
                snapshot,
            }),
        }
    }

    /// Returns the last committed state.
    pub fn state(&self) -> Arc<CatalogState> {
        self.inner.state.load_full()
    }

    /// Returns whether commits are written to disk.
    pub fn is_persistent(&self) -> bool {
        self.inner.snapshot.is_some()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs files whose layout is not contiguous. Deleting a field leaves a gap,
/// so this is a warning rather than a load failure.
fn report_layouts(state: &CatalogState) {
    for file in state.files.values() {
        let fields = state.fields_of_file(&file.id);
        match check_contiguity(&fields) {
            Ok(()) => tracing::debug!(
                file_id = %file.id,
                "Field layout of '{}' spans {} position(s)",
                file.short_name,
                layout_length(&fields)
            ),
            Err(e) => tracing::warn!(
                file_id = %file.id,
                "Field layout of '{}' is not contiguous: {}",
                file.short_name,
                e
            ),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn file(&self, id: &str) -> StoreResult<Option<DataFile>> {
        Ok(self.inner.state.load().file(id))
    }

    async fn files_owned_by(&self, owner: &str) -> StoreResult<Vec<DataFile>> {
        Ok(self.inner.state.load().files_owned_by(owner))
    }

    async fn field(&self, id: &str) -> StoreResult<Option<DataField>> {
        Ok(self.inner.state.load().field(id))
    }

    async fn fields_of_file(&self, file_id: &str) -> StoreResult<Vec<DataField>> {
        Ok(self.inner.state.load().fields_of_file(file_id))
    }

    async fn valid_data(&self, id: &str) -> StoreResult<Option<ValidData>> {
        Ok(self.inner.state.load().valid_data(id))
    }

    async fn valid_data_of_field(&self, field_id: &str) -> StoreResult<Vec<ValidData>> {
        Ok(self.inner.state.load().valid_data_of_field(field_id))
    }

    async fn structures_of_field(&self, field_id: &str) -> StoreResult<Vec<DataStructure>> {
        Ok(self.inner.state.load().structures_of_field(field_id))
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction::new(Arc::clone(&self.inner))))
    }
}

/// Transaction over a [`MemoryStore`].
///
/// Works on a private copy of the committed state; changes are isolated
/// until commit.
#[derive(Debug)]
pub struct MemoryTransaction {
    store: Arc<StoreInner>,
    /// Committed state plus the changes staged so far
    view: CatalogState,
    /// Staged changes in application order
    changes: Vec<Change>,
    /// Whether the transaction has been committed
    committed: bool,
    /// Whether the transaction has been aborted
    aborted: bool,
}

impl MemoryTransaction {
    fn new(store: Arc<StoreInner>) -> Self {
        let view = store.state.load_full().as_ref().clone();
        Self {
            store,
            view,
            changes: Vec::new(),
            committed: false,
            aborted: false,
        }
    }

    /// Number of staged changes.
    pub fn staged_count(&self) -> usize {
        self.changes.len()
    }

    /// Returns whether the transaction is still active (not committed or aborted).
    pub fn is_active(&self) -> bool {
        !self.committed && !self.aborted
    }

    fn ensure_active(&self) -> StoreResult<()> {
        if self.committed {
            return Err(StoreError::TransactionClosed(
                "transaction already committed".to_string(),
            ));
        }
        if self.aborted {
            return Err(StoreError::TransactionClosed(
                "transaction aborted".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn file(&self, id: &str) -> StoreResult<Option<DataFile>> {
        self.ensure_active()?;
        Ok(self.view.file(id))
    }

    async fn field(&self, id: &str) -> StoreResult<Option<DataField>> {
        self.ensure_active()?;
        Ok(self.view.field(id))
    }

    async fn fields_of_file(&self, file_id: &str) -> StoreResult<Vec<DataField>> {
        self.ensure_active()?;
        Ok(self.view.fields_of_file(file_id))
    }

    async fn valid_data(&self, id: &str) -> StoreResult<Option<ValidData>> {
        self.ensure_active()?;
        Ok(self.view.valid_data(id))
    }

    async fn valid_data_of_field(&self, field_id: &str) -> StoreResult<Vec<ValidData>> {
        self.ensure_active()?;
        Ok(self.view.valid_data_of_field(field_id))
    }

    async fn apply(&mut self, change: Change) -> StoreResult<()> {
        self.ensure_active()?;
        self.view.apply(&change)?;
        self.changes.push(change);
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        self.ensure_active()?;
        let changes = std::mem::take(&mut self.changes);
        if changes.is_empty() {
            self.committed = true;
            return Ok(());
        }

        let store = Arc::clone(&self.store);
        let count = changes.len();
        let published = tokio::task::spawn_blocking(move || store.publish(&changes))
            .await
            .map_err(|e| StoreError::Io(format!("Commit task failed: {}", e)))
            .and_then(|result| result);
        match published {
            Ok(()) => {
                self.committed = true;
                tracing::trace!("Committed {} change(s)", count);
                Ok(())
            }
            Err(e) => {
                self.aborted = true;
                Err(e)
            }
        }
    }

    async fn rollback(&mut self) {
        if self.is_active() {
            tracing::debug!("Rolling back {} staged change(s)", self.staged_count());
            self.aborted = true;
            self.changes.clear();
        }
    }
}
