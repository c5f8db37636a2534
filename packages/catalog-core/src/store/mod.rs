//! Persistence abstraction and the in-memory store.
//!
//! The coordinator only sees [`CatalogStore`] and [`StoreTransaction`]. A
//! transaction stages [`Change`]s against its own view; nothing becomes
//! visible to other readers until [`StoreTransaction::commit`] succeeds, and a
//! failed commit leaves the store untouched.

mod change;
pub(crate) mod io_utils;
mod memory;
mod snapshot;
mod state;

use async_trait::async_trait;

pub use change::Change;
pub use memory::{MemoryStore, MemoryTransaction};
pub use snapshot::{SnapshotFile, SnapshotWriter, SNAPSHOT_VERSION};
pub use state::CatalogState;

use crate::error::StoreResult;
use crate::model::{DataField, DataFile, DataStructure, ValidData};

/// Read access plus transaction creation.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Loads one data file.
    async fn file(&self, id: &str) -> StoreResult<Option<DataFile>>;

    /// Loads the files owned by `owner`, ordered by short name.
    async fn files_owned_by(&self, owner: &str) -> StoreResult<Vec<DataFile>>;

    /// Loads one field.
    async fn field(&self, id: &str) -> StoreResult<Option<DataField>>;

    /// Loads the fields of a file, ordered by begin position.
    async fn fields_of_file(&self, file_id: &str) -> StoreResult<Vec<DataField>>;

    /// Loads the field with the greatest end position.
    async fn last_field(&self, file_id: &str) -> StoreResult<Option<DataField>> {
        let fields = self.fields_of_file(file_id).await?;
        Ok(crate::layout::last_field(&fields).cloned())
    }

    /// Loads one valid value.
    async fn valid_data(&self, id: &str) -> StoreResult<Option<ValidData>>;

    /// Loads the valid values of a field, ordered by sequence number.
    async fn valid_data_of_field(&self, field_id: &str) -> StoreResult<Vec<ValidData>>;

    /// Loads the sub-structures of a field, ordered by structure number.
    async fn structures_of_field(&self, field_id: &str) -> StoreResult<Vec<DataStructure>>;

    /// Opens a transaction.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    /// Applies a single change in its own transaction.
    async fn write(&self, change: Change) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        if let Err(e) = tx.apply(change).await {
            tx.rollback().await;
            return Err(e);
        }
        tx.commit().await
    }
}

/// Unit of work over a [`CatalogStore`].
///
/// Reads observe the transaction's own staged changes. Once committed or
/// rolled back, every further call fails with `TransactionClosed`.
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    async fn file(&self, id: &str) -> StoreResult<Option<DataFile>>;

    async fn field(&self, id: &str) -> StoreResult<Option<DataField>>;

    /// Fields of a file as seen by this transaction, ordered by begin position.
    async fn fields_of_file(&self, file_id: &str) -> StoreResult<Vec<DataField>>;

    /// The field with the greatest end position, if the file has any.
    async fn last_field(&self, file_id: &str) -> StoreResult<Option<DataField>> {
        let fields = self.fields_of_file(file_id).await?;
        Ok(crate::layout::last_field(&fields).cloned())
    }

    async fn valid_data(&self, id: &str) -> StoreResult<Option<ValidData>>;

    async fn valid_data_of_field(&self, field_id: &str) -> StoreResult<Vec<ValidData>>;

    /// Stages one change.
    async fn apply(&mut self, change: Change) -> StoreResult<()>;

    /// Publishes every staged change at once.
    async fn commit(&mut self) -> StoreResult<()>;

    /// Discards every staged change.
    async fn rollback(&mut self);
}
