//! Layout transaction coordinator.
//!
//! [`Catalog`] is the entry point the record API layer calls. Every operation
//! follows the same order: reject malformed ids, load the rows it needs,
//! check ownership, validate the request, then stage all writes in one store
//! transaction. Validation and authorization failures happen before any
//! write; any failure after the transaction is opened rolls it back.

mod fields;
mod files;
mod locks;
mod requests;
mod valid_data;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, StoreError};
use crate::model::{entity, DataField, DataFile};
use crate::ownership::OwnershipPolicy;
use crate::store::{CatalogStore, StoreTransaction};
use crate::validation;

use locks::FileLocks;

pub use requests::{
    DataFilePatch, FieldPatch, NewDataFile, NewField, NewValidData, ValidDataPatch,
};

/// Catalog service over a store and an ownership policy.
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    owners: Arc<dyn OwnershipPolicy>,
    config: CatalogConfig,
    locks: FileLocks,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("config", &self.config)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Creates a catalog.
    ///
    /// # Arguments
    /// * `store` - Persistence store
    /// * `owners` - Ownership decisions for mutations
    /// * `config` - Catalog configuration
    pub fn new(
        store: Arc<dyn CatalogStore>,
        owners: Arc<dyn OwnershipPolicy>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            store,
            owners,
            config,
            locks: FileLocks::default(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Returns the catalog configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Fails with NotFound unless `field_id` belongs to `file_id`.
    ///
    /// Routes address fields through their file; this keeps a field from
    /// being reached through some other file's path.
    pub async fn ensure_field_in_file(
        &self,
        file_id: &str,
        field_id: &str,
    ) -> Result<(), CatalogError> {
        self.check_id(file_id, entity::DATA_FILE)?;
        self.check_id(field_id, entity::DATA_FIELD)?;
        let field = self.load_field(field_id).await?;
        if field.file_id != file_id {
            return Err(CatalogError::not_found(entity::DATA_FIELD, field_id));
        }
        Ok(())
    }

    fn check_id(&self, id: &str, entity: &str) -> Result<(), CatalogError> {
        validation::record_id(id, entity, self.config.min_id_len)
    }

    async fn load_file(&self, file_id: &str) -> Result<DataFile, CatalogError> {
        self.store
            .file(file_id)
            .await
            .map_err(|e| self.store_failure("the lookup of the DataFile", file_id, e))?
            .ok_or_else(|| CatalogError::not_found(entity::DATA_FILE, file_id))
    }

    async fn load_field(&self, field_id: &str) -> Result<DataField, CatalogError> {
        self.store
            .field(field_id)
            .await
            .map_err(|e| self.store_failure("the lookup of the DataField", field_id, e))?
            .ok_or_else(|| CatalogError::not_found(entity::DATA_FIELD, field_id))
    }

    /// Loads a field and its file, and checks that `caller` may change them.
    async fn owned_field(
        &self,
        field_id: &str,
        caller: &str,
        denied: &str,
    ) -> Result<(DataField, DataFile), CatalogError> {
        let field = self.load_field(field_id).await?;
        let file = self.load_file(&field.file_id).await?;
        self.authorize(caller, &file, denied).await?;
        Ok((field, file))
    }

    async fn authorize(
        &self,
        caller: &str,
        file: &DataFile,
        denied: &str,
    ) -> Result<(), CatalogError> {
        if self.owners.may_modify(caller, file).await {
            Ok(())
        } else {
            tracing::warn!(caller, file_id = %file.id, "Ownership check failed");
            Err(CatalogError::Forbidden(denied.to_string()))
        }
    }

    /// Serializes structural changes of one file when configured to.
    async fn file_guard(&self, file_id: &str) -> Option<OwnedMutexGuard<()>> {
        if self.config.serialize_layout_changes {
            Some(self.locks.acquire(file_id).await)
        } else {
            None
        }
    }

    /// Translates a store error. A missing row stays NotFound; everything
    /// else is logged with its context and reported generically.
    fn store_failure(&self, operation: &'static str, target: &str, err: StoreError) -> CatalogError {
        match err {
            StoreError::NotFound { entity, id } => CatalogError::NotFound { entity, id },
            other => {
                tracing::error!(operation, target, "Store failure: {}", other);
                CatalogError::TransactionFailure { operation }
            }
        }
    }

    async fn begin(
        &self,
        operation: &'static str,
        target: &str,
    ) -> Result<Box<dyn StoreTransaction>, CatalogError> {
        self.store
            .begin()
            .await
            .map_err(|e| self.store_failure(operation, target, e))
    }

    /// Commits `tx` if staging succeeded, otherwise rolls it back.
    async fn finish<T>(
        &self,
        mut tx: Box<dyn StoreTransaction>,
        staged: Result<T, CatalogError>,
        operation: &'static str,
        target: &str,
    ) -> Result<T, CatalogError> {
        match staged {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| self.store_failure(operation, target, e))?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback().await;
                tracing::debug!(operation, target, "Rolled back: {}", e);
                Err(e)
            }
        }
    }
}
