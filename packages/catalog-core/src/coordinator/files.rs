//! Data file operations.

use chrono::Utc;

use super::{Catalog, DataFilePatch, NewDataFile};
use crate::error::CatalogError;
use crate::model::{entity, new_id, DataFile, FieldDetail, FileDetail, FileSummary};
use crate::store::{Change, StoreTransaction};

const CREATE_FILE: &str = "the creation of the DataFile";
const UPDATE_FILE: &str = "the update of the DataFile";
const DELETE_FILE: &str = "the deletion of the DataFile and its related records";
const READ_FILE: &str = "the lookup of the DataFile";

impl Catalog {
    /// Creates an empty data file owned by `caller`.
    pub async fn create_file(
        &self,
        spec: NewDataFile,
        caller: &str,
    ) -> Result<DataFile, CatalogError> {
        let values = spec.validate()?;
        let now = Utc::now();
        let file = DataFile {
            id: new_id(),
            short_name: values.short_name,
            long_name: values.long_name,
            file_location: Some(values.file_location),
            file_size: values.file_size,
            doc_link: values.doc_link,
            archive: values.archive,
            owner: caller.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.store
            .write(Change::InsertFile(file.clone()))
            .await
            .map_err(|e| self.store_failure(CREATE_FILE, &file.id, e))?;

        tracing::info!(caller, file_id = %file.id, "Created DataFile: {} ({})", file.short_name, file.long_name);
        Ok(file)
    }

    /// Lists the caller's files, each with its fields in layout order.
    pub async fn list_files(&self, caller: &str) -> Result<Vec<FileSummary>, CatalogError> {
        let files = self
            .store
            .files_owned_by(caller)
            .await
            .map_err(|e| self.store_failure(READ_FILE, caller, e))?;

        let mut summaries = Vec::with_capacity(files.len());
        for file in files {
            let fields = self
                .store
                .fields_of_file(&file.id)
                .await
                .map_err(|e| self.store_failure(READ_FILE, &file.id, e))?;
            summaries.push(FileSummary {
                fields: fields.iter().map(|f| f.summary()).collect(),
                file,
            });
        }
        Ok(summaries)
    }

    /// Reads a file with its fields ordered by begin position, each with its
    /// valid data and sub-structures.
    pub async fn get_file(&self, file_id: &str) -> Result<FileDetail, CatalogError> {
        self.check_id(file_id, entity::DATA_FILE)?;
        let file = self.load_file(file_id).await?;
        let fields = self
            .store
            .fields_of_file(file_id)
            .await
            .map_err(|e| self.store_failure(READ_FILE, file_id, e))?;

        let mut details = Vec::with_capacity(fields.len());
        for field in fields {
            let valid_data = self
                .store
                .valid_data_of_field(&field.id)
                .await
                .map_err(|e| self.store_failure(READ_FILE, &field.id, e))?;
            let data_structures = self
                .store
                .structures_of_field(&field.id)
                .await
                .map_err(|e| self.store_failure(READ_FILE, &field.id, e))?;
            details.push(FieldDetail {
                field,
                valid_data,
                data_structures,
            });
        }

        Ok(FileDetail {
            file,
            fields: details,
        })
    }

    /// Updates file attributes. Field positions are never touched here.
    pub async fn update_file(
        &self,
        file_id: &str,
        patch: DataFilePatch,
        caller: &str,
    ) -> Result<DataFile, CatalogError> {
        self.check_id(file_id, entity::DATA_FILE)?;
        let file = self.load_file(file_id).await?;
        self.authorize(
            caller,
            &file,
            "You do not have permission to update this DataFile.",
        )
        .await?;

        let mut updated = patch.apply_to(&file)?.ok_or_else(|| {
            CatalogError::InvalidInput("No valid fields provided for update.".to_string())
        })?;
        updated.updated_at = Utc::now();

        self.store
            .write(Change::UpdateFile(updated.clone()))
            .await
            .map_err(|e| self.store_failure(UPDATE_FILE, file_id, e))?;

        tracing::info!(caller, file_id, "Updated DataFile");
        Ok(updated)
    }

    /// Deletes a file and, in the same transaction, every field, valid value
    /// and sub-structure under it.
    ///
    /// Deleting a file that does not exist succeeds and returns its id.
    pub async fn delete_file(&self, file_id: &str, caller: &str) -> Result<String, CatalogError> {
        self.check_id(file_id, entity::DATA_FILE)?;
        let file = match self
            .store
            .file(file_id)
            .await
            .map_err(|e| self.store_failure(DELETE_FILE, file_id, e))?
        {
            Some(file) => file,
            None => {
                tracing::warn!(caller, file_id, "Attempted to delete non-existent DataFile");
                return Ok(file_id.to_string());
            }
        };
        self.authorize(
            caller,
            &file,
            "You do not have permission to delete this DataFile.",
        )
        .await?;

        let guard = self.file_guard(file_id).await;
        let mut tx = self.begin(DELETE_FILE, file_id).await?;
        let staged = self.stage_delete_file(tx.as_mut(), file_id).await;
        let removed = self.finish(tx, staged, DELETE_FILE, file_id).await?;
        drop(guard);
        self.locks.release_file(file_id);

        match removed {
            Some(count) => {
                tracing::info!(caller, file_id, "Deleted DataFile with {} field(s)", count)
            }
            None => tracing::warn!(caller, file_id, "DataFile was deleted concurrently"),
        }
        Ok(file.id)
    }

    /// Stages the cascade. Returns `None` when the file is already gone.
    pub(super) async fn stage_delete_file(
        &self,
        tx: &mut dyn StoreTransaction,
        file_id: &str,
    ) -> Result<Option<usize>, CatalogError> {
        let exists = tx
            .file(file_id)
            .await
            .map_err(|e| self.store_failure(DELETE_FILE, file_id, e))?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let fields = tx
            .fields_of_file(file_id)
            .await
            .map_err(|e| self.store_failure(DELETE_FILE, file_id, e))?;

        // Deepest dependents first; the store refuses to orphan rows.
        for field in &fields {
            for change in [
                Change::DeleteValidDataOfField {
                    field_id: field.id.clone(),
                },
                Change::DeleteStructuresOfField {
                    field_id: field.id.clone(),
                },
            ] {
                tx.apply(change)
                    .await
                    .map_err(|e| self.store_failure(DELETE_FILE, file_id, e))?;
            }
        }
        for field in &fields {
            tx.apply(Change::DeleteField {
                id: field.id.clone(),
            })
            .await
            .map_err(|e| self.store_failure(DELETE_FILE, file_id, e))?;
        }
        tx.apply(Change::DeleteFile {
            id: file_id.to_string(),
        })
        .await
        .map_err(|e| self.store_failure(DELETE_FILE, file_id, e))?;

        Ok(Some(fields.len()))
    }
}
