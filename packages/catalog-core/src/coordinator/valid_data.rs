//! Valid value operations.

use super::requests::ValidDataValues;
use super::{Catalog, NewValidData, ValidDataPatch};
use crate::error::CatalogError;
use crate::model::{entity, new_id, ValidData};
use crate::store::{Change, StoreTransaction};

const CREATE_VALID_DATA: &str = "the creation of the ValidData";
const UPDATE_VALID_DATA: &str = "the update of the ValidData";
const DELETE_VALID_DATA: &str = "the deletion of the ValidData";

impl Catalog {
    /// Adds a valid value to a field. The sequence number is one past the
    /// highest existing one for that field.
    ///
    /// # Arguments
    /// * `field_id` - Parent field
    /// * `spec` - `validData` and `validDataDesc` are required
    /// * `caller` - Username of the caller
    pub async fn create_valid_data(
        &self,
        field_id: &str,
        spec: NewValidData,
        caller: &str,
    ) -> Result<ValidData, CatalogError> {
        self.check_id(field_id, entity::DATA_FIELD)?;
        let (field, _file) = self
            .owned_field(
                field_id,
                caller,
                "You do not have permission to add valid data to this DataField.",
            )
            .await?;
        let values = spec.validate()?;

        let _guard = self.file_guard(&field.file_id).await;
        let mut tx = self.begin(CREATE_VALID_DATA, field_id).await?;
        let staged = self
            .stage_create_valid_data(tx.as_mut(), field_id, values)
            .await;
        let row = self
            .finish(tx, staged, CREATE_VALID_DATA, field_id)
            .await?;

        tracing::info!(
            caller,
            field_id,
            valid_data_id = %row.id,
            "Created ValidData #{}: {}",
            row.seq_id,
            row.valid_data
        );
        Ok(row)
    }

    async fn stage_create_valid_data(
        &self,
        tx: &mut dyn StoreTransaction,
        field_id: &str,
        values: ValidDataValues,
    ) -> Result<ValidData, CatalogError> {
        let existing = tx
            .valid_data_of_field(field_id)
            .await
            .map_err(|e| self.store_failure(CREATE_VALID_DATA, field_id, e))?;
        let seq_id = existing
            .iter()
            .map(|v| v.seq_id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| {
                CatalogError::InvalidInput("seqID is out of range for this DataField.".to_string())
            })?;

        let row = ValidData {
            id: new_id(),
            field_id: field_id.to_string(),
            seq_id,
            valid_data: values.valid_data,
            valid_data_desc: values.valid_data_desc,
            archive: values.archive,
        };
        tx.apply(Change::InsertValidData(row.clone()))
            .await
            .map_err(|e| self.store_failure(CREATE_VALID_DATA, field_id, e))?;
        Ok(row)
    }

    /// Updates a valid value's text, description or archive flag.
    pub async fn update_valid_data(
        &self,
        valid_data_id: &str,
        patch: ValidDataPatch,
        caller: &str,
    ) -> Result<ValidData, CatalogError> {
        self.check_id(valid_data_id, entity::VALID_DATA)?;
        let row = self.load_valid_data(valid_data_id).await?;
        self.owned_valid_data(
            &row,
            caller,
            "You do not have permission to update this ValidData.",
        )
        .await?;

        let mut tx = self.begin(UPDATE_VALID_DATA, valid_data_id).await?;
        let staged = self
            .stage_update_valid_data(tx.as_mut(), valid_data_id, &patch)
            .await;
        let updated = self
            .finish(tx, staged, UPDATE_VALID_DATA, valid_data_id)
            .await?;

        tracing::info!(caller, valid_data_id, field_id = %updated.field_id, "Updated ValidData");
        Ok(updated)
    }

    /// Deletes a valid value. Remaining sequence numbers are left as they are.
    pub async fn delete_valid_data(
        &self,
        valid_data_id: &str,
        caller: &str,
    ) -> Result<ValidData, CatalogError> {
        self.check_id(valid_data_id, entity::VALID_DATA)?;
        let row = self.load_valid_data(valid_data_id).await?;
        self.owned_valid_data(
            &row,
            caller,
            "You do not have permission to delete this ValidData.",
        )
        .await?;

        let mut tx = self.begin(DELETE_VALID_DATA, valid_data_id).await?;
        let staged = self
            .stage_delete_valid_data(tx.as_mut(), valid_data_id)
            .await;
        let row = self
            .finish(tx, staged, DELETE_VALID_DATA, valid_data_id)
            .await?;

        tracing::info!(caller, valid_data_id, field_id = %row.field_id, "Deleted ValidData #{}", row.seq_id);
        Ok(row)
    }

    /// Re-reads the row inside `tx` so the patch lands on the current values.
    pub(super) async fn stage_update_valid_data(
        &self,
        tx: &mut dyn StoreTransaction,
        valid_data_id: &str,
        patch: &ValidDataPatch,
    ) -> Result<ValidData, CatalogError> {
        let current = self
            .staged_valid_data(tx, UPDATE_VALID_DATA, valid_data_id)
            .await?;
        let updated = patch.apply_to(&current)?.ok_or_else(|| {
            CatalogError::InvalidInput("No valid fields provided for update.".to_string())
        })?;
        tx.apply(Change::UpdateValidData(updated.clone()))
            .await
            .map_err(|e| self.store_failure(UPDATE_VALID_DATA, valid_data_id, e))?;
        Ok(updated)
    }

    async fn stage_delete_valid_data(
        &self,
        tx: &mut dyn StoreTransaction,
        valid_data_id: &str,
    ) -> Result<ValidData, CatalogError> {
        let row = self
            .staged_valid_data(tx, DELETE_VALID_DATA, valid_data_id)
            .await?;
        tx.apply(Change::DeleteValidData {
            id: valid_data_id.to_string(),
        })
        .await
        .map_err(|e| self.store_failure(DELETE_VALID_DATA, valid_data_id, e))?;
        Ok(row)
    }

    async fn staged_valid_data(
        &self,
        tx: &dyn StoreTransaction,
        operation: &'static str,
        valid_data_id: &str,
    ) -> Result<ValidData, CatalogError> {
        tx.valid_data(valid_data_id)
            .await
            .map_err(|e| self.store_failure(operation, valid_data_id, e))?
            .ok_or_else(|| CatalogError::not_found(entity::VALID_DATA, valid_data_id))
    }

    /// Fails with NotFound unless `valid_data_id` belongs to `field_id`.
    pub async fn ensure_valid_data_in_field(
        &self,
        field_id: &str,
        valid_data_id: &str,
    ) -> Result<(), CatalogError> {
        self.check_id(valid_data_id, entity::VALID_DATA)?;
        let row = self.load_valid_data(valid_data_id).await?;
        if row.field_id != field_id {
            return Err(CatalogError::not_found(entity::VALID_DATA, valid_data_id));
        }
        Ok(())
    }

    async fn load_valid_data(&self, valid_data_id: &str) -> Result<ValidData, CatalogError> {
        self.store
            .valid_data(valid_data_id)
            .await
            .map_err(|e| self.store_failure("the lookup of the ValidData", valid_data_id, e))?
            .ok_or_else(|| CatalogError::not_found(entity::VALID_DATA, valid_data_id))
    }

    async fn owned_valid_data(
        &self,
        row: &ValidData,
        caller: &str,
        denied: &str,
    ) -> Result<(), CatalogError> {
        self.owned_field(&row.field_id, caller, denied).await?;
        Ok(())
    }
}
