//! Field operations: append, resize with shift, delete with cascade.

use std::collections::HashMap;

use super::requests::{FieldChanges, FieldValues};
use super::{Catalog, FieldPatch, NewField};
use crate::error::CatalogError;
use crate::layout::{self, Span};
use crate::model::{entity, new_id, DataField, DataFile};
use crate::store::{Change, StoreTransaction};

const CREATE_FIELD: &str = "the creation of the DataField";
const UPDATE_FIELD: &str = "the update of the DataField";
const DELETE_FIELD: &str = "the deletion of the DataField and its related records";

impl Catalog {
    /// Appends a field after the file's current last field.
    ///
    /// # Arguments
    /// * `file_id` - Parent data file
    /// * `spec` - Field attributes; `fieldName`, `fieldSize` and `fieldType` are required
    /// * `caller` - Username of the caller
    ///
    /// # Returns
    /// The inserted field with its assigned positions. No other row changes.
    pub async fn create_field(
        &self,
        file_id: &str,
        spec: NewField,
        caller: &str,
    ) -> Result<DataField, CatalogError> {
        self.check_id(file_id, entity::DATA_FILE)?;
        let file = self.load_file(file_id).await?;
        self.authorize(
            caller,
            &file,
            "You do not have permission to add fields to this DataFile.",
        )
        .await?;
        let values = spec.validate()?;

        let _guard = self.file_guard(file_id).await;
        let mut tx = self.begin(CREATE_FIELD, file_id).await?;
        let staged = self.stage_create_field(tx.as_mut(), &file, values).await;
        let field = self.finish(tx, staged, CREATE_FIELD, file_id).await?;

        tracing::info!(
            caller,
            file_id,
            field_id = %field.id,
            "Created DataField: {} ({}) at {}-{}",
            field.field_name,
            field.field_size,
            field.beg_position,
            field.end_position
        );
        Ok(field)
    }

    async fn stage_create_field(
        &self,
        tx: &mut dyn StoreTransaction,
        file: &DataFile,
        values: FieldValues,
    ) -> Result<DataField, CatalogError> {
        let last = tx
            .last_field(&file.id)
            .await
            .map_err(|e| self.store_failure(CREATE_FIELD, &file.id, e))?;
        let span = layout::allocate(last.as_ref(), values.field_size)?;

        let field = DataField {
            id: new_id(),
            file_id: file.id.clone(),
            field_name: values.field_name,
            field_size: values.field_size,
            beg_position: span.beg,
            end_position: span.end,
            field_type: values.field_type,
            packed: values.packed,
            archive: values.archive,
            description: values.description,
            valid_data_notes: values.valid_data_notes,
        };
        tx.apply(Change::InsertField(field.clone()))
            .await
            .map_err(|e| self.store_failure(CREATE_FIELD, &file.id, e))?;
        Ok(field)
    }

    /// Updates a field. A size change shifts every later field of the same
    /// file by the size difference, all in one transaction.
    ///
    /// # Returns
    /// The updated field. Shifted siblings are not included; re-read the
    /// file for the full layout.
    pub async fn update_field(
        &self,
        field_id: &str,
        patch: FieldPatch,
        caller: &str,
    ) -> Result<DataField, CatalogError> {
        self.check_id(field_id, entity::DATA_FIELD)?;
        let (field, _file) = self
            .owned_field(
                field_id,
                caller,
                "You do not have permission to update this DataField.",
            )
            .await?;
        let changes = patch.validate()?;
        if changes.is_empty() {
            return Err(CatalogError::InvalidInput(
                "No valid fields provided for update.".to_string(),
            ));
        }

        // Commits write whole rows, so even a rename must not overlap a shift.
        let _guard = self.file_guard(&field.file_id).await;

        let mut tx = self.begin(UPDATE_FIELD, field_id).await?;
        let staged = self.stage_update_field(tx.as_mut(), field_id, &changes).await;
        let (updated, shifted) = self.finish(tx, staged, UPDATE_FIELD, field_id).await?;

        tracing::info!(
            caller,
            field_id,
            file_id = %updated.file_id,
            shifted,
            "Updated DataField: {} at {}-{}",
            updated.field_name,
            updated.beg_position,
            updated.end_position
        );
        Ok(updated)
    }

    /// Stages the update of one field plus the shift of its successors.
    ///
    /// The field is re-read inside the transaction so the shift is computed
    /// from the positions being replaced.
    async fn stage_update_field(
        &self,
        tx: &mut dyn StoreTransaction,
        field_id: &str,
        changes: &FieldChanges,
    ) -> Result<(DataField, usize), CatalogError> {
        let current = tx
            .field(field_id)
            .await
            .map_err(|e| self.store_failure(UPDATE_FIELD, field_id, e))?
            .ok_or_else(|| CatalogError::not_found(entity::DATA_FIELD, field_id))?;
        let mut updated = changes.apply_to(&current);

        let Some(new_size) = changes
            .field_size
            .filter(|size| *size != current.field_size)
        else {
            tx.apply(Change::UpdateField(updated.clone()))
                .await
                .map_err(|e| self.store_failure(UPDATE_FIELD, field_id, e))?;
            return Ok((updated, 0));
        };

        let siblings = tx
            .fields_of_file(&current.file_id)
            .await
            .map_err(|e| self.store_failure(UPDATE_FIELD, field_id, e))?;
        let plan = layout::plan_shift(&current, new_size, &siblings)?;

        updated.place(plan.target);
        tx.apply(Change::UpdateField(updated.clone()))
            .await
            .map_err(|e| self.store_failure(UPDATE_FIELD, field_id, e))?;

        let targets: HashMap<&str, Span> = plan
            .moves
            .iter()
            .map(|m| (m.field_id.as_str(), m.to))
            .collect();
        // siblings are ordered by begin position, so shifts apply in order
        for mut sibling in siblings {
            let Some(span) = targets.get(sibling.id.as_str()).copied() else {
                continue;
            };
            sibling.place(span);
            tx.apply(Change::UpdateField(sibling))
                .await
                .map_err(|e| self.store_failure(UPDATE_FIELD, field_id, e))?;
        }

        Ok((updated, plan.moves.len()))
    }

    /// Deletes a field with its valid data and sub-structures.
    ///
    /// Later fields keep their positions, so the layout is left with a gap
    /// where the field was.
    pub async fn delete_field(&self, field_id: &str, caller: &str) -> Result<String, CatalogError> {
        self.check_id(field_id, entity::DATA_FIELD)?;
        let (field, _file) = self
            .owned_field(
                field_id,
                caller,
                "You do not have permission to delete this DataField.",
            )
            .await?;

        let _guard = self.file_guard(&field.file_id).await;
        let mut tx = self.begin(DELETE_FIELD, field_id).await?;
        let staged = self.stage_delete_field(tx.as_mut(), field_id).await;
        self.finish(tx, staged, DELETE_FIELD, field_id).await?;

        tracing::info!(caller, field_id, file_id = %field.file_id, "Deleted DataField: {}", field.field_name);
        Ok(field.id)
    }

    async fn stage_delete_field(
        &self,
        tx: &mut dyn StoreTransaction,
        field_id: &str,
    ) -> Result<(), CatalogError> {
        let steps = [
            Change::DeleteValidDataOfField {
                field_id: field_id.to_string(),
            },
            Change::DeleteStructuresOfField {
                field_id: field_id.to_string(),
            },
            Change::DeleteField {
                id: field_id.to_string(),
            },
        ];
        for change in steps {
            tx.apply(change)
                .await
                .map_err(|e| self.store_failure(DELETE_FIELD, field_id, e))?;
        }
        Ok(())
    }
}
