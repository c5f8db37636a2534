//! Row state shared by the in-memory store and its transactions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Change;
use crate::error::{StoreError, StoreResult};
use crate::model::{entity, DataField, DataFile, DataStructure, ValidData};

/// Complete catalog contents, keyed by row id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogState {
    pub files: BTreeMap<String, DataFile>,
    pub fields: BTreeMap<String, DataField>,
    pub valid_data: BTreeMap<String, ValidData>,
    pub structures: BTreeMap<String, DataStructure>,
}

impl CatalogState {
    pub fn file(&self, id: &str) -> Option<DataFile> {
        self.files.get(id).cloned()
    }

    /// Files owned by `owner`, ordered by short name.
    pub fn files_owned_by(&self, owner: &str) -> Vec<DataFile> {
        let mut files: Vec<DataFile> = self
            .files
            .values()
            .filter(|f| f.owner == owner)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.short_name.cmp(&b.short_name).then(a.id.cmp(&b.id)));
        files
    }

    pub fn field(&self, id: &str) -> Option<DataField> {
        self.fields.get(id).cloned()
    }

    /// Fields of a file ordered by begin position.
    pub fn fields_of_file(&self, file_id: &str) -> Vec<DataField> {
        let mut fields: Vec<DataField> = self
            .fields
            .values()
            .filter(|f| f.file_id == file_id)
            .cloned()
            .collect();
        fields.sort_by_key(|f| f.beg_position);
        fields
    }

    pub fn valid_data(&self, id: &str) -> Option<ValidData> {
        self.valid_data.get(id).cloned()
    }

    /// Valid values of a field ordered by sequence number.
    pub fn valid_data_of_field(&self, field_id: &str) -> Vec<ValidData> {
        let mut rows: Vec<ValidData> = self
            .valid_data
            .values()
            .filter(|v| v.field_id == field_id)
            .cloned()
            .collect();
        rows.sort_by_key(|v| v.seq_id);
        rows
    }

    /// Sub-structures of a field ordered by structure sequence number.
    pub fn structures_of_field(&self, field_id: &str) -> Vec<DataStructure> {
        let mut rows: Vec<DataStructure> = self
            .structures
            .values()
            .filter(|s| s.field_id == field_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.ds_id);
        rows
    }

    /// Applies one change, enforcing row existence and reference rules.
    ///
    /// On error the state is left unchanged.
    pub fn apply(&mut self, change: &Change) -> StoreResult<()> {
        match change {
            Change::InsertFile(file) => insert(&mut self.files, entity::DATA_FILE, &file.id, file),
            Change::UpdateFile(file) => update(&mut self.files, entity::DATA_FILE, &file.id, file),
            Change::DeleteFile { id } => {
                if self.fields.values().any(|f| &f.file_id == id) {
                    return Err(StoreError::Conflict(format!(
                        "{} '{}' still has fields",
                        entity::DATA_FILE,
                        id
                    )));
                }
                remove(&mut self.files, entity::DATA_FILE, id)
            }
            Change::InsertField(field) => {
                require(&self.files, entity::DATA_FILE, &field.file_id)?;
                insert(&mut self.fields, entity::DATA_FIELD, &field.id, field)
            }
            Change::UpdateField(field) => {
                update(&mut self.fields, entity::DATA_FIELD, &field.id, field)
            }
            Change::DeleteField { id } => {
                let referenced = self.valid_data.values().any(|v| &v.field_id == id)
                    || self.structures.values().any(|s| &s.field_id == id);
                if referenced {
                    return Err(StoreError::Conflict(format!(
                        "{} '{}' still has dependent rows",
                        entity::DATA_FIELD,
                        id
                    )));
                }
                remove(&mut self.fields, entity::DATA_FIELD, id)
            }
            Change::InsertValidData(row) => {
                require(&self.fields, entity::DATA_FIELD, &row.field_id)?;
                insert(&mut self.valid_data, entity::VALID_DATA, &row.id, row)
            }
            Change::UpdateValidData(row) => {
                update(&mut self.valid_data, entity::VALID_DATA, &row.id, row)
            }
            Change::DeleteValidData { id } => remove(&mut self.valid_data, entity::VALID_DATA, id),
            Change::DeleteValidDataOfField { field_id } => {
                self.valid_data.retain(|_, v| &v.field_id != field_id);
                Ok(())
            }
            Change::InsertStructure(row) => {
                require(&self.fields, entity::DATA_FIELD, &row.field_id)?;
                insert(&mut self.structures, entity::DATA_STRUCTURE, &row.id, row)
            }
            Change::DeleteStructuresOfField { field_id } => {
                self.structures.retain(|_, s| &s.field_id != field_id);
                Ok(())
            }
        }
    }
}

fn require<T>(rows: &BTreeMap<String, T>, entity: &'static str, id: &str) -> StoreResult<()> {
    if rows.contains_key(id) {
        Ok(())
    } else {
        Err(StoreError::NotFound {
            entity,
            id: id.to_string(),
        })
    }
}

fn insert<T: Clone>(
    rows: &mut BTreeMap<String, T>,
    entity: &'static str,
    id: &str,
    row: &T,
) -> StoreResult<()> {
    if rows.contains_key(id) {
        return Err(StoreError::Conflict(format!(
            "{} '{}' already exists",
            entity, id
        )));
    }
    rows.insert(id.to_string(), row.clone());
    Ok(())
}

fn update<T: Clone>(
    rows: &mut BTreeMap<String, T>,
    entity: &'static str,
    id: &str,
    row: &T,
) -> StoreResult<()> {
    match rows.get_mut(id) {
        Some(existing) => {
            *existing = row.clone();
            Ok(())
        }
        None => Err(StoreError::NotFound {
            entity,
            id: id.to_string(),
        }),
    }
}

fn remove<T>(rows: &mut BTreeMap<String, T>, entity: &'static str, id: &str) -> StoreResult<()> {
    rows.remove(id).map(|_| ()).ok_or_else(|| StoreError::NotFound {
        entity,
        id: id.to_string(),
    })
}
