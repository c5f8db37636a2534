use crate::model::{DataField, DataFile, DataStructure, ValidData};

/// Represents a single row-level change staged in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Insert a new data file
    InsertFile(DataFile),
    /// Replace an existing data file
    UpdateFile(DataFile),
    /// Delete a data file; fails while fields still reference it
    DeleteFile { id: String },
    /// Insert a new field; the parent file must exist
    InsertField(DataField),
    /// Replace an existing field
    UpdateField(DataField),
    /// Delete a field; fails while valid data or structures reference it
    DeleteField { id: String },
    /// Insert a valid value; the parent field must exist
    InsertValidData(ValidData),
    /// Replace an existing valid value
    UpdateValidData(ValidData),
    /// Delete one valid value
    DeleteValidData { id: String },
    /// Delete every valid value of a field
    DeleteValidDataOfField { field_id: String },
    /// Insert a sub-structure; the parent field must exist
    InsertStructure(DataStructure),
    /// Delete every sub-structure of a field
    DeleteStructuresOfField { field_id: String },
}

impl Change {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Change::InsertFile(_) => "insert_file",
            Change::UpdateFile(_) => "update_file",
            Change::DeleteFile { .. } => "delete_file",
            Change::InsertField(_) => "insert_field",
            Change::UpdateField(_) => "update_field",
            Change::DeleteField { .. } => "delete_field",
            Change::InsertValidData(_) => "insert_valid_data",
            Change::UpdateValidData(_) => "update_valid_data",
            Change::DeleteValidData { .. } => "delete_valid_data",
            Change::DeleteValidDataOfField { .. } => "delete_valid_data_of_field",
            Change::InsertStructure(_) => "insert_structure",
            Change::DeleteStructuresOfField { .. } => "delete_structures_of_field",
        }
    }
}
