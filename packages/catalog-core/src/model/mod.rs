//! Catalog records: data files, their fields, valid values and sub-structures.

mod data_field;
mod data_file;
mod field_type;
mod valid_data;

pub use data_field::{DataField, FieldSummary};
pub use data_file::{DataFile, FileDetail, FileSummary, FieldDetail};
pub use field_type::FieldType;
pub use valid_data::{DataStructure, ValidData};

/// Entity names used in error messages and logs.
pub mod entity {
    pub const DATA_FILE: &str = "DataFile";
    pub const DATA_FIELD: &str = "DataField";
    pub const VALID_DATA: &str = "ValidData";
    pub const DATA_STRUCTURE: &str = "DataStructure";
}

/// Generates a new record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
