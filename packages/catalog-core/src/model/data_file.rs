//! Data file records and the read models built around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DataField, DataStructure, FieldSummary, ValidData};

/// A described record layout owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFile {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub file_location: Option<String>,
    /// Declared total size; not enforced against the field layout
    pub file_size: u64,
    pub doc_link: Option<String>,
    pub archive: bool,
    /// Username of the owner
    #[serde(rename = "userId")]
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File entry of the caller's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    #[serde(flatten)]
    pub file: DataFile,
    /// Fields ordered by begin position
    pub fields: Vec<FieldSummary>,
}

/// A field together with its dependent rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDetail {
    #[serde(flatten)]
    pub field: DataField,
    /// Ordered by sequence number
    pub valid_data: Vec<ValidData>,
    /// Ordered by structure sequence number
    pub data_structures: Vec<DataStructure>,
}

/// A file with its full, position-ordered field layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetail {
    #[serde(flatten)]
    pub file: DataFile,
    pub fields: Vec<FieldDetail>,
}

impl FileDetail {
    /// Iterates over the bare field rows in layout order.
    pub fn field_rows(&self) -> impl Iterator<Item = &DataField> {
        self.fields.iter().map(|d| &d.field)
    }
}
