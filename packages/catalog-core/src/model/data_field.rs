//! Field definition within a data file.

use serde::{Deserialize, Serialize};

use super::FieldType;
use crate::layout::Span;

/// Field definition within a data file.
///
/// Positions are 1-based and inclusive: a field of size 4 starting at 1
/// occupies positions 1 through 4.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    pub id: String,
    /// Parent data file
    pub file_id: String,
    pub field_name: String,
    /// Declared size, in the same unit as positions
    pub field_size: u32,
    /// First position occupied by the field
    pub beg_position: u32,
    /// Last position occupied by the field
    pub end_position: u32,
    pub field_type: FieldType,
    pub packed: bool,
    pub archive: bool,
    pub description: String,
    pub valid_data_notes: String,
}

impl DataField {
    /// Returns the positions currently occupied by this field.
    pub fn span(&self) -> Span {
        Span {
            beg: self.beg_position,
            end: self.end_position,
        }
    }

    /// Moves the field to `span`, leaving the declared size untouched.
    pub fn place(&mut self, span: Span) {
        self.beg_position = span.beg;
        self.end_position = span.end;
    }

    /// Short form used in file listings.
    pub fn summary(&self) -> FieldSummary {
        FieldSummary {
            id: self.id.clone(),
            field_name: self.field_name.clone(),
            file_id: self.file_id.clone(),
        }
    }
}

/// Field entry of a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub id: String,
    pub field_name: String,
    pub file_id: String,
}
