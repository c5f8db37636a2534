//! Request shapes accepted by the coordinator and their validated forms.
//!
//! Every attribute is optional at this level so that a missing required
//! attribute is reported with the same message as an empty one.

use crate::error::CatalogError;
use crate::model::{DataField, DataFile, FieldType, ValidData};
use crate::validation::{field_size, non_negative, optional_text, required_text};

/// Attributes of a new data file.
#[derive(Debug, Clone, Default)]
pub struct NewDataFile {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub file_location: Option<String>,
    pub file_size: Option<i64>,
    pub doc_link: Option<String>,
    pub archive: Option<bool>,
}

/// Partial update of a data file; `Some` means "change this".
#[derive(Debug, Clone, Default)]
pub struct DataFilePatch {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub file_location: Option<String>,
    pub file_size: Option<i64>,
    pub doc_link: Option<String>,
    pub archive: Option<bool>,
}

/// Attributes of a new field.
#[derive(Debug, Clone, Default)]
pub struct NewField {
    pub field_name: Option<String>,
    pub field_size: Option<i64>,
    pub field_type: Option<String>,
    pub description: Option<String>,
    pub packed: Option<bool>,
    pub valid_data_notes: Option<String>,
    pub archive: Option<bool>,
}

/// Partial update of a field; `Some` means "change this".
#[derive(Debug, Clone, Default)]
pub struct FieldPatch {
    pub field_name: Option<String>,
    pub field_size: Option<i64>,
    pub field_type: Option<String>,
    pub description: Option<String>,
    pub packed: Option<bool>,
    pub valid_data_notes: Option<String>,
    pub archive: Option<bool>,
}

/// Attributes of a new valid value.
#[derive(Debug, Clone, Default)]
pub struct NewValidData {
    pub valid_data: Option<String>,
    pub valid_data_desc: Option<String>,
    pub archive: Option<bool>,
}

/// Partial update of a valid value.
#[derive(Debug, Clone, Default)]
pub struct ValidDataPatch {
    pub valid_data: Option<String>,
    pub valid_data_desc: Option<String>,
    pub archive: Option<bool>,
}

pub(crate) struct FileValues {
    pub short_name: String,
    pub long_name: String,
    pub file_location: String,
    pub file_size: u64,
    pub doc_link: Option<String>,
    pub archive: bool,
}

impl NewDataFile {
    pub(crate) fn validate(&self) -> Result<FileValues, CatalogError> {
        Ok(FileValues {
            short_name: required_text(self.short_name.as_deref().unwrap_or(""), "shortName")?,
            long_name: required_text(self.long_name.as_deref().unwrap_or(""), "longName")?,
            file_size: non_negative(required_number(self.file_size, "fileSize")?, "fileSize")?,
            file_location: required_text(
                self.file_location.as_deref().unwrap_or(""),
                "fileLocation",
            )?,
            doc_link: optional_text(self.doc_link.as_deref()),
            archive: self.archive.unwrap_or(false),
        })
    }
}

impl DataFilePatch {
    /// Validates present attributes and applies them to `file`.
    ///
    /// # Returns
    /// `Ok(None)` when the patch names no attribute at all.
    pub(crate) fn apply_to(&self, file: &DataFile) -> Result<Option<DataFile>, CatalogError> {
        let mut updated = file.clone();
        let mut touched = false;

        if let Some(v) = &self.short_name {
            updated.short_name = required_text(v, "shortName")?;
            touched = true;
        }
        if let Some(v) = &self.long_name {
            updated.long_name = required_text(v, "longName")?;
            touched = true;
        }
        if let Some(v) = self.file_size {
            updated.file_size = non_negative(v, "fileSize")?;
            touched = true;
        }
        if let Some(v) = &self.file_location {
            updated.file_location = optional_text(Some(v));
            touched = true;
        }
        if let Some(v) = &self.doc_link {
            updated.doc_link = optional_text(Some(v));
            touched = true;
        }
        if let Some(v) = self.archive {
            updated.archive = v;
            touched = true;
        }

        Ok(touched.then_some(updated))
    }
}

pub(crate) struct FieldValues {
    pub field_name: String,
    pub field_size: u32,
    pub field_type: FieldType,
    pub description: String,
    pub packed: bool,
    pub valid_data_notes: String,
    pub archive: bool,
}

impl NewField {
    pub(crate) fn validate(&self) -> Result<FieldValues, CatalogError> {
        Ok(FieldValues {
            field_name: required_text(self.field_name.as_deref().unwrap_or(""), "fieldName")?,
            field_size: field_size(required_number(self.field_size, "fieldSize")?, "fieldSize")?,
            field_type: FieldType::parse(self.field_type.as_deref().unwrap_or(""), "fieldType")?,
            description: optional_text(self.description.as_deref()).unwrap_or_default(),
            packed: self.packed.unwrap_or(false),
            valid_data_notes: optional_text(self.valid_data_notes.as_deref()).unwrap_or_default(),
            archive: self.archive.unwrap_or(false),
        })
    }
}

/// Validated field patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FieldChanges {
    pub field_name: Option<String>,
    pub field_size: Option<u32>,
    pub field_type: Option<FieldType>,
    pub description: Option<String>,
    pub packed: Option<bool>,
    pub valid_data_notes: Option<String>,
    pub archive: Option<bool>,
}

impl FieldPatch {
    pub(crate) fn validate(&self) -> Result<FieldChanges, CatalogError> {
        Ok(FieldChanges {
            field_name: self
                .field_name
                .as_deref()
                .map(|v| required_text(v, "fieldName"))
                .transpose()?,
            field_size: self
                .field_size
                .map(|v| field_size(v, "fieldSize"))
                .transpose()?,
            field_type: self
                .field_type
                .as_deref()
                .map(|v| FieldType::parse(v, "fieldType"))
                .transpose()?,
            description: self
                .description
                .as_deref()
                .map(|v| optional_text(Some(v)).unwrap_or_default()),
            packed: self.packed,
            valid_data_notes: self
                .valid_data_notes
                .as_deref()
                .map(|v| optional_text(Some(v)).unwrap_or_default()),
            archive: self.archive,
        })
    }
}

impl FieldChanges {
    pub(crate) fn is_empty(&self) -> bool {
        *self == FieldChanges::default()
    }

    /// Copies every attribute except positions onto `field`. The caller places
    /// the field when its size changes.
    pub(crate) fn apply_to(&self, field: &DataField) -> DataField {
        let mut updated = field.clone();
        if let Some(v) = &self.field_name {
            updated.field_name = v.clone();
        }
        if let Some(v) = self.field_size {
            updated.field_size = v;
        }
        if let Some(v) = self.field_type {
            updated.field_type = v;
        }
        if let Some(v) = &self.description {
            updated.description = v.clone();
        }
        if let Some(v) = self.packed {
            updated.packed = v;
        }
        if let Some(v) = &self.valid_data_notes {
            updated.valid_data_notes = v.clone();
        }
        if let Some(v) = self.archive {
            updated.archive = v;
        }
        updated
    }
}

pub(crate) struct ValidDataValues {
    pub valid_data: String,
    pub valid_data_desc: String,
    pub archive: bool,
}

impl NewValidData {
    pub(crate) fn validate(&self) -> Result<ValidDataValues, CatalogError> {
        Ok(ValidDataValues {
            valid_data: required_text(self.valid_data.as_deref().unwrap_or(""), "validData")?,
            valid_data_desc: required_text(
                self.valid_data_desc.as_deref().unwrap_or(""),
                "validDataDesc",
            )?,
            archive: self.archive.unwrap_or(false),
        })
    }
}

impl ValidDataPatch {
    /// Validates present attributes and applies them to `row`.
    ///
    /// # Returns
    /// `Ok(None)` when the patch names no attribute at all.
    pub(crate) fn apply_to(&self, row: &ValidData) -> Result<Option<ValidData>, CatalogError> {
        let mut updated = row.clone();
        let mut touched = false;
        if let Some(v) = &self.valid_data {
            updated.valid_data = required_text(v, "validData")?;
            touched = true;
        }
        if let Some(v) = &self.valid_data_desc {
            updated.valid_data_desc = required_text(v, "validDataDesc")?;
            touched = true;
        }
        if let Some(v) = self.archive {
            updated.archive = v;
            touched = true;
        }
        Ok(touched.then_some(updated))
    }
}

fn required_number(value: Option<i64>, attribute: &str) -> Result<i64, CatalogError> {
    value.ok_or_else(|| CatalogError::InvalidInput(format!("{} must be a valid number.", attribute)))
}
