//! Validators for request attributes.
//!
//! Inputs arrive already coerced to their JSON shapes by the record API
//! layer; these functions enforce content rules and produce
//! `CatalogError::InvalidInput` messages naming the attribute.

use crate::error::CatalogError;

/// Requires a string with at least one non-whitespace character. Returns it
/// trimmed.
pub fn required_text(value: &str, attribute: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidInput(format!(
            "{} must be a string with at least 1 character(s).",
            attribute
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional string; empty strings count as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Requires a field size of at least 1 that fits a position.
pub fn field_size(value: i64, attribute: &str) -> Result<u32, CatalogError> {
    if value < 1 {
        return Err(CatalogError::InvalidInput(format!(
            "{} must be at least 1.",
            attribute
        )));
    }
    u32::try_from(value).map_err(|_| {
        CatalogError::InvalidInput(format!(
            "{} must be no more than {}.",
            attribute,
            u32::MAX
        ))
    })
}

/// Requires a non-negative size.
pub fn non_negative(value: i64, attribute: &str) -> Result<u64, CatalogError> {
    u64::try_from(value)
        .map_err(|_| CatalogError::InvalidInput(format!("{} must be at least 0.", attribute)))
}

/// Rejects identifiers that cannot be valid before touching the store.
pub fn record_id(id: &str, entity: &str, min_len: usize) -> Result<(), CatalogError> {
    if id.trim().len() < min_len {
        return Err(CatalogError::InvalidInput(format!(
            "Invalid {} ID format.",
            entity
        )));
    }
    Ok(())
}
