//! Position allocation for appended fields.

use super::Span;
use crate::error::LayoutError;
use crate::model::DataField;

/// Returns the field with the greatest end position, if any.
pub fn last_field(fields: &[DataField]) -> Option<&DataField> {
    fields.iter().max_by_key(|f| f.end_position)
}

/// Computes the span of a new field appended after `last`.
///
/// # Arguments
/// * `last` - Field with the greatest end position, or `None` for an empty file
/// * `size` - Declared size of the new field
///
/// # Returns
/// `Result<Span, LayoutError>` with the positions the new field occupies.
pub fn allocate(last: Option<&DataField>, size: u32) -> Result<Span, LayoutError> {
    if size == 0 {
        return Err(LayoutError::ZeroSize);
    }

    let beg = match last {
        Some(field) => field
            .end_position
            .checked_add(1)
            .ok_or(LayoutError::Overflow {
                operation: "begin position allocation",
            })?,
        None => 1,
    };
    let end = beg
        .checked_add(size - 1)
        .ok_or(LayoutError::Overflow {
            operation: "end position allocation",
        })?;

    Ok(Span { beg, end })
}
