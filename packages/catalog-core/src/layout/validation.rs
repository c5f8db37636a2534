//! Contiguity checks for a file's field layout.

use crate::error::LayoutError;
use crate::model::DataField;

/// Validates that `fields` partition `[1, n]` without gaps or overlaps and
/// that every span matches its declared size.
///
/// # Arguments
/// * `fields` - Fields of one file, in any order
///
/// # Returns
/// `Result<(), LayoutError>` naming the first violation found in position order.
pub fn check_contiguity(fields: &[DataField]) -> Result<(), LayoutError> {
    let mut ordered: Vec<&DataField> = fields.iter().collect();
    ordered.sort_by_key(|f| f.beg_position);

    for field in &ordered {
        let spanned = field
            .end_position
            .checked_sub(field.beg_position)
            .map(|d| d + 1);
        if spanned != Some(field.field_size) {
            return Err(LayoutError::SizeMismatch {
                field: field.field_name.clone(),
                beg: field.beg_position,
                end: field.end_position,
                size: field.field_size,
            });
        }
    }

    if let Some(first) = ordered.first() {
        if first.beg_position != 1 {
            return Err(LayoutError::MisalignedStart {
                field: first.field_name.clone(),
                beg: first.beg_position,
            });
        }
    }

    for pair in ordered.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        let expected = u64::from(before.end_position) + 1;
        let actual = u64::from(after.beg_position);
        if actual > expected {
            return Err(LayoutError::Gap {
                before: before.field_name.clone(),
                after: after.field_name.clone(),
                end: before.end_position,
                beg: after.beg_position,
            });
        }
        if actual < expected {
            return Err(LayoutError::Overlap {
                before: before.field_name.clone(),
                after: after.field_name.clone(),
                end: before.end_position,
                beg: after.beg_position,
            });
        }
    }

    Ok(())
}

/// Total number of positions covered by the layout, i.e. the greatest end
/// position (0 for a file without fields).
pub fn layout_length(fields: &[DataField]) -> u32 {
    fields.iter().map(|f| f.end_position).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::field;
    use ntest::timeout;

    #[timeout(1000)]
    #[test]
    fn test_contiguous_layout_passes() {
        let fields = vec![field("b", 11, 30), field("a", 1, 10), field("c", 31, 31)];
        assert_eq!(check_contiguity(&fields), Ok(()));
        assert_eq!(check_contiguity(&[]), Ok(()));
        assert_eq!(layout_length(&fields), 31);
    }

    #[timeout(1000)]
    #[test]
    fn test_gap_is_reported_by_name() {
        let fields = vec![field("a", 1, 10), field("c", 21, 30)];
        assert_eq!(
            check_contiguity(&fields),
            Err(LayoutError::Gap {
                before: "a".to_string(),
                after: "c".to_string(),
                end: 10,
                beg: 21,
            })
        );
    }

    #[timeout(1000)]
    #[test]
    fn test_overlap_is_reported() {
        let fields = vec![field("a", 1, 10), field("b", 10, 12)];
        assert!(matches!(
            check_contiguity(&fields),
            Err(LayoutError::Overlap { .. })
        ));
    }

    #[timeout(1000)]
    #[test]
    fn test_start_and_size_checks() {
        assert!(matches!(
            check_contiguity(&[field("a", 2, 5)]),
            Err(LayoutError::MisalignedStart { .. })
        ));

        let mut wrong_size = field("a", 1, 5);
        wrong_size.field_size = 4;
        assert!(matches!(
            check_contiguity(&[wrong_size]),
            Err(LayoutError::SizeMismatch { .. })
        ));
    }
}
