//! Shift planning for resized fields.

use super::Span;
use crate::error::LayoutError;
use crate::model::DataField;

/// New position of one field that follows a resized field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMove {
    pub field_id: String,
    pub from: Span,
    pub to: Span,
}

/// Outcome of resizing one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPlan {
    /// New span of the resized field (its begin position is unchanged)
    pub target: Span,
    /// `new_size - old_size`
    pub delta: i64,
    /// Every field beginning after the resized one, ascending by begin position
    pub moves: Vec<FieldMove>,
}

impl ShiftPlan {
    /// Returns true if no other field has to move.
    pub fn is_local(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Plans the layout change caused by resizing `target` to `new_size`.
///
/// # Arguments
/// * `target` - The field being resized, with its current positions
/// * `new_size` - Requested size; must differ from the current size
/// * `siblings` - Fields of the same file; may include `target` itself
///
/// # Returns
/// `Result<ShiftPlan, LayoutError>` describing every position change.
pub fn plan_shift(
    target: &DataField,
    new_size: u32,
    siblings: &[DataField],
) -> Result<ShiftPlan, LayoutError> {
    if new_size == 0 {
        return Err(LayoutError::ZeroSize);
    }
    if new_size == target.field_size {
        return Err(LayoutError::UnchangedSize {
            field: target.field_name.clone(),
            size: new_size,
        });
    }

    let target_end = target
        .beg_position
        .checked_add(new_size - 1)
        .ok_or(LayoutError::Overflow {
            operation: "resized field end position",
        })?;
    let delta = i64::from(new_size) - i64::from(target.field_size);

    let mut subsequent: Vec<&DataField> = siblings
        .iter()
        .filter(|f| f.id != target.id && f.beg_position > target.beg_position)
        .collect();
    subsequent.sort_by_key(|f| f.beg_position);

    let moves = subsequent
        .into_iter()
        .map(|f| {
            Ok(FieldMove {
                field_id: f.id.clone(),
                from: f.span(),
                to: Span {
                    beg: shifted(f, f.beg_position, delta)?,
                    end: shifted(f, f.end_position, delta)?,
                },
            })
        })
        .collect::<Result<Vec<_>, LayoutError>>()?;

    Ok(ShiftPlan {
        target: Span {
            beg: target.beg_position,
            end: target_end,
        },
        delta,
        moves,
    })
}

fn shifted(field: &DataField, position: u32, delta: i64) -> Result<u32, LayoutError> {
    let moved = i64::from(position) + delta;
    if moved < 1 {
        return Err(LayoutError::BeforeStart {
            field: field.field_name.clone(),
            delta,
        });
    }
    u32::try_from(moved).map_err(|_| LayoutError::Overflow {
        operation: "field shift",
    })
}
