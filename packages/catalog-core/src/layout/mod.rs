//! Contiguous field layout: position allocation, shift planning, and
//! contiguity checks.
//!
//! All functions here are pure. They never touch a store; the coordinator
//! feeds them rows and applies what they return.

mod allocator;
mod shift;
mod validation;

use serde::Serialize;

pub use allocator::{allocate, last_field};
pub use shift::{plan_shift, FieldMove, ShiftPlan};
pub use validation::{check_contiguity, layout_length};

/// Inclusive, 1-based range of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub beg: u32,
    pub end: u32,
}
