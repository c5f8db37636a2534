//! Data file catalog core.
//!
//! Keeps each data file's fields laid out contiguously: new fields are
//! appended after the last one, resizing a field shifts every later field in
//! one atomic transaction, and deletes cascade to dependent rows.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod layout;
pub mod model;
pub mod ownership;
pub mod store;
pub mod validation;

pub use coordinator::Catalog;
pub use error::{CatalogError, LayoutError, StoreError};
