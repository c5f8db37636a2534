//! Catalog error types.

use thiserror::Error;

/// Errors surfaced to callers of the catalog.
///
/// These are the only kinds the record API layer needs to distinguish.
/// Persistence details never travel inside them; they are logged where the
/// failure is detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Malformed or out-of-range request data
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced record does not exist
    #[error("{entity} with ID {id} not found.")]
    NotFound { entity: &'static str, id: String },

    /// Caller is not the owner of the resource
    #[error("{0}")]
    Forbidden(String),

    /// An atomic write could not complete and was rolled back
    #[error("Could not complete {operation}.")]
    TransactionFailure { operation: &'static str },
}

impl CatalogError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CatalogError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Persistence errors reported by a [`crate::store::CatalogStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Row addressed by an update or delete does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Write would break a uniqueness or reference rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transaction was already committed or rolled back
    #[error("Transaction closed: {0}")]
    TransactionClosed(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    Io(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIo(String),

    /// Persisted data failed validation
    #[error("Data corruption detected: {0}")]
    Corrupt(String),
}

/// Errors from the pure layout calculations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Field sizes must be at least one byte
    #[error("fieldSize must be at least 1.")]
    ZeroSize,

    /// Shift requested for a size that did not change
    #[error("Field '{field}' already has size {size}")]
    UnchangedSize { field: String, size: u32 },

    /// A shift would move a field before position 1
    #[error("Shifting field '{field}' by {delta} would move it before position 1")]
    BeforeStart { field: String, delta: i64 },

    /// Position arithmetic left the representable range
    #[error("Position overflow during {operation}")]
    Overflow { operation: &'static str },

    /// First field of a layout does not begin at position 1
    #[error("Field '{field}' begins at {beg}, expected 1")]
    MisalignedStart { field: String, beg: u32 },

    /// Recorded size disagrees with the recorded span
    #[error("Field '{field}' spans {beg}-{end} but declares size {size}")]
    SizeMismatch {
        field: String,
        beg: u32,
        end: u32,
        size: u32,
    },

    /// Two adjacent fields leave unused positions between them
    #[error("Gap between field '{before}' (ends {end}) and '{after}' (begins {beg})")]
    Gap {
        before: String,
        after: String,
        end: u32,
        beg: u32,
    },

    /// Two adjacent fields claim the same positions
    #[error("Field '{before}' (ends {end}) overlaps '{after}' (begins {beg})")]
    Overlap {
        before: String,
        after: String,
        end: u32,
        beg: u32,
    },
}

impl From<LayoutError> for CatalogError {
    fn from(err: LayoutError) -> Self {
        CatalogError::InvalidInput(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
