//! Ownership decisions for catalog mutations.

use async_trait::async_trait;

use crate::model::DataFile;

/// Decides whether a caller may change a data file and everything it owns.
///
/// The coordinator trusts the answer and does not re-derive it.
#[async_trait]
pub trait OwnershipPolicy: Send + Sync {
    async fn may_modify(&self, caller: &str, file: &DataFile) -> bool;
}

/// Only the user recorded as the file's owner may modify it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

#[async_trait]
impl OwnershipPolicy for OwnerOnly {
    async fn may_modify(&self, caller: &str, file: &DataFile) -> bool {
        !caller.is_empty() && file.owner == caller
    }
}
