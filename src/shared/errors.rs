use crate::store::StoreError;
use thiserror::Error;

/// Why a write was dropped before reaching the store.
///
/// Dropped writes are part of the sync contract: they are logged and reported
/// through the returned `Result`, but nothing escalates past the call site and
/// the cache is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DropReason {
    #[error("no signed-in user")]
    NoPrincipal,
    #[error("entity is missing from the cache or owned by another user")]
    NotOwned,
}

/// Outcome of a failed create/update/remove call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    #[error("write dropped: {0}")]
    Dropped(#[from] DropReason),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WriteError {
    /// True when the write never reached the store.
    pub fn is_dropped(&self) -> bool {
        matches!(self, WriteError::Dropped(_))
    }
}
