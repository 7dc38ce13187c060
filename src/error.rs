//! Typed errors for the store and mutation layers.
//!
//! The query engine itself has no error path: malformed sorters and
//! date bounds are dropped rather than reported.

use thiserror::Error;

/// Failures raised by a [`crate::store::RecordStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Another thread panicked while holding the collection lock.
    #[error("record store for {0} is poisoned")]
    Poisoned(&'static str),
}

/// Failures raised while applying a create/update/delete request.
#[derive(Error, Debug)]
pub enum MutationError {
    /// An update was issued without an `id`.
    #[error("{0}")]
    MissingId(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MutationError {
    /// Whether the failure is the caller's fault (HTTP 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, MutationError::MissingId(_))
    }
}
