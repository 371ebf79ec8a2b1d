//! Storage errors.

use thiserror::Error;

/// Errors produced by key/value storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed; the message carries backend detail.
    #[error("storage backend: {0}")]
    Backend(String),
}
