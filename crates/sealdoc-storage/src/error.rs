//! Error types for the storage module.

use sealdoc_core::StorageLocator;
use thiserror::Error;

/// Errors that can occur talking to blob storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob is stored under the locator.
    #[error("blob not found: {0}")]
    NotFound(StorageLocator),

    /// The backend failed to carry out the request.
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    /// The backend did not answer in time.
    #[error("storage request timed out")]
    Timeout,
}

impl StorageError {
    /// Whether the request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transport(_) | StorageError::Timeout)
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
