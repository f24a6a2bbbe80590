//! Error types for the ledger module.

use sealdoc_core::{Address, DocumentId};
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// The first five variants are contract-level rejections: the call had no
/// effect on ledger state. The rest are backend failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller is not the owner of the document.
    #[error("{caller} is not the owner of document {document}")]
    NotOwner {
        document: DocumentId,
        caller: Address,
    },

    /// Document does not exist.
    #[error("document {0} not found")]
    NotFound(DocumentId),

    /// Caller holds no active grant.
    ///
    /// Returned identically for "never granted", "revoked" and "no such
    /// document" so the response leaks nothing about grant history.
    #[error("access denied")]
    AccessDenied,

    /// Registration rejected by the duplicate-content policy.
    #[error("content already registered by this owner as document {document}")]
    AlreadyExists { document: DocumentId },

    /// Malformed call arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Stored data could not be decoded.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Backend is unreachable or poisoned.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Unavailable(_) => true,
            LedgerError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
