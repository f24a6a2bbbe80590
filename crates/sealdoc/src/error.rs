//! Error types for the document protocol.

use std::time::Duration;

use sealdoc_core::{DocumentId, StorageLocator, ValidationError};
use sealdoc_crypto::CryptoError;
use sealdoc_ledger::LedgerError;
use sealdoc_storage::StorageError;
use thiserror::Error;

use crate::pending::PendingRegistration;

/// Errors that can occur during protocol flows.
#[derive(Debug, Error)]
pub enum DocShareError {
    /// The ledger rejected or failed the call.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Upload or fetch failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Key parsing or encryption failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Stored ciphertext failed the ledger digest check or the AEAD tag.
    #[error("integrity check failed for document {0}")]
    Integrity(DocumentId),

    /// The wrapped key could not be opened with the caller's private key.
    #[error("could not unwrap the content key for document {0}")]
    KeyUnwrap(DocumentId),

    /// The ledger returned a record the protocol cannot use.
    #[error("malformed ledger response: {0}")]
    Protocol(#[from] ValidationError),

    /// Ciphertext is in storage but the ledger write did not happen.
    ///
    /// Recoverable: pass `pending` to `resume_registration`.
    #[error("ciphertext uploaded to {} but not registered: {source}", .pending.locator)]
    UploadedNotRegistered {
        pending: PendingRegistration,
        #[source]
        source: Box<DocShareError>,
    },

    /// The owner session no longer holds the content key for this document.
    #[error("no content key in session for document {0}")]
    MissingContentKey(DocumentId),

    /// No content key is staged for this upload.
    #[error("no staged content key for {0}")]
    NoStagedKey(StorageLocator),

    /// A network step exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Pending registration could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DocShareError {
    /// Whether the same call may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            DocShareError::Ledger(e) => e.is_transient(),
            DocShareError::Storage(e) => e.is_retryable(),
            DocShareError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Whether the flow left resumable state behind.
    pub fn is_resumable(&self) -> bool {
        matches!(self, DocShareError::UploadedNotRegistered { .. })
    }

    /// Short text suitable for showing to an end user.
    ///
    /// Never includes key material or ledger internals.
    pub fn user_message(&self) -> String {
        match self {
            DocShareError::Ledger(LedgerError::NotOwner { document, .. }) => {
                format!("Only the owner of document {} can change who has access.", document)
            }
            DocShareError::Ledger(LedgerError::NotFound(id)) => {
                format!("Document {} does not exist.", id)
            }
            DocShareError::Ledger(LedgerError::AccessDenied) => {
                "You do not have access to this document.".to_string()
            }
            DocShareError::Ledger(LedgerError::AlreadyExists { document }) => {
                format!("This file is already registered as document {}.", document)
            }
            DocShareError::Ledger(_) => "The access ledger could not be reached.".to_string(),
            DocShareError::Storage(StorageError::NotFound(_)) => {
                "The encrypted file is missing from storage.".to_string()
            }
            DocShareError::Storage(_) => "The storage service could not be reached.".to_string(),
            DocShareError::Crypto(CryptoError::InvalidKey(_)) => {
                "The key provided is not a valid RSA-OAEP key.".to_string()
            }
            DocShareError::Crypto(_) => "Encryption failed.".to_string(),
            DocShareError::Integrity(id) => format!(
                "Document {} is corrupted or was tampered with in storage.",
                id
            ),
            DocShareError::KeyUnwrap(id) => format!(
                "Your key cannot open document {}. It may have been shared with a different key.",
                id
            ),
            DocShareError::Protocol(_) => "The access ledger returned an invalid record.".to_string(),
            DocShareError::UploadedNotRegistered { .. } => {
                "The file was uploaded but not registered. Retry registration to finish.".to_string()
            }
            DocShareError::MissingContentKey(id) => format!(
                "The key for document {} is no longer in this session. Re-share it from a session that holds it.",
                id
            ),
            DocShareError::NoStagedKey(_) => {
                "The key for this upload is no longer in this session.".to_string()
            }
            DocShareError::Timeout { .. } => "The request timed out. Try again.".to_string(),
            DocShareError::Serialization(_) => "Saved registration state is unreadable.".to_string(),
        }
    }
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, DocShareError>;
