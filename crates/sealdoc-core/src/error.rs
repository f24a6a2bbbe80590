//! Error types for sealdoc core.

use thiserror::Error;

/// Errors constructing core primitives from raw input.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {what} length: expected {expected}, got {got}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Validation errors for records returned by the ledger.
///
/// Raised at the boundary when a ledger response does not have the shape
/// the protocol relies on. A malformed response is never partially used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document owner is the zero address")]
    ZeroOwner,

    #[error("storage locator is empty")]
    EmptyLocator,

    #[error("iv must be {expected} bytes, got {got}")]
    IvLength { expected: usize, got: usize },

    #[error("created_at timestamp is zero")]
    MissingTimestamp,

    #[error("wrapped key is empty")]
    EmptyWrappedKey,
}
