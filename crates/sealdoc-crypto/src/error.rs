//! Error types for the crypto module.

use thiserror::Error;

/// Errors from content encryption and key wrapping.
///
/// These are always fatal to the current flow. Callers must not retry
/// with different parameters.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Authentication tag did not verify: corrupted ciphertext, wrong key or
    /// wrong iv. No plaintext is returned.
    #[error("integrity check failed")]
    Integrity,

    /// The wrapped key could not be recovered with this private key.
    ///
    /// Deliberately carries no detail about which check failed.
    #[error("key unwrap failed")]
    KeyUnwrap,

    /// Key container could not be parsed, or the key is not usable for
    /// RSA-OAEP key wrapping.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Encryption could not be performed.
    #[error("encryption error: {0}")]
    Encryption(String),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
