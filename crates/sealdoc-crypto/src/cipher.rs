//! Symmetric content encryption.
//!
//! Documents are sealed with AES-256-GCM. The output is the ciphertext with
//! the 16-byte tag appended, which is the layout browsers produce through
//! WebCrypto, so blobs are interchangeable with existing clients.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use sealdoc_core::Iv;

use crate::error::{CryptoError, Result};

/// Content key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A per-document 256-bit content key. Zeroized on drop.
///
/// Held only in the owner's session. Never written to the ledger or to
/// storage in the clear.
#[derive(Clone)]
pub struct ContentKey([u8; KEY_LEN]);

impl ContentKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContentKey([REDACTED])")
    }
}

/// Ciphertext plus the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedContent {
    /// Ciphertext with the tag appended.
    pub ciphertext: Vec<u8>,

    /// Fresh nonce for this encryption.
    pub iv: Iv,
}

/// AES-256-GCM bound to one content key.
///
/// Every call to [`encrypt`](Self::encrypt) draws a fresh random nonce, so a
/// `(key, iv)` pair is never reused by this type.
pub struct ContentCipher {
    cipher: Aes256Gcm,
}

impl ContentCipher {
    /// Bind a cipher to the given key.
    pub fn new(key: &ContentKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.as_bytes().into()),
        }
    }

    /// Encrypt plaintext under a fresh nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SealedContent> {
        let iv = Iv::generate();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(iv.as_bytes()), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        Ok(SealedContent { ciphertext, iv })
    }

    /// Decrypt and authenticate.
    ///
    /// Fails with [`CryptoError::Integrity`] if the tag does not verify.
    /// Nothing is returned on failure.
    pub fn decrypt(&self, ciphertext: &[u8], iv: &Iv) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_LEN {
            return Err(CryptoError::Integrity);
        }

        self.cipher
            .decrypt(Nonce::from_slice(iv.as_bytes()), ciphertext)
            .map_err(|_| CryptoError::Integrity)
    }
}

/// Encrypt `plaintext` under `key` with a fresh nonce.
pub fn encrypt(key: &ContentKey, plaintext: &[u8]) -> Result<SealedContent> {
    ContentCipher::new(key).encrypt(plaintext)
}

/// Decrypt `ciphertext` sealed under `key` and `iv`.
pub fn decrypt(ciphertext: &[u8], key: &ContentKey, iv: &Iv) -> Result<Vec<u8>> {
    ContentCipher::new(key).decrypt(ciphertext, iv)
}
