//! Strong type definitions for sealdoc.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Length of the symmetric cipher nonce in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Length of a principal address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Ledger-assigned document identifier.
///
/// Allocated by the ledger starting at 1 and increasing by one per
/// registration. Zero is never a valid document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// The first id a ledger hands out.
    pub const FIRST: Self = Self(1);

    /// Get the raw value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The id allocated after this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for DocumentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A 20-byte principal address, as bound to a ledger transaction signature.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The zero address. Never the owner of a registered document.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; ADDRESS_LEN] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            what: "address",
            expected: ADDRESS_LEN,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

/// Opaque pointer to a ciphertext blob in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLocator(String);

impl StorageLocator {
    /// Wrap a locator string.
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Get the locator as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the locator is empty (never valid for a stored blob).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageLocator {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StorageLocator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A 96-bit nonce for the content cipher.
///
/// Not secret. Stored on the ledger next to the content digest and unique
/// per document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Iv(pub [u8; IV_LEN]);

impl Iv {
    /// Generate a fresh nonce from the OS-seeded CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Iv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iv({})", self.to_hex())
    }
}

impl TryFrom<&[u8]> for Iv {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; IV_LEN] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            what: "iv",
            expected: IV_LEN,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

/// A content key encrypted under one recipient's public key.
///
/// Opaque to the ledger; only the recipient's private key recovers the
/// content key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    /// Wrap raw ciphertext bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length of the wrapped key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no bytes are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WrappedKey({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for WrappedKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for WrappedKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address::from_bytes([0x42; ADDRESS_LEN]);
        let hex = addr.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(Address::from_hex(&hex).unwrap(), addr);
        assert_eq!(Address::from_hex(&hex[2..]).unwrap(), addr);
    }

    #[test]
    fn test_address_wrong_length() {
        let err = Address::from_hex("0xabcd").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidLength { what: "address", expected: 20, got: 2 }
        ));
    }

    #[test]
    fn test_iv_generate_is_fresh() {
        let a = Iv::generate();
        let b = Iv::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_iv_rejects_wrong_length() {
        // 16-byte IVs were used by early clients; the cipher only accepts 12.
        assert!(Iv::try_from(&b"1234567890123456"[..]).is_err());
        assert!(Iv::try_from(&[7u8; IV_LEN][..]).is_ok());
    }

    #[test]
    fn test_document_id_ordering() {
        assert_eq!(DocumentId::FIRST.next(), DocumentId(2));
        assert!(DocumentId(1) < DocumentId(2));
        assert_eq!(format!("{}", DocumentId(7)), "#7");
    }

    #[test]
    fn test_wrapped_key_debug_hides_bytes() {
        let key = WrappedKey::new(vec![0xde, 0xad]);
        assert_eq!(format!("{:?}", key), "WrappedKey(2 bytes)");
    }
}
