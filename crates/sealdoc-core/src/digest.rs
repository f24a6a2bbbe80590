//! Content digests for integrity verification.
//!
//! The digest committed to the ledger is always computed over the
//! ciphertext. A match proves the stored blob is the one that was
//! registered; it says nothing about the plaintext on its own.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::CoreError;

/// Length of a content digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte SHA-256 digest of document ciphertext.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; DIGEST_LEN]);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Check whether `candidate` hashes to this digest.
    ///
    /// Exact byte equality over the full digest. Constant time is not
    /// needed: the digest is public.
    pub fn verify(&self, candidate: &[u8]) -> bool {
        Self::compute(candidate) == *self
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex, the form clients put on the ledger.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        let arr: [u8; DIGEST_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CoreError::InvalidLength {
                    what: "digest",
                    expected: DIGEST_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    /// The zero digest (sentinel value).
    pub const ZERO: Self = Self([0u8; DIGEST_LEN]);
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", &hex::encode(self.0)[..16])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for ContentDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for ContentDigest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_answer() {
        let digest = ContentDigest::compute(b"abc");
        assert_eq!(
            digest.to_hex(),
            "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_exact_match() {
        let data = b"ten bytes!";
        let digest = ContentDigest::compute(data);
        assert!(digest.verify(data));
        assert!(!digest.verify(b"ten bytes?"));
        assert!(!digest.verify(b""));
    }

    #[test]
    fn test_hex_roundtrip() {
        let digest = ContentDigest::compute(b"roundtrip");
        let parsed = ContentDigest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(parsed, digest);
    }

    #[test]
    fn test_from_hex_rejects_truncation() {
        let digest = ContentDigest::compute(b"x");
        let truncated = &digest.to_hex()[..40];
        assert!(ContentDigest::from_hex(truncated).is_err());
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(ContentDigest::compute(&data), ContentDigest::compute(&data));
            prop_assert!(ContentDigest::compute(&data).verify(&data));
        }

        #[test]
        fn appended_byte_changes_digest(
            data in prop::collection::vec(any::<u8>(), 0..256),
            extra in any::<u8>(),
        ) {
            let mut longer = data.clone();
            longer.push(extra);
            prop_assert!(!ContentDigest::compute(&data).verify(&longer));
        }
    }
}
