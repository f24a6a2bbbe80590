//! Uploaded-but-unregistered state.
//!
//! If the ledger write fails after the ciphertext upload succeeded, the flow
//! hands back a [`PendingRegistration`]. It carries everything the ledger
//! call needs, so registration can be re-driven without re-uploading. It
//! carries no key material and may be persisted as-is.

use serde::{Deserialize, Serialize};

use sealdoc_core::{ContentDigest, Iv, StorageLocator};

use crate::error::{DocShareError, Result};

/// A ciphertext in storage that the ledger does not know about yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    /// SHA-256 of the uploaded ciphertext.
    pub digest: ContentDigest,

    /// Where the ciphertext was uploaded.
    pub locator: StorageLocator,

    /// Nonce the ciphertext was sealed under.
    pub iv: Iv,
}

impl PendingRegistration {
    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| DocShareError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| DocShareError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cbor_roundtrip() {
        let pending = PendingRegistration {
            digest: ContentDigest::compute(b"ciphertext"),
            locator: StorageLocator::from("b3:1234"),
            iv: Iv::from_bytes([5; 12]),
        };

        let bytes = pending.to_bytes().unwrap();
        assert_eq!(PendingRegistration::from_bytes(&bytes).unwrap(), pending);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            PendingRegistration::from_bytes(&[0xff, 0x00, 0x13]),
            Err(DocShareError::Serialization(_))
        ));
    }
}
