//! Document records as held and returned by the ledger.

use serde::{Deserialize, Serialize};

use crate::digest::ContentDigest;
use crate::types::{Address, DocumentId, Iv, StorageLocator};

/// A registered document, as stored by the ledger.
///
/// `content_digest` and `iv` never change after registration. Encrypting
/// the same content again produces a new document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Ledger-assigned identifier.
    pub id: DocumentId,

    /// The registering principal.
    pub owner: Address,

    /// SHA-256 of the ciphertext.
    pub content_digest: ContentDigest,

    /// Where the ciphertext lives in external storage.
    pub storage_locator: StorageLocator,

    /// Cipher nonce as submitted by the owner.
    ///
    /// Raw bytes: the ledger stores whatever the owner sent.
    pub iv: Vec<u8>,

    /// Registration time (Unix seconds).
    pub created_at: u64,
}

impl Document {
    /// The public view returned by `getDocumentInfo`.
    pub fn record(&self) -> DocumentRecord {
        DocumentRecord {
            owner: self.owner,
            storage_locator: self.storage_locator.as_str().to_string(),
            iv: self.iv.clone(),
            created_at: self.created_at,
        }
    }
}

/// Raw `getDocumentInfo` result: `(owner, storageLocator, iv, createdAt)`.
///
/// Untrusted until passed through [`DocumentInfo::try_from`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub owner: Address,
    pub storage_locator: String,
    pub iv: Vec<u8>,
    pub created_at: u64,
}

/// A validated document view, safe to drive retrieval with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub owner: Address,
    pub locator: StorageLocator,
    pub iv: Iv,
    pub created_at: u64,
}
