//! Owner-side key custody.
//!
//! Content keys never leave the owner's process in the clear. An
//! [`OwnerSession`] holds them for the lifetime of the session: first staged
//! under the storage locator of a freshly uploaded ciphertext, then promoted
//! to the document ID the ledger assigns. Dropping the session zeroizes
//! every key it holds.

use std::collections::HashMap;

use sealdoc_core::{Address, DocumentId, StorageLocator};
use sealdoc_crypto::ContentKey;

use crate::error::{DocShareError, Result};

/// Content keys held by one owner, keyed by document.
#[derive(Default)]
pub struct ContentKeyStore {
    documents: HashMap<DocumentId, ContentKey>,
    /// Keys for ciphertext uploaded but not yet registered.
    staged: HashMap<StorageLocator, ContentKey>,
}

impl ContentKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `key` for an upload awaiting registration.
    pub fn stage(&mut self, locator: StorageLocator, key: ContentKey) {
        self.staged.insert(locator, key);
    }

    /// Get a staged key.
    pub fn staged(&self, locator: &StorageLocator) -> Option<&ContentKey> {
        self.staged.get(locator)
    }

    /// Move a staged key under its registered document ID.
    pub fn promote(&mut self, locator: &StorageLocator, id: DocumentId) -> Result<()> {
        let key = self
            .staged
            .remove(locator)
            .ok_or_else(|| DocShareError::NoStagedKey(locator.clone()))?;
        self.documents.insert(id, key);
        Ok(())
    }

    /// Drop a staged key.
    pub fn unstage(&mut self, locator: &StorageLocator) -> bool {
        self.staged.remove(locator).is_some()
    }

    /// Hold `key` for a registered document.
    pub fn insert(&mut self, id: DocumentId, key: ContentKey) {
        self.documents.insert(id, key);
    }

    /// Get the key for a document.
    ///
    /// Fails with `MissingContentKey` if the session never held it or has
    /// forgotten it. The ledger cannot supply it.
    pub fn get(&self, id: DocumentId) -> Result<&ContentKey> {
        self.documents
            .get(&id)
            .ok_or(DocShareError::MissingContentKey(id))
    }

    /// Whether the session holds the key for a document.
    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }

    /// Drop the key for a document.
    pub fn forget(&mut self, id: DocumentId) -> bool {
        self.documents.remove(&id).is_some()
    }

    /// Number of registered documents with a resident key.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no registered document has a resident key.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl std::fmt::Debug for ContentKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKeyStore")
            .field("documents", &self.documents.keys().collect::<Vec<_>>())
            .field("staged", &self.staged.len())
            .finish()
    }
}

/// A document owner's session: the owner's identity plus the content keys
/// created in this session.
#[derive(Debug)]
pub struct OwnerSession {
    address: Address,
    keys: ContentKeyStore,
}

impl OwnerSession {
    /// Start a session for `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            keys: ContentKeyStore::new(),
        }
    }

    /// The owner identity used as ledger caller.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the key store.
    pub fn keys(&self) -> &ContentKeyStore {
        &self.keys
    }

    /// Get the key store mutably.
    pub fn keys_mut(&mut self) -> &mut ContentKeyStore {
        &mut self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_promote() {
        let mut keys = ContentKeyStore::new();
        let locator = StorageLocator::from("b3:aa");
        let key = ContentKey::generate();
        let expected = *key.as_bytes();

        keys.stage(locator.clone(), key);
        assert!(keys.staged(&locator).is_some());
        assert!(keys.is_empty());

        keys.promote(&locator, DocumentId(4)).unwrap();
        assert_eq!(keys.get(DocumentId(4)).unwrap().as_bytes(), &expected);
        assert!(keys.staged(&locator).is_none());
        assert!(!keys.unstage(&locator));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let keys = ContentKeyStore::new();
        assert!(matches!(
            keys.get(DocumentId(1)),
            Err(DocShareError::MissingContentKey(DocumentId(1)))
        ));
    }

    #[test]
    fn test_promote_without_stage_fails() {
        let mut keys = ContentKeyStore::new();
        assert!(matches!(
            keys.promote(&StorageLocator::from("b3:bb"), DocumentId(1)),
            Err(DocShareError::NoStagedKey(_))
        ));
    }

    #[test]
    fn test_forget() {
        let mut session = OwnerSession::new(Address::from_bytes([1; 20]));
        session.keys_mut().insert(DocumentId(2), ContentKey::generate());
        assert!(session.keys().contains(DocumentId(2)));

        assert!(session.keys_mut().forget(DocumentId(2)));
        assert!(!session.keys().contains(DocumentId(2)));
    }

    #[test]
    fn test_debug_shows_no_key_bytes() {
        let mut session = OwnerSession::new(Address::from_bytes([1; 20]));
        session
            .keys_mut()
            .insert(DocumentId(1), ContentKey::from_bytes([0xAB; 32]));

        let debug = format!("{:?}", session);
        assert!(!debug.to_lowercase().contains("abab"));
        assert!(debug.contains("staged"));
    }
}
