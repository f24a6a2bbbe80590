//! Ledger trait: the contract surface of the access ledger.
//!
//! This trait allows the protocol to be backend-agnostic. Implementations
//! include SQLite (persistent) and in-memory (for tests). A client for a
//! deployed contract implements the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use sealdoc_core::{
    Address, ContentDigest, DocumentId, DocumentRecord, GrantEvent, StorageLocator, WrappedKey,
};

use crate::error::Result;

/// The Ledger trait: async interface to the authoritative access ledger.
///
/// `caller` is the authenticated identity of the transaction sender. The
/// ledger trusts it; authenticating it is the identity provider's job.
///
/// # Design Notes
///
/// - **Atomic per call**: a rejected call leaves no trace in ledger state.
/// - **Ordered**: calls are applied in one total order; for concurrent
///   grants to the same recipient the last applied wins.
/// - **No deletes**: documents and grant records are never removed.
#[async_trait]
pub trait Ledger: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Mutations (owner-signed)
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a document. The caller becomes its owner.
    ///
    /// `iv` is stored verbatim.
    async fn register_document(
        &self,
        caller: Address,
        digest: ContentDigest,
        locator: &StorageLocator,
        iv: &[u8],
    ) -> Result<DocumentId>;

    /// Grant (`grant = true`) or revoke (`grant = false`) a recipient's access.
    ///
    /// # Errors
    /// - `NotFound` if the document does not exist.
    /// - `NotOwner` if `caller` is not the document owner.
    /// - `InvalidArgument` if granting with an empty `wrapped_key`.
    async fn share_access(
        &self,
        caller: Address,
        id: DocumentId,
        recipient: Address,
        grant: bool,
        wrapped_key: &[u8],
    ) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Gated read
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the wrapped key stored for `caller`.
    ///
    /// Fails with `AccessDenied` unless `caller` currently holds a grant.
    async fn get_encrypted_key(&self, id: DocumentId, caller: Address) -> Result<WrappedKey>;

    // ─────────────────────────────────────────────────────────────────────────
    // Public reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the public document record.
    async fn get_document_info(&self, id: DocumentId) -> Result<DocumentRecord>;

    /// Compare `candidate` with the stored content digest.
    async fn verify_integrity(&self, id: DocumentId, candidate: &ContentDigest) -> Result<bool>;

    /// Whether `user` currently holds a grant for the document.
    async fn has_access(&self, id: DocumentId, user: Address) -> Result<bool>;

    /// Every grant and revoke applied to `(id, recipient)`, oldest first.
    async fn grant_history(&self, id: DocumentId, recipient: Address) -> Result<Vec<GrantEvent>>;

    /// Number of registered documents.
    async fn document_count(&self) -> Result<u64>;
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    async fn register_document(
        &self,
        caller: Address,
        digest: ContentDigest,
        locator: &StorageLocator,
        iv: &[u8],
    ) -> Result<DocumentId> {
        (**self).register_document(caller, digest, locator, iv).await
    }

    async fn share_access(
        &self,
        caller: Address,
        id: DocumentId,
        recipient: Address,
        grant: bool,
        wrapped_key: &[u8],
    ) -> Result<()> {
        (**self)
            .share_access(caller, id, recipient, grant, wrapped_key)
            .await
    }

    async fn get_encrypted_key(&self, id: DocumentId, caller: Address) -> Result<WrappedKey> {
        (**self).get_encrypted_key(id, caller).await
    }

    async fn get_document_info(&self, id: DocumentId) -> Result<DocumentRecord> {
        (**self).get_document_info(id).await
    }

    async fn verify_integrity(&self, id: DocumentId, candidate: &ContentDigest) -> Result<bool> {
        (**self).verify_integrity(id, candidate).await
    }

    async fn has_access(&self, id: DocumentId, user: Address) -> Result<bool> {
        (**self).has_access(id, user).await
    }

    async fn grant_history(&self, id: DocumentId, recipient: Address) -> Result<Vec<GrantEvent>> {
        (**self).grant_history(id, recipient).await
    }

    async fn document_count(&self) -> Result<u64> {
        (**self).document_count().await
    }
}
