//! In-memory implementation of the Ledger trait.
//!
//! Same semantics as SQLite but keeps everything in memory with no
//! persistence. Used by tests and local demos.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use sealdoc_core::{
    Address, ContentDigest, DocumentId, DocumentRecord, GrantEvent, StorageLocator, WrappedKey,
};

use crate::error::{LedgerError, Result};
use crate::state::{now_secs, LedgerPolicy, LedgerState, ShareOutcome};
use crate::traits::Ledger;

/// In-memory ledger implementation.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock; the
/// write lock gives the total order of mutations.
pub struct MemoryLedger {
    inner: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create a new empty ledger with the default policy.
    pub fn new() -> Self {
        Self::with_policy(LedgerPolicy::default())
    }

    /// Create a new empty ledger with the given policy.
    pub fn with_policy(policy: LedgerPolicy) -> Self {
        Self {
            inner: RwLock::new(LedgerState::new(policy)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>> {
        self.inner
            .read()
            .map_err(|e| LedgerError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn register_document(
        &self,
        caller: Address,
        digest: ContentDigest,
        locator: &StorageLocator,
        iv: &[u8],
    ) -> Result<DocumentId> {
        let id = self
            .write()?
            .register(caller, digest, locator, iv, now_secs())?;

        tracing::info!(document = %id, owner = %caller, %digest, "document registered");
        Ok(id)
    }

    async fn share_access(
        &self,
        caller: Address,
        id: DocumentId,
        recipient: Address,
        grant: bool,
        wrapped_key: &[u8],
    ) -> Result<()> {
        let outcome = self
            .write()?
            .share(caller, id, recipient, grant, wrapped_key, now_secs())?;

        match outcome {
            ShareOutcome::Applied(event) => {
                tracing::info!(document = %id, %recipient, granted = grant, seq = event.seq, "access updated");
            }
            ShareOutcome::Unchanged => {
                tracing::debug!(document = %id, %recipient, "revoke without grant ignored");
            }
        }
        Ok(())
    }

    async fn get_encrypted_key(&self, id: DocumentId, caller: Address) -> Result<WrappedKey> {
        self.read()?.encrypted_key(id, caller)
    }

    async fn get_document_info(&self, id: DocumentId) -> Result<DocumentRecord> {
        self.read()?.document_info(id)
    }

    async fn verify_integrity(&self, id: DocumentId, candidate: &ContentDigest) -> Result<bool> {
        self.read()?.verify_integrity(id, candidate)
    }

    async fn has_access(&self, id: DocumentId, user: Address) -> Result<bool> {
        Ok(self.read()?.has_access(id, user))
    }

    async fn grant_history(&self, id: DocumentId, recipient: Address) -> Result<Vec<GrantEvent>> {
        Ok(self.read()?.grant_history(id, recipient))
    }

    async fn document_count(&self) -> Result<u64> {
        Ok(self.read()?.document_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const OWNER: Address = Address([0x11; 20]);
    const BOB: Address = Address([0x22; 20]);

    #[tokio::test]
    async fn test_memory_ledger_basic() {
        let ledger = MemoryLedger::new();
        let digest = ContentDigest::compute(b"ciphertext");

        let id = ledger
            .register_document(OWNER, digest, &StorageLocator::from("b3:aa"), &[0u8; 12])
            .await
            .unwrap();
        assert_eq!(id, DocumentId(1));

        let record = ledger.get_document_info(id).await.unwrap();
        assert_eq!(record.owner, OWNER);
        assert!(record.created_at > 0);
        assert!(ledger.verify_integrity(id, &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_ledger_grant_cycle() {
        let ledger = MemoryLedger::new();
        let id = ledger
            .register_document(
                OWNER,
                ContentDigest::compute(b"x"),
                &StorageLocator::from("b3:bb"),
                &[0u8; 12],
            )
            .await
            .unwrap();

        assert!(!ledger.has_access(id, BOB).await.unwrap());
        ledger.share_access(OWNER, id, BOB, true, b"W1").await.unwrap();
        assert!(ledger.has_access(id, BOB).await.unwrap());
        assert_eq!(
            ledger.get_encrypted_key(id, BOB).await.unwrap().as_bytes(),
            b"W1"
        );

        ledger.share_access(OWNER, id, BOB, false, b"").await.unwrap();
        assert!(matches!(
            ledger.get_encrypted_key(id, BOB).await,
            Err(LedgerError::AccessDenied)
        ));
        assert_eq!(ledger.grant_history(id, BOB).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_get_distinct_ids() {
        let ledger = Arc::new(MemoryLedger::new());

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .register_document(
                        OWNER,
                        ContentDigest::compute(&[i]),
                        &StorageLocator::from("b3:cc"),
                        &[0u8; 12],
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().get());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<u64>>());
        assert_eq!(ledger.document_count().await.unwrap(), 16);
    }
}
