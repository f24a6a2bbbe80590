//! Fault injection.
//!
//! Wrappers around a real [`Ledger`] or [`BlobStore`] that fail, stall or
//! corrupt on demand, for exercising the protocol's failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use sealdoc_core::{
    Address, ContentDigest, DocumentId, DocumentRecord, GrantEvent, StorageLocator, WrappedKey,
};
use sealdoc_ledger::{Ledger, LedgerError};
use sealdoc_storage::{BlobStore, StorageError};

/// Consume one injected fault, if any remain.
fn take_fault(remaining: &AtomicUsize) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// A ledger whose calls fail with `Unavailable` while faults are armed.
pub struct FaultyLedger<L> {
    inner: L,
    write_faults: AtomicUsize,
    read_faults: AtomicUsize,
    stall_writes: AtomicBool,
    write_calls: AtomicUsize,
}

impl<L: Ledger> FaultyLedger<L> {
    /// Wrap `inner` with no faults armed.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            write_faults: AtomicUsize::new(0),
            read_faults: AtomicUsize::new(0),
            stall_writes: AtomicBool::new(false),
            write_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` writes.
    pub fn fail_writes(&self, n: usize) {
        self.write_faults.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` reads.
    pub fn fail_reads(&self, n: usize) {
        self.read_faults.store(n, Ordering::SeqCst);
    }

    /// Make writes hang until the caller gives up.
    pub fn stall_writes(&self, stall: bool) {
        self.stall_writes.store(stall, Ordering::SeqCst);
    }

    /// Disarm every fault.
    pub fn heal(&self) {
        self.fail_writes(0);
        self.fail_reads(0);
        self.stall_writes(false);
    }

    /// Number of write calls received, failed ones included.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// The wrapped ledger.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    async fn before_write(&self) -> sealdoc_ledger::Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if take_fault(&self.write_faults) {
            return Err(LedgerError::Unavailable("injected write fault".into()));
        }
        Ok(())
    }

    fn before_read(&self) -> sealdoc_ledger::Result<()> {
        if take_fault(&self.read_faults) {
            return Err(LedgerError::Unavailable("injected read fault".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl<L: Ledger> Ledger for FaultyLedger<L> {
    async fn register_document(
        &self,
        caller: Address,
        digest: ContentDigest,
        locator: &StorageLocator,
        iv: &[u8],
    ) -> sealdoc_ledger::Result<DocumentId> {
        self.before_write().await?;
        self.inner
            .register_document(caller, digest, locator, iv)
            .await
    }

    async fn share_access(
        &self,
        caller: Address,
        id: DocumentId,
        recipient: Address,
        grant: bool,
        wrapped_key: &[u8],
    ) -> sealdoc_ledger::Result<()> {
        self.before_write().await?;
        self.inner
            .share_access(caller, id, recipient, grant, wrapped_key)
            .await
    }

    async fn get_encrypted_key(
        &self,
        id: DocumentId,
        caller: Address,
    ) -> sealdoc_ledger::Result<WrappedKey> {
        self.before_read()?;
        self.inner.get_encrypted_key(id, caller).await
    }

    async fn get_document_info(&self, id: DocumentId) -> sealdoc_ledger::Result<DocumentRecord> {
        self.before_read()?;
        self.inner.get_document_info(id).await
    }

    async fn verify_integrity(
        &self,
        id: DocumentId,
        candidate: &ContentDigest,
    ) -> sealdoc_ledger::Result<bool> {
        self.before_read()?;
        self.inner.verify_integrity(id, candidate).await
    }

    async fn has_access(&self, id: DocumentId, user: Address) -> sealdoc_ledger::Result<bool> {
        self.before_read()?;
        self.inner.has_access(id, user).await
    }

    async fn grant_history(
        &self,
        id: DocumentId,
        recipient: Address,
    ) -> sealdoc_ledger::Result<Vec<GrantEvent>> {
        self.before_read()?;
        self.inner.grant_history(id, recipient).await
    }

    async fn document_count(&self) -> sealdoc_ledger::Result<u64> {
        self.before_read()?;
        self.inner.document_count().await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

/// A blob store whose calls fail with a transport error while faults are armed.
pub struct FlakyBlobStore<B> {
    inner: B,
    upload_faults: AtomicUsize,
    fetch_faults: AtomicUsize,
    upload_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl<B: BlobStore> FlakyBlobStore<B> {
    /// Wrap `inner` with no faults armed.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            upload_faults: AtomicUsize::new(0),
            fetch_faults: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` uploads.
    pub fn fail_uploads(&self, n: usize) {
        self.upload_faults.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` fetches.
    pub fn fail_fetches(&self, n: usize) {
        self.fetch_faults.store(n, Ordering::SeqCst);
    }

    /// Number of upload calls received, failed ones included.
    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Number of fetch calls received, failed ones included.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: BlobStore> BlobStore for FlakyBlobStore<B> {
    async fn upload(&self, data: Bytes) -> sealdoc_storage::Result<StorageLocator> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if take_fault(&self.upload_faults) {
            return Err(StorageError::Transport(anyhow::anyhow!("injected upload fault")));
        }
        self.inner.upload(data).await
    }

    async fn fetch(&self, locator: &StorageLocator) -> sealdoc_storage::Result<Bytes> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if take_fault(&self.fetch_faults) {
            return Err(StorageError::Transport(anyhow::anyhow!("injected fetch fault")));
        }
        self.inner.fetch(locator).await
    }
}

/// A blob store that flips a bit in every fetched blob while armed.
pub struct TamperingBlobStore<B> {
    inner: B,
    armed: AtomicBool,
}

impl<B: BlobStore> TamperingBlobStore<B> {
    /// Wrap `inner`, disarmed.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
        }
    }

    /// Start corrupting fetches.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Stop corrupting fetches.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl<B: BlobStore> BlobStore for TamperingBlobStore<B> {
    async fn upload(&self, data: Bytes) -> sealdoc_storage::Result<StorageLocator> {
        self.inner.upload(data).await
    }

    async fn fetch(&self, locator: &StorageLocator) -> sealdoc_storage::Result<Bytes> {
        let blob = self.inner.fetch(locator).await?;
        if !self.armed.load(Ordering::SeqCst) || blob.is_empty() {
            return Ok(blob);
        }

        let mut corrupted = blob.to_vec();
        corrupted[0] ^= 0x01;
        Ok(Bytes::from(corrupted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealdoc_ledger::MemoryLedger;
    use sealdoc_storage::MemoryBlobStore;

    #[tokio::test]
    async fn test_write_faults_are_consumed() {
        let ledger = FaultyLedger::new(MemoryLedger::new());
        ledger.fail_writes(1);

        let owner = Address::from_bytes([1; 20]);
        let locator = StorageLocator::from("b3:00");
        let digest = ContentDigest::compute(b"x");

        let first = ledger
            .register_document(owner, digest, &locator, &[0; 12])
            .await;
        assert!(matches!(first, Err(LedgerError::Unavailable(_))));

        let second = ledger
            .register_document(owner, digest, &locator, &[0; 12])
            .await;
        assert_eq!(second.unwrap(), DocumentId(1));
        assert_eq!(ledger.write_calls(), 2);
    }

    #[tokio::test]
    async fn test_read_faults_leave_writes_alone() {
        let ledger = FaultyLedger::new(MemoryLedger::new());
        ledger.fail_reads(usize::MAX);

        assert!(ledger.document_count().await.is_err());
        ledger.heal();
        assert_eq!(ledger.document_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flaky_upload() {
        let store = FlakyBlobStore::new(MemoryBlobStore::new());
        store.fail_uploads(2);

        assert!(store.upload(Bytes::from_static(b"a")).await.is_err());
        assert!(store.upload(Bytes::from_static(b"a")).await.is_err());
        assert!(store.upload(Bytes::from_static(b"a")).await.is_ok());
        assert_eq!(store.upload_calls(), 3);
        assert_eq!(store.inner().len().await, 1);
    }

    #[tokio::test]
    async fn test_tampering_flips_a_bit() {
        let store = TamperingBlobStore::new(MemoryBlobStore::new());
        let locator = store.upload(Bytes::from_static(b"\x10abc")).await.unwrap();

        store.arm();
        assert_eq!(&store.fetch(&locator).await.unwrap()[..], b"\x11abc");

        store.disarm();
        assert_eq!(&store.fetch(&locator).await.unwrap()[..], b"\x10abc");
    }
}
