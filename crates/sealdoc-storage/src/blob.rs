//! Blob storage abstraction.
//!
//! Ciphertext lives outside the ledger. The storage layer handles upload and
//! fetch of opaque bytes. Implementations may use IPFS pinning services,
//! HTTP object stores, or anything else that hands back a locator.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use sealdoc_core::StorageLocator;

use crate::error::Result;

/// Blob store for ciphertext.
///
/// Implementations must be thread-safe (Send + Sync). Only ciphertext is
/// ever passed to a blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` and return where it can be fetched from.
    async fn upload(&self, data: Bytes) -> Result<StorageLocator>;

    /// Fetch the bytes stored under `locator`.
    async fn fetch(&self, locator: &StorageLocator) -> Result<Bytes>;
}

#[async_trait]
impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    async fn upload(&self, data: Bytes) -> Result<StorageLocator> {
        (**self).upload(data).await
    }

    async fn fetch(&self, locator: &StorageLocator) -> Result<Bytes> {
        (**self).fetch(locator).await
    }
}

/// A content-addressed in-memory blob store for testing.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    use crate::error::StorageError;

    /// Locator scheme prefix for BLAKE3 content addresses.
    pub const LOCATOR_PREFIX: &str = "b3:";

    /// Derive the content address for `data`.
    pub fn content_locator(data: &[u8]) -> StorageLocator {
        StorageLocator::new(format!("{}{}", LOCATOR_PREFIX, blake3::hash(data).to_hex()))
    }

    /// In-memory blob store.
    ///
    /// Locators are BLAKE3 content addresses, so uploading identical bytes
    /// twice yields the same locator and stores them once.
    #[derive(Default)]
    pub struct MemoryBlobStore {
        blobs: RwLock<HashMap<StorageLocator, Bytes>>,
    }

    impl MemoryBlobStore {
        /// Create an empty store.
        pub fn new() -> Self {
            Self::default()
        }

        /// Whether a blob is stored under `locator`.
        pub async fn contains(&self, locator: &StorageLocator) -> bool {
            self.blobs.read().await.contains_key(locator)
        }

        /// Number of distinct blobs.
        pub async fn len(&self) -> usize {
            self.blobs.read().await.len()
        }

        /// Whether the store holds no blobs.
        pub async fn is_empty(&self) -> bool {
            self.blobs.read().await.is_empty()
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn upload(&self, data: Bytes) -> Result<StorageLocator> {
            let locator = content_locator(&data);
            self.blobs
                .write()
                .await
                .entry(locator.clone())
                .or_insert(data);

            tracing::debug!(%locator, "blob stored");
            Ok(locator)
        }

        async fn fetch(&self, locator: &StorageLocator) -> Result<Bytes> {
            self.blobs
                .read()
                .await
                .get(locator)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(locator.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::*;
    use super::*;
    use crate::error::StorageError;

    #[tokio::test]
    async fn test_upload_fetch() {
        let store = MemoryBlobStore::new();
        let locator = store.upload(Bytes::from_static(b"ciphertext")).await.unwrap();

        assert!(locator.as_str().starts_with(LOCATOR_PREFIX));
        assert_eq!(locator.as_str().len(), LOCATOR_PREFIX.len() + 64);
        assert_eq!(store.fetch(&locator).await.unwrap(), Bytes::from_static(b"ciphertext"));
    }

    #[tokio::test]
    async fn test_content_addressed() {
        let store = MemoryBlobStore::new();
        let a = store.upload(Bytes::from_static(b"same")).await.unwrap();
        let b = store.upload(Bytes::from_static(b"same")).await.unwrap();
        let c = store.upload(Bytes::from_static(b"different")).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len().await, 2);
        assert_eq!(a, content_locator(b"same"));
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let store = MemoryBlobStore::new();
        let missing = StorageLocator::from("b3:00");

        assert!(store.is_empty().await);
        assert!(matches!(
            store.fetch(&missing).await,
            Err(StorageError::NotFound(l)) if l == missing
        ));
    }

    #[tokio::test]
    async fn test_shared_through_arc() {
        let store = Arc::new(MemoryBlobStore::new());
        let locator = store.upload(Bytes::from_static(b"x")).await.unwrap();
        assert!(store.contains(&locator).await);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(StorageError::Timeout.is_retryable());
        assert!(StorageError::Transport(anyhow::anyhow!("connection reset")).is_retryable());
        assert!(!StorageError::NotFound(StorageLocator::from("b3:00")).is_retryable());
    }
}
