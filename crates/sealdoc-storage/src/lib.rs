//! # Sealdoc Storage
//!
//! Off-ledger storage for document ciphertext.
//!
//! The ledger only records a digest and a locator; the ciphertext itself is
//! uploaded to a [`BlobStore`]. Storage is untrusted: whatever comes back
//! from [`BlobStore::fetch`] is checked against the ledger digest and the
//! AEAD tag before any plaintext is released.

pub mod blob;
pub mod error;

pub use blob::memory::{content_locator, MemoryBlobStore, LOCATOR_PREFIX};
pub use blob::BlobStore;
pub use error::{Result, StorageError};
