//! # Sealdoc
//!
//! End-to-end encrypted document sharing anchored by an access ledger.
//!
//! ## Overview
//!
//! An owner encrypts a file locally, uploads only ciphertext to blob
//! storage, and authorizes recipients by wrapping the content key to each
//! recipient's public key. The ledger never sees plaintext or the raw
//! content key: it stores the ciphertext digest, the storage locator, the
//! nonce, and one wrapped key per recipient, and it decides who may fetch
//! which wrapped key.
//!
//! ## Flows
//!
//! - **Register**: encrypt → upload → digest → `registerDocument`
//! - **Grant**: wrap content key → `shareAccess(.., true, wrapped)`
//! - **Retrieve**: `getEncryptedKey` → unwrap → `getDocumentInfo` → fetch → verify → decrypt
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealdoc::{DocumentProtocol, OwnerSession, ProtocolConfig};
//! use sealdoc::core::Address;
//! use sealdoc::crypto::RecipientKeyPair;
//! use sealdoc::ledger::SqliteLedger;
//! use sealdoc::storage::MemoryBlobStore;
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("ledger.db").unwrap();
//!     let protocol = DocumentProtocol::new(ledger, MemoryBlobStore::new(), ProtocolConfig::default());
//!
//!     let mut alice = OwnerSession::new(Address::from_bytes([0xA1; 20]));
//!     let doc = protocol.register(&mut alice, b"contract draft").await.unwrap();
//!
//!     let bob = Address::from_bytes([0xB0; 20]);
//!     let bob_keys = RecipientKeyPair::generate(2048).unwrap();
//!     protocol.grant(&alice, doc.id, bob, bob_keys.public_key()).await.unwrap();
//!
//!     let plaintext = protocol.retrieve(doc.id, bob, bob_keys.private_key()).await.unwrap();
//!     assert_eq!(plaintext, b"contract draft");
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `sealdoc::core` - Identifiers, digests and ledger records
//! - `sealdoc::crypto` - Content cipher and key wrapping
//! - `sealdoc::ledger` - Ledger trait and backends
//! - `sealdoc::storage` - Blob storage

pub mod config;
pub mod error;
pub mod pending;
pub mod protocol;
pub mod retry;
pub mod session;

// Re-export component crates
pub use sealdoc_core as core;
pub use sealdoc_crypto as crypto;
pub use sealdoc_ledger as ledger;
pub use sealdoc_storage as storage;

// Re-export main types for convenience
pub use config::{ProtocolConfig, RetryPolicy};
pub use error::{DocShareError, Result};
pub use pending::PendingRegistration;
pub use protocol::{DocumentProtocol, RegisteredDocument};
pub use session::{ContentKeyStore, OwnerSession};
