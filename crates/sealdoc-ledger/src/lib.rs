//! # Sealdoc Ledger
//!
//! The access ledger: the authoritative record of registered documents and
//! of who may fetch which wrapped key.
//!
//! ## Overview
//!
//! The ledger is abstracted behind the [`Ledger`] trait, which mirrors the
//! deployed contract surface. [`LedgerState`] holds the rules as a pure state
//! machine. [`MemoryLedger`] runs that machine behind a lock; [`SqliteLedger`]
//! persists the same semantics with one transaction per call.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait for all ledger operations
//! - [`SqliteLedger`] - SQLite-based persistent ledger
//! - [`MemoryLedger`] - In-memory ledger for tests
//! - [`LedgerPolicy`] - Duplicate-content registration policy
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealdoc_core::{Address, ContentDigest, StorageLocator};
//! use sealdoc_ledger::{Ledger, SqliteLedger};
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("ledger.db").unwrap();
//!
//!     let owner = Address::from_bytes([0x11; 20]);
//!     let digest = ContentDigest::compute(b"ciphertext bytes");
//!     let locator = StorageLocator::from("b3:...");
//!     let id = ledger.register_document(owner, digest, &locator, &[0u8; 12]).await.unwrap();
//!
//!     assert!(ledger.verify_integrity(id, &digest).await.unwrap());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Denials are uniform**: no grant, revoked grant and unknown document all
//!   read as `AccessDenied` through `get_encrypted_key`
//! - **Overwrite on re-grant**: granting twice replaces the wrapped key
//! - **Revoke clears the key**: the record and its history remain

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod state;
pub mod traits;

pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use state::{LedgerPolicy, LedgerState, ShareOutcome};
pub use traits::Ledger;
