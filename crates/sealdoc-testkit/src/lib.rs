//! # Sealdoc Testkit
//!
//! Testing utilities for Sealdoc.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known SHA-256 and AES-256-GCM cases with expected outputs
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Named principals with cached RSA key pairs
//! - **Faults**: Ledger and blob store wrappers that fail on demand
//!
//! ## Golden Vectors
//!
//! ```rust
//! use sealdoc_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, detail) in verify_all_vectors() {
//!     assert!(ok, "{name}: {detail}");
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! RSA key generation is slow, so principals draw from a per-process cache:
//!
//! ```rust,no_run
//! use sealdoc_testkit::fixtures::{alice, bob};
//!
//! let owner = alice();
//! let recipient = bob();
//! assert_ne!(owner.address, recipient.address);
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use faults::{FaultyLedger, FlakyBlobStore, TamperingBlobStore};
pub use fixtures::{alice, bob, carol, init_tracing, mallory, Principal};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector, VectorCase};
