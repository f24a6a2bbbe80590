//! # sealdoc core
//!
//! Pure primitives for sealdoc: identifiers, content digests, and the
//! document and grant records held by the access ledger.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`DocumentId`] - Ledger-assigned, monotonically increasing identifier
//! - [`Address`] - 20-byte principal identity
//! - [`ContentDigest`] - SHA-256 of ciphertext, used for integrity checks
//! - [`Iv`] - 96-bit cipher nonce stored next to the digest
//! - [`WrappedKey`] - Content key encrypted for one recipient
//! - [`DocumentInfo`] - Validated view of a ledger document record

pub mod digest;
pub mod document;
pub mod error;
pub mod grant;
pub mod types;
pub mod validation;

pub use digest::{ContentDigest, DIGEST_LEN};
pub use document::{Document, DocumentInfo, DocumentRecord};
pub use error::{CoreError, ValidationError};
pub use grant::{AccessGrant, GrantEvent, GrantStatus};
pub use types::{Address, DocumentId, Iv, StorageLocator, WrappedKey, ADDRESS_LEN, IV_LEN};
pub use validation::{validate_document_record, validate_wrapped_key};
