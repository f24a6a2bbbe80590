//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealdoc_core::{Address, ContentDigest, DocumentId, Iv, StorageLocator};
use sealdoc_crypto::ContentKey;

/// Generate a random Address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Generate a non-zero Address.
pub fn nonzero_address() -> impl Strategy<Value = Address> {
    address().prop_filter("zero address", |a| !a.is_zero())
}

/// Generate a random ContentDigest.
pub fn digest() -> impl Strategy<Value = ContentDigest> {
    any::<[u8; 32]>().prop_map(ContentDigest::from_bytes)
}

/// Generate a random Iv.
pub fn iv() -> impl Strategy<Value = Iv> {
    any::<[u8; 12]>().prop_map(Iv::from_bytes)
}

/// Generate a random ContentKey.
pub fn content_key() -> impl Strategy<Value = ContentKey> {
    any::<[u8; 32]>().prop_map(ContentKey::from_bytes)
}

/// Generate a document ID in a range a fresh ledger can reach.
pub fn document_id() -> impl Strategy<Value = DocumentId> {
    (1u64..=64).prop_map(DocumentId)
}

/// Generate a content-addressed storage locator.
pub fn locator() -> impl Strategy<Value = StorageLocator> {
    any::<[u8; 32]>().prop_map(|bytes| StorageLocator::new(format!("b3:{}", hex::encode(bytes))))
}

/// Generate document bytes of specified max length.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// One step of an owner's grant/revoke sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOp {
    /// Grant with a wrapped key of the given fill byte.
    Grant(u8),
    Revoke,
}

/// Generate a grant/revoke sequence.
pub fn access_ops(max_len: usize) -> impl Strategy<Value = Vec<AccessOp>> {
    prop::collection::vec(
        prop_oneof![
            any::<u8>().prop_map(AccessOp::Grant),
            Just(AccessOp::Revoke),
        ],
        0..=max_len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn nonzero_address_is_nonzero(a in nonzero_address()) {
            prop_assert!(!a.is_zero());
        }

        #[test]
        fn locator_is_content_addressed(l in locator()) {
            prop_assert!(l.as_str().starts_with("b3:"));
            prop_assert_eq!(l.as_str().len(), 3 + 64);
        }

        #[test]
        fn document_ids_are_positive(id in document_id()) {
            prop_assert!(id.get() >= 1);
        }
    }
}
