//! Ledger state machine.
//!
//! The rules every backend enforces, expressed over plain in-memory data.
//! [`MemoryLedger`](crate::MemoryLedger) wraps a [`LedgerState`] directly;
//! [`SqliteLedger`](crate::SqliteLedger) keeps its rows in SQLite but runs
//! the same checks through [`authorize_share`] and [`check_grant_key`].
//!
//! Per document: `Unregistered -> Registered` (terminal).
//! Per `(document, recipient)`: `NoGrant -> Granted <-> Revoked`.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use sealdoc_core::{
    AccessGrant, Address, ContentDigest, Document, DocumentId, DocumentRecord, GrantEvent,
    GrantStatus, StorageLocator, WrappedKey,
};

use crate::error::{LedgerError, Result};

/// Registration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Allow one owner to register the same ciphertext digest more than once.
    ///
    /// When false, the second registration fails with `AlreadyExists`.
    pub allow_duplicate_content: bool,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            allow_duplicate_content: true,
        }
    }
}

/// What a `share_access` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The grant record changed and an event was appended.
    Applied(GrantEvent),
    /// Revoke of a pair that was never granted. Nothing changed.
    Unchanged,
}

/// Check the owner and argument rules for `share_access`.
///
/// `owner` is `None` when the document does not exist.
pub fn authorize_share(
    owner: Option<Address>,
    id: DocumentId,
    caller: Address,
    grant: bool,
    wrapped_key: &[u8],
) -> Result<()> {
    let owner = owner.ok_or(LedgerError::NotFound(id))?;

    if owner != caller {
        return Err(LedgerError::NotOwner {
            document: id,
            caller,
        });
    }

    if grant {
        check_grant_key(wrapped_key)?;
    }

    Ok(())
}

/// A grant must carry a non-empty wrapped key.
pub fn check_grant_key(wrapped_key: &[u8]) -> Result<()> {
    if wrapped_key.is_empty() {
        return Err(LedgerError::InvalidArgument(
            "wrapped key must be non-empty when granting".into(),
        ));
    }
    Ok(())
}

/// Aggregated ledger state.
#[derive(Debug)]
pub struct LedgerState {
    policy: LedgerPolicy,

    /// All documents indexed by ID.
    documents: BTreeMap<DocumentId, Document>,

    /// Grant records keyed by (document, recipient).
    grants: HashMap<(DocumentId, Address), AccessGrant>,

    /// Append-only grant/revoke log.
    events: Vec<GrantEvent>,

    /// Index: (owner, digest) -> first document, for the duplicate policy.
    by_content: HashMap<(Address, ContentDigest), DocumentId>,

    next_id: DocumentId,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new(LedgerPolicy::default())
    }
}

impl LedgerState {
    /// Create an empty ledger.
    pub fn new(policy: LedgerPolicy) -> Self {
        Self {
            policy,
            documents: BTreeMap::new(),
            grants: HashMap::new(),
            events: Vec::new(),
            by_content: HashMap::new(),
            next_id: DocumentId::FIRST,
        }
    }

    /// Get the active policy.
    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// Register a document and return its new ID.
    pub fn register(
        &mut self,
        caller: Address,
        digest: ContentDigest,
        locator: &StorageLocator,
        iv: &[u8],
        now: u64,
    ) -> Result<DocumentId> {
        if !self.policy.allow_duplicate_content {
            if let Some(&existing) = self.by_content.get(&(caller, digest)) {
                return Err(LedgerError::AlreadyExists { document: existing });
            }
        }

        let id = self.next_id;
        self.next_id = id.next();

        self.documents.insert(
            id,
            Document {
                id,
                owner: caller,
                content_digest: digest,
                storage_locator: locator.clone(),
                iv: iv.to_vec(),
                created_at: now,
            },
        );
        self.by_content.entry((caller, digest)).or_insert(id);

        Ok(id)
    }

    /// Apply a grant or revoke.
    ///
    /// A repeated grant overwrites the stored wrapped key. A revoke clears it
    /// but keeps the record.
    pub fn share(
        &mut self,
        caller: Address,
        id: DocumentId,
        recipient: Address,
        grant: bool,
        wrapped_key: &[u8],
        now: u64,
    ) -> Result<ShareOutcome> {
        authorize_share(
            self.documents.get(&id).map(|d| d.owner),
            id,
            caller,
            grant,
            wrapped_key,
        )?;

        match self.grants.entry((id, recipient)) {
            Entry::Vacant(_) if !grant => return Ok(ShareOutcome::Unchanged),
            Entry::Vacant(slot) => {
                slot.insert(AccessGrant::granted(
                    id,
                    recipient,
                    WrappedKey::new(wrapped_key),
                    now,
                ));
            }
            Entry::Occupied(mut slot) if grant => {
                slot.get_mut().regrant(WrappedKey::new(wrapped_key), now)
            }
            Entry::Occupied(mut slot) => slot.get_mut().revoke(now),
        }

        let event = GrantEvent {
            seq: self.events.len() as u64 + 1,
            document_id: id,
            recipient,
            granted: grant,
            recorded_at: now,
        };
        self.events.push(event.clone());

        Ok(ShareOutcome::Applied(event))
    }

    /// The wrapped key for `caller`, only while granted.
    pub fn encrypted_key(&self, id: DocumentId, caller: Address) -> Result<WrappedKey> {
        self.grants
            .get(&(id, caller))
            .and_then(AccessGrant::active_key)
            .cloned()
            .ok_or(LedgerError::AccessDenied)
    }

    /// Get a document by ID.
    pub fn document(&self, id: DocumentId) -> Result<&Document> {
        self.documents.get(&id).ok_or(LedgerError::NotFound(id))
    }

    /// The public record for a document.
    pub fn document_info(&self, id: DocumentId) -> Result<DocumentRecord> {
        self.document(id).map(Document::record)
    }

    /// Exact comparison against the stored digest.
    pub fn verify_integrity(&self, id: DocumentId, candidate: &ContentDigest) -> Result<bool> {
        Ok(self.document(id)?.content_digest == *candidate)
    }

    /// Current state of a `(document, recipient)` pair.
    pub fn status(&self, id: DocumentId, recipient: Address) -> GrantStatus {
        self.grants
            .get(&(id, recipient))
            .map(AccessGrant::status)
            .unwrap_or(GrantStatus::NoGrant)
    }

    /// Whether `user` currently holds a grant.
    pub fn has_access(&self, id: DocumentId, user: Address) -> bool {
        self.status(id, user).is_granted()
    }

    /// Events for one pair, oldest first.
    pub fn grant_history(&self, id: DocumentId, recipient: Address) -> Vec<GrantEvent> {
        self.events
            .iter()
            .filter(|e| e.document_id == id && e.recipient == recipient)
            .cloned()
            .collect()
    }

    /// Number of registered documents.
    pub fn document_count(&self) -> u64 {
        self.documents.len() as u64
    }
}

/// Current time in Unix seconds.
pub(crate) fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OWNER: Address = Address([0x11; 20]);
    const BOB: Address = Address([0x22; 20]);
    const MALLORY: Address = Address([0x66; 20]);

    fn register(state: &mut LedgerState, content: &[u8]) -> DocumentId {
        state
            .register(
                OWNER,
                ContentDigest::compute(content),
                &StorageLocator::from("b3:00"),
                &[0u8; 12],
                100,
            )
            .unwrap()
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut state = LedgerState::default();
        assert_eq!(register(&mut state, b"a"), DocumentId(1));
        assert_eq!(register(&mut state, b"b"), DocumentId(2));
        assert_eq!(state.document_count(), 2);
    }

    #[test]
    fn test_duplicate_content_allowed_by_default() {
        let mut state = LedgerState::default();
        let first = register(&mut state, b"same");
        let second = register(&mut state, b"same");
        assert_ne!(first, second);
    }

    #[test]
    fn test_duplicate_content_rejected_by_policy() {
        let mut state = LedgerState::new(LedgerPolicy {
            allow_duplicate_content: false,
        });
        let first = register(&mut state, b"same");

        let err = state
            .register(
                OWNER,
                ContentDigest::compute(b"same"),
                &StorageLocator::from("b3:01"),
                &[1u8; 12],
                101,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyExists { document } if document == first));
        assert_eq!(state.document_count(), 1);

        // Another owner may register the same content.
        assert!(state
            .register(
                BOB,
                ContentDigest::compute(b"same"),
                &StorageLocator::from("b3:01"),
                &[1u8; 12],
                101,
            )
            .is_ok());
    }

    #[test]
    fn test_key_denied_before_grant() {
        let mut state = LedgerState::default();
        let id = register(&mut state, b"doc");

        assert!(matches!(
            state.encrypted_key(id, BOB),
            Err(LedgerError::AccessDenied)
        ));
        assert_eq!(state.status(id, BOB), GrantStatus::NoGrant);
    }

    #[test]
    fn test_key_denied_for_unknown_document() {
        let state = LedgerState::default();
        assert!(matches!(
            state.encrypted_key(DocumentId(9), BOB),
            Err(LedgerError::AccessDenied)
        ));
    }

    #[test]
    fn test_grant_overwrite_revoke() {
        let mut state = LedgerState::default();
        let id = register(&mut state, b"doc");

        state.share(OWNER, id, BOB, true, b"W1", 200).unwrap();
        assert_eq!(state.encrypted_key(id, BOB).unwrap().as_bytes(), b"W1");

        state.share(OWNER, id, BOB, true, b"W2", 201).unwrap();
        assert_eq!(state.encrypted_key(id, BOB).unwrap().as_bytes(), b"W2");

        state.share(OWNER, id, BOB, false, b"", 202).unwrap();
        assert!(matches!(
            state.encrypted_key(id, BOB),
            Err(LedgerError::AccessDenied)
        ));
        assert_eq!(state.status(id, BOB), GrantStatus::Revoked);

        let history = state.grant_history(id, BOB);
        assert_eq!(
            history.iter().map(|e| e.granted).collect::<Vec<_>>(),
            vec![true, true, false]
        );
        assert_eq!(history[0].seq, 1);
        assert_eq!(history[2].recorded_at, 202);
    }

    #[test]
    fn test_regrant_after_revoke() {
        let mut state = LedgerState::default();
        let id = register(&mut state, b"doc");

        state.share(OWNER, id, BOB, true, b"W1", 1).unwrap();
        state.share(OWNER, id, BOB, false, b"", 2).unwrap();
        state.share(OWNER, id, BOB, true, b"W3", 3).unwrap();

        assert!(state.has_access(id, BOB));
        assert_eq!(state.encrypted_key(id, BOB).unwrap().as_bytes(), b"W3");
    }

    #[test]
    fn test_revoke_without_grant_is_noop() {
        let mut state = LedgerState::default();
        let id = register(&mut state, b"doc");

        let outcome = state.share(OWNER, id, BOB, false, b"", 5).unwrap();
        assert_eq!(outcome, ShareOutcome::Unchanged);
        assert_eq!(state.status(id, BOB), GrantStatus::NoGrant);
        assert!(state.grant_history(id, BOB).is_empty());
    }

    #[test]
    fn test_non_owner_rejected() {
        let mut state = LedgerState::default();
        let id = register(&mut state, b"doc");

        for grant in [true, false] {
            let err = state.share(MALLORY, id, BOB, grant, b"W", 1).unwrap_err();
            assert!(matches!(err, LedgerError::NotOwner { caller, .. } if caller == MALLORY));
        }
        assert_eq!(state.status(id, BOB), GrantStatus::NoGrant);
    }

    #[test]
    fn test_share_unknown_document() {
        let mut state = LedgerState::default();
        assert!(matches!(
            state.share(OWNER, DocumentId(3), BOB, true, b"W", 1),
            Err(LedgerError::NotFound(DocumentId(3)))
        ));
    }

    #[test]
    fn test_grant_requires_wrapped_key() {
        let mut state = LedgerState::default();
        let id = register(&mut state, b"doc");

        assert!(matches!(
            state.share(OWNER, id, BOB, true, b"", 1),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(state.grant_history(id, BOB).is_empty());
    }

    #[test]
    fn test_document_info_and_integrity() {
        let mut state = LedgerState::default();
        let content = b"0123456789";
        let id = register(&mut state, content);

        let info = state.document_info(id).unwrap();
        assert_eq!(info.owner, OWNER);
        assert_eq!(info.storage_locator, "b3:00");
        assert_eq!(info.created_at, 100);

        let digest = ContentDigest::compute(content);
        assert!(state.verify_integrity(id, &digest).unwrap());
        assert!(!state
            .verify_integrity(id, &ContentDigest::compute(b"012345678"))
            .unwrap());

        assert!(matches!(
            state.document_info(DocumentId(42)),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            state.verify_integrity(DocumentId(42), &digest),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_iv_stored_verbatim() {
        let mut state = LedgerState::default();
        let id = state
            .register(
                OWNER,
                ContentDigest::compute(b"x"),
                &StorageLocator::from("b3:00"),
                &[7u8; 16],
                1,
            )
            .unwrap();
        assert_eq!(state.document_info(id).unwrap().iv, vec![7u8; 16]);
    }

    proptest! {
        #[test]
        fn verify_integrity_is_idempotent(
            content in prop::collection::vec(any::<u8>(), 0..64),
            candidate in any::<[u8; 32]>(),
        ) {
            let mut state = LedgerState::default();
            let id = register(&mut state, &content);
            let candidate = ContentDigest::from_bytes(candidate);

            let first = state.verify_integrity(id, &candidate).unwrap();
            let second = state.verify_integrity(id, &candidate).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, candidate == ContentDigest::compute(&content));
        }

        #[test]
        fn last_grant_wins(keys in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..32), 1..8)) {
            let mut state = LedgerState::default();
            let id = register(&mut state, b"doc");

            for key in &keys {
                state.share(OWNER, id, BOB, true, key, 1).unwrap();
            }

            let last = keys.last().unwrap();
            let granted = state.encrypted_key(id, BOB).unwrap();
            prop_assert_eq!(granted.as_bytes(), last.as_slice());
            prop_assert_eq!(state.grant_history(id, BOB).len(), keys.len());
        }
    }
}
