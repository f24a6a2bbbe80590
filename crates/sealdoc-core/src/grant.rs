//! Access grants and their history.
//!
//! A grant record is keyed by `(document, recipient)` and is toggled by the
//! owner, never deleted. Every toggle is also appended to an ordered event
//! log so the grant history can be audited.

use serde::{Deserialize, Serialize};

use crate::types::{Address, DocumentId, WrappedKey};

/// Observable state of one `(document, recipient)` pair.
///
/// `NoGrant` is only ever the initial state. Once granted, a pair moves
/// between `Granted` and `Revoked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantStatus {
    NoGrant,
    Granted,
    Revoked,
}

impl GrantStatus {
    /// Whether the recipient may currently fetch the wrapped key.
    pub fn is_granted(&self) -> bool {
        matches!(self, GrantStatus::Granted)
    }
}

/// The stored grant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub document_id: DocumentId,
    pub recipient: Address,

    /// Current grant flag.
    pub granted: bool,

    /// Content key wrapped for this recipient. Cleared on revoke.
    pub wrapped_key: Option<WrappedKey>,

    /// When the flag was last changed (Unix seconds).
    pub updated_at: u64,
}

impl AccessGrant {
    /// A freshly granted record.
    pub fn granted(
        document_id: DocumentId,
        recipient: Address,
        wrapped_key: WrappedKey,
        now: u64,
    ) -> Self {
        Self {
            document_id,
            recipient,
            granted: true,
            wrapped_key: Some(wrapped_key),
            updated_at: now,
        }
    }

    /// Status as seen through the state machine.
    pub fn status(&self) -> GrantStatus {
        if self.granted {
            GrantStatus::Granted
        } else {
            GrantStatus::Revoked
        }
    }

    /// Overwrite the wrapped key and mark granted.
    pub fn regrant(&mut self, wrapped_key: WrappedKey, now: u64) {
        self.granted = true;
        self.wrapped_key = Some(wrapped_key);
        self.updated_at = now;
    }

    /// Mark revoked and drop the stored wrapped key.
    pub fn revoke(&mut self, now: u64) {
        self.granted = false;
        self.wrapped_key = None;
        self.updated_at = now;
    }

    /// The wrapped key, only while granted.
    pub fn active_key(&self) -> Option<&WrappedKey> {
        if self.granted {
            self.wrapped_key.as_ref()
        } else {
            None
        }
    }
}

/// One applied grant or revoke, in ledger order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEvent {
    /// Position in the ledger-wide event log, starting at 1.
    pub seq: u64,
    pub document_id: DocumentId,
    pub recipient: Address,
    pub granted: bool,
    pub recorded_at: u64,
}
