//! Boundary validation of ledger responses.
//!
//! Every ledger response the protocol acts on passes through here first.
//! The checks are structural: they do not consult the ledger again.

use crate::document::{DocumentInfo, DocumentRecord};
use crate::error::ValidationError;
use crate::types::{Iv, StorageLocator, WrappedKey, IV_LEN};

/// Validate a raw `getDocumentInfo` result.
pub fn validate_document_record(record: &DocumentRecord) -> Result<(), ValidationError> {
    if record.owner.is_zero() {
        return Err(ValidationError::ZeroOwner);
    }

    if record.storage_locator.is_empty() {
        return Err(ValidationError::EmptyLocator);
    }

    if record.iv.len() != IV_LEN {
        return Err(ValidationError::IvLength {
            expected: IV_LEN,
            got: record.iv.len(),
        });
    }

    if record.created_at == 0 {
        return Err(ValidationError::MissingTimestamp);
    }

    Ok(())
}

/// Validate a `getEncryptedKey` result.
pub fn validate_wrapped_key(key: &WrappedKey) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyWrappedKey);
    }
    Ok(())
}

impl TryFrom<DocumentRecord> for DocumentInfo {
    type Error = ValidationError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        validate_document_record(&record)?;

        let iv = Iv::try_from(record.iv.as_slice()).map_err(|_| ValidationError::IvLength {
            expected: IV_LEN,
            got: record.iv.len(),
        })?;

        Ok(Self {
            owner: record.owner,
            locator: StorageLocator::new(record.storage_locator),
            iv,
            created_at: record.created_at,
        })
    }
}
