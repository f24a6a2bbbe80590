//! The document protocol: register, grant and retrieve.
//!
//! Brings together the content cipher, the key wrapper, blob storage and
//! the access ledger into the end-to-end flows. This is the only layer that
//! sequences network calls, applies deadlines and retries, and decides how
//! failures surface.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use sealdoc_core::{
    validate_wrapped_key, Address, ContentDigest, DocumentId, DocumentInfo, Iv, StorageLocator,
};
use sealdoc_crypto::{
    unwrap_key, wrap_key, ContentCipher, ContentKey, CryptoError, RecipientPrivateKey,
    RecipientPublicKey,
};
use sealdoc_ledger::{Ledger, LedgerError};
use sealdoc_storage::BlobStore;

use crate::config::ProtocolConfig;
use crate::error::{DocShareError, Result};
use crate::pending::PendingRegistration;
use crate::retry::{with_retry, with_timeout};
use crate::session::OwnerSession;

/// A document registered by this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDocument {
    /// Ledger-assigned ID.
    pub id: DocumentId,
    /// SHA-256 of the ciphertext, as committed to the ledger.
    pub digest: ContentDigest,
    /// Where the ciphertext lives.
    pub locator: StorageLocator,
    /// Nonce the ciphertext was sealed under.
    pub iv: Iv,
}

/// Orchestrates the document flows over a ledger and a blob store.
pub struct DocumentProtocol<L: Ledger, B: BlobStore> {
    /// The access ledger.
    ledger: Arc<L>,
    /// Ciphertext storage.
    storage: Arc<B>,
    /// Configuration.
    config: ProtocolConfig,
}

impl<L: Ledger, B: BlobStore> DocumentProtocol<L, B> {
    /// Create a protocol instance.
    pub fn new(ledger: L, storage: B, config: ProtocolConfig) -> Self {
        Self::from_shared(Arc::new(ledger), Arc::new(storage), config)
    }

    /// Create a protocol instance over shared backends.
    pub fn from_shared(ledger: Arc<L>, storage: Arc<B>, config: ProtocolConfig) -> Self {
        Self {
            ledger,
            storage,
            config,
        }
    }

    /// Get the ledger reference.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Get the storage reference.
    pub fn storage(&self) -> &B {
        &self.storage
    }

    /// Get the configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Owner Flows
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypt, upload and register a document.
    ///
    /// The plaintext is sealed before any network call. If the upload fails
    /// nothing is kept: the fresh content key is dropped and the ledger is
    /// untouched. If the upload succeeds but the ledger write fails, the
    /// error is [`DocShareError::UploadedNotRegistered`] and the content key
    /// stays staged in `session` for [`resume_registration`](Self::resume_registration).
    pub async fn register(
        &self,
        session: &mut OwnerSession,
        plaintext: &[u8],
    ) -> Result<RegisteredDocument> {
        let key = ContentKey::generate();
        let sealed = ContentCipher::new(&key).encrypt(plaintext)?;
        let digest = ContentDigest::compute(&sealed.ciphertext);

        let locator = self.upload(Bytes::from(sealed.ciphertext)).await?;
        session.keys_mut().stage(locator.clone(), key);

        let pending = PendingRegistration {
            digest,
            locator,
            iv: sealed.iv,
        };

        match self.submit_registration(session.address(), &pending).await {
            Ok(id) => self.finish_registration(session, pending, id),
            Err(e) => Err(uploaded_not_registered(pending, e)),
        }
    }

    /// Re-drive the ledger write for an upload that was not registered.
    ///
    /// Does not re-upload. The content key must still be staged in
    /// `session`. If the earlier attempt did reach the ledger and the
    /// duplicate-content policy rejects this one, the existing document is
    /// adopted.
    pub async fn resume_registration(
        &self,
        session: &mut OwnerSession,
        pending: PendingRegistration,
    ) -> Result<RegisteredDocument> {
        if session.keys().staged(&pending.locator).is_none() {
            return Err(DocShareError::NoStagedKey(pending.locator));
        }

        match self.submit_registration(session.address(), &pending).await {
            Ok(id) => self.finish_registration(session, pending, id),
            Err(DocShareError::Ledger(LedgerError::AlreadyExists { document })) => {
                tracing::info!(document = %document, locator = %pending.locator, "registration already on ledger");
                self.finish_registration(session, pending, document)
            }
            Err(e) => Err(uploaded_not_registered(pending, e)),
        }
    }

    async fn submit_registration(
        &self,
        owner: Address,
        pending: &PendingRegistration,
    ) -> Result<DocumentId> {
        // Writes are never retried: a resubmission would mint a second ID.
        with_timeout(
            self.config.ledger_timeout,
            "registerDocument",
            self.ledger.register_document(
                owner,
                pending.digest,
                &pending.locator,
                pending.iv.as_bytes(),
            ),
        )
        .await
    }

    fn finish_registration(
        &self,
        session: &mut OwnerSession,
        pending: PendingRegistration,
        id: DocumentId,
    ) -> Result<RegisteredDocument> {
        session.keys_mut().promote(&pending.locator, id)?;

        tracing::info!(document = %id, locator = %pending.locator, "document registered");
        Ok(RegisteredDocument {
            id,
            digest: pending.digest,
            locator: pending.locator,
            iv: pending.iv,
        })
    }

    /// Grant `recipient` access by wrapping the content key to their public key.
    ///
    /// Requires the content key to be resident in `session`. Granting an
    /// already-granted recipient replaces their wrapped key.
    pub async fn grant(
        &self,
        session: &OwnerSession,
        id: DocumentId,
        recipient: Address,
        recipient_key: &RecipientPublicKey,
    ) -> Result<()> {
        let key = session.keys().get(id)?;
        let wrapped = wrap_key(key, recipient_key)?;

        with_timeout(
            self.config.ledger_timeout,
            "shareAccess",
            self.ledger
                .share_access(session.address(), id, recipient, true, wrapped.as_bytes()),
        )
        .await?;

        tracing::info!(document = %id, %recipient, "access granted");
        Ok(())
    }

    /// Revoke `recipient`'s access.
    ///
    /// Stops future key fetches only. A recipient who already unwrapped the
    /// key can still decrypt the ciphertext; use [`reissue`](Self::reissue)
    /// to move remaining recipients to a fresh key.
    pub async fn revoke(
        &self,
        session: &OwnerSession,
        id: DocumentId,
        recipient: Address,
    ) -> Result<()> {
        with_timeout(
            self.config.ledger_timeout,
            "shareAccess",
            self.ledger
                .share_access(session.address(), id, recipient, false, &[]),
        )
        .await?;

        tracing::info!(document = %id, %recipient, "access revoked");
        Ok(())
    }

    /// Re-encrypt a document under a fresh key and re-grant `recipients`.
    ///
    /// Fetches and decrypts the current ciphertext with the session key,
    /// then registers the plaintext again as a new document. The old
    /// document and its grants are left as they are.
    pub async fn reissue(
        &self,
        session: &mut OwnerSession,
        id: DocumentId,
        recipients: &[(Address, RecipientPublicKey)],
    ) -> Result<RegisteredDocument> {
        let key = session.keys().get(id)?.clone();
        let info = self.document_info(id).await?;
        let ciphertext = self.fetch(&info.locator).await?;
        self.check_digest(id, &ciphertext).await?;

        let plaintext = open(id, &key, &ciphertext, &info.iv)?;
        let reissued = self.register(session, &plaintext).await?;

        for (recipient, public_key) in recipients {
            self.grant(session, reissued.id, *recipient, public_key)
                .await?;
        }

        tracing::info!(
            previous = %id,
            document = %reissued.id,
            recipients = recipients.len(),
            "document reissued under a fresh key"
        );
        Ok(reissued)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recipient Flows
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch and decrypt a document shared with `caller`.
    ///
    /// The ledger access check runs first, before anything is fetched from
    /// storage. Failure to unwrap the key is reported as
    /// [`DocShareError::KeyUnwrap`]; corrupted or tampered ciphertext as
    /// [`DocShareError::Integrity`].
    pub async fn retrieve(
        &self,
        id: DocumentId,
        caller: Address,
        private_key: &RecipientPrivateKey,
    ) -> Result<Vec<u8>> {
        let wrapped = self
            .read("getEncryptedKey", move || {
                self.ledger.get_encrypted_key(id, caller)
            })
            .await
            .map_err(|e| {
                if matches!(e, DocShareError::Ledger(LedgerError::AccessDenied)) {
                    tracing::debug!(document = %id, %caller, "retrieval denied");
                }
                e
            })?;
        validate_wrapped_key(&wrapped)?;

        let key = unwrap_key(&wrapped, private_key).map_err(|e| match e {
            CryptoError::KeyUnwrap => DocShareError::KeyUnwrap(id),
            other => other.into(),
        })?;

        let info = self.document_info(id).await?;
        let ciphertext = self.fetch(&info.locator).await?;

        if self.config.verify_digest_on_retrieve {
            self.check_digest(id, &ciphertext).await?;
        }

        let plaintext = open(id, &key, &ciphertext, &info.iv)?;
        tracing::debug!(document = %id, %caller, bytes = plaintext.len(), "document retrieved");
        Ok(plaintext)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Public Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the validated public record of a document.
    pub async fn document_info(&self, id: DocumentId) -> Result<DocumentInfo> {
        let record = self
            .read("getDocumentInfo", move || self.ledger.get_document_info(id))
            .await?;
        Ok(DocumentInfo::try_from(record)?)
    }

    /// Fetch the stored ciphertext and check it against the ledger digest.
    pub async fn verify_stored(&self, id: DocumentId) -> Result<bool> {
        let info = self.document_info(id).await?;
        let ciphertext = self.fetch(&info.locator).await?;
        let digest = ContentDigest::compute(&ciphertext);

        let intact = self
            .read("verifyIntegrity", || self.ledger.verify_integrity(id, &digest))
            .await?;

        if !intact {
            tracing::warn!(document = %id, locator = %info.locator, "stored ciphertext does not match ledger digest");
        }
        Ok(intact)
    }

    /// Whether `user` currently holds a grant.
    pub async fn has_access(&self, id: DocumentId, user: Address) -> Result<bool> {
        self.read("hasAccess", move || self.ledger.has_access(id, user))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Network Steps
    // ─────────────────────────────────────────────────────────────────────────

    async fn check_digest(&self, id: DocumentId, ciphertext: &[u8]) -> Result<()> {
        let digest = ContentDigest::compute(ciphertext);
        let intact = self
            .read("verifyIntegrity", || self.ledger.verify_integrity(id, &digest))
            .await?;

        if !intact {
            tracing::warn!(document = %id, "fetched ciphertext does not match ledger digest");
            return Err(DocShareError::Integrity(id));
        }
        Ok(())
    }

    /// A pure ledger read, with deadline and retries.
    async fn read<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = sealdoc_ledger::Result<T>>,
    {
        with_retry(&self.config.retry, operation, || {
            with_timeout(self.config.ledger_timeout, operation, call())
        })
        .await
    }

    async fn upload(&self, data: Bytes) -> Result<StorageLocator> {
        with_retry(&self.config.retry, "upload", || {
            with_timeout(
                self.config.storage_timeout,
                "upload",
                self.storage.upload(data.clone()),
            )
        })
        .await
    }

    async fn fetch(&self, locator: &StorageLocator) -> Result<Bytes> {
        with_retry(&self.config.retry, "fetch", || {
            with_timeout(self.config.storage_timeout, "fetch", self.storage.fetch(locator))
        })
        .await
    }
}

fn uploaded_not_registered(pending: PendingRegistration, source: DocShareError) -> DocShareError {
    tracing::warn!(locator = %pending.locator, error = %source, "ciphertext uploaded but not registered");
    DocShareError::UploadedNotRegistered {
        pending,
        source: Box::new(source),
    }
}

/// Decrypt, reporting a tag failure against the document.
fn open(id: DocumentId, key: &ContentKey, ciphertext: &[u8], iv: &Iv) -> Result<Vec<u8>> {
    ContentCipher::new(key)
        .decrypt(ciphertext, iv)
        .map_err(|e| match e {
            CryptoError::Integrity => DocShareError::Integrity(id),
            other => other.into(),
        })
}
