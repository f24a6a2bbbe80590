//! SQLite implementation of the Ledger trait.
//!
//! This is the persistent ledger backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. Every contract call
//! runs in a single transaction, so a rejected call changes nothing.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use sealdoc_core::{
    Address, ContentDigest, DocumentId, DocumentRecord, GrantEvent, StorageLocator, WrappedKey,
};

use crate::error::{LedgerError, Result};
use crate::migration;
use crate::state::{authorize_share, now_secs, LedgerPolicy, ShareOutcome};
use crate::traits::Ledger;

/// SQLite-based ledger implementation.
///
/// Thread-safe via internal Mutex; the mutex also gives the total order of
/// mutations. All operations use spawn_blocking to avoid blocking the
/// async runtime.
pub struct SqliteLedger {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    policy: LedgerPolicy,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_policy(path, LedgerPolicy::default())
    }

    /// Open a database at the given path with an explicit policy.
    pub fn open_with_policy(path: impl AsRef<Path>, policy: LedgerPolicy) -> Result<Self> {
        Self::from_connection(Connection::open(path)?, policy)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, LedgerPolicy::default())
    }

    fn from_connection(mut conn: Connection, policy: LedgerPolicy) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            policy,
        })
    }

    /// Get the active policy.
    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// Run `f` inside one transaction on the blocking pool.
    ///
    /// The transaction commits only if `f` returns `Ok` and the calling
    /// future is still alive. A caller that gave up (a timeout dropped the
    /// future) gets a rollback, so an abandoned call never becomes visible.
    async fn transact<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let abandoned = Arc::new(AtomicBool::new(false));
        let _guard = AbandonOnDrop(abandoned.clone());

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| LedgerError::Unavailable(format!("mutex poisoned: {}", e)))?;

            if abandoned.load(Ordering::SeqCst) {
                return Err(LedgerError::Unavailable("caller abandoned the call".into()));
            }

            let tx = conn.transaction()?;
            let value = f(&tx)?;

            if abandoned.load(Ordering::SeqCst) {
                tx.rollback()?;
                tracing::warn!("caller abandoned the call, transaction rolled back");
                return Err(LedgerError::Unavailable("caller abandoned the call".into()));
            }

            tx.commit()?;
            Ok(value)
        })
        .await
        .map_err(|e| LedgerError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Marks a blocking call abandoned when the awaiting future is dropped.
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn decode_address(bytes: Vec<u8>) -> Result<Address> {
    Address::try_from(bytes.as_slice()).map_err(|e| LedgerError::InvalidData(e.to_string()))
}

fn decode_digest(bytes: Vec<u8>) -> Result<ContentDigest> {
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| LedgerError::InvalidData(format!("digest of {} bytes", b.len())))?;
    Ok(ContentDigest::from_bytes(bytes))
}

fn document_owner(tx: &Transaction<'_>, id: DocumentId) -> Result<Option<Address>> {
    tx.query_row(
        "SELECT owner FROM documents WHERE id = ?1",
        params![id.get() as i64],
        |row| row.get::<_, Vec<u8>>(0),
    )
    .optional()?
    .map(decode_address)
    .transpose()
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn register_document(
        &self,
        caller: Address,
        digest: ContentDigest,
        locator: &StorageLocator,
        iv: &[u8],
    ) -> Result<DocumentId> {
        let locator = locator.as_str().to_string();
        let iv = iv.to_vec();
        let allow_duplicates = self.policy.allow_duplicate_content;

        let id = self
            .transact(move |tx| {
                if !allow_duplicates {
                    let existing: Option<i64> = tx
                        .query_row(
                            "SELECT id FROM documents WHERE owner = ?1 AND content_digest = ?2
                             ORDER BY id LIMIT 1",
                            params![caller.as_bytes().as_slice(), digest.as_bytes().as_slice()],
                            |row| row.get(0),
                        )
                        .optional()?;

                    if let Some(existing) = existing {
                        return Err(LedgerError::AlreadyExists {
                            document: DocumentId(existing as u64),
                        });
                    }
                }

                tx.execute(
                    "INSERT INTO documents (owner, content_digest, storage_locator, iv, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        caller.as_bytes().as_slice(),
                        digest.as_bytes().as_slice(),
                        locator,
                        iv,
                        now_secs() as i64,
                    ],
                )?;

                Ok(DocumentId(tx.last_insert_rowid() as u64))
            })
            .await?;

        tracing::info!(document = %id, owner = %caller, %digest, "document registered");
        Ok(id)
    }

    async fn share_access(
        &self,
        caller: Address,
        id: DocumentId,
        recipient: Address,
        grant: bool,
        wrapped_key: &[u8],
    ) -> Result<()> {
        let wrapped_key = wrapped_key.to_vec();

        let outcome = self
            .transact(move |tx| {
                authorize_share(document_owner(tx, id)?, id, caller, grant, &wrapped_key)?;

                let exists = tx
                    .query_row(
                        "SELECT 1 FROM access_grants WHERE document_id = ?1 AND recipient = ?2",
                        params![id.get() as i64, recipient.as_bytes().as_slice()],
                        |_| Ok(()),
                    )
                    .optional()?
                    .is_some();

                if !exists && !grant {
                    return Ok(ShareOutcome::Unchanged);
                }

                let now = now_secs();
                let stored_key = grant.then_some(wrapped_key);

                tx.execute(
                    "INSERT INTO access_grants (document_id, recipient, granted, wrapped_key, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (document_id, recipient) DO UPDATE SET
                        granted = excluded.granted,
                        wrapped_key = excluded.wrapped_key,
                        updated_at = excluded.updated_at",
                    params![
                        id.get() as i64,
                        recipient.as_bytes().as_slice(),
                        grant,
                        stored_key,
                        now as i64,
                    ],
                )?;

                tx.execute(
                    "INSERT INTO grant_events (document_id, recipient, granted, recorded_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id.get() as i64, recipient.as_bytes().as_slice(), grant, now as i64],
                )?;

                Ok(ShareOutcome::Applied(GrantEvent {
                    seq: tx.last_insert_rowid() as u64,
                    document_id: id,
                    recipient,
                    granted: grant,
                    recorded_at: now,
                }))
            })
            .await?;

        match outcome {
            ShareOutcome::Applied(event) => {
                tracing::info!(document = %id, %recipient, granted = grant, seq = event.seq, "access updated");
            }
            ShareOutcome::Unchanged => {
                tracing::debug!(document = %id, %recipient, "revoke without grant ignored");
            }
        }
        Ok(())
    }

    async fn get_encrypted_key(&self, id: DocumentId, caller: Address) -> Result<WrappedKey> {
        self.transact(move |tx| {
            let key: Option<Option<Vec<u8>>> = tx
                .query_row(
                    "SELECT wrapped_key FROM access_grants
                     WHERE document_id = ?1 AND recipient = ?2 AND granted = 1",
                    params![id.get() as i64, caller.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            key.flatten()
                .map(WrappedKey::new)
                .ok_or(LedgerError::AccessDenied)
        })
        .await
    }

    async fn get_document_info(&self, id: DocumentId) -> Result<DocumentRecord> {
        self.transact(move |tx| {
            let row: Option<(Vec<u8>, String, Vec<u8>, i64)> = tx
                .query_row(
                    "SELECT owner, storage_locator, iv, created_at FROM documents WHERE id = ?1",
                    params![id.get() as i64],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;

            let (owner, storage_locator, iv, created_at) = row.ok_or(LedgerError::NotFound(id))?;

            Ok(DocumentRecord {
                owner: decode_address(owner)?,
                storage_locator,
                iv,
                created_at: created_at as u64,
            })
        })
        .await
    }

    async fn verify_integrity(&self, id: DocumentId, candidate: &ContentDigest) -> Result<bool> {
        let candidate = *candidate;

        self.transact(move |tx| {
            let stored: Option<Vec<u8>> = tx
                .query_row(
                    "SELECT content_digest FROM documents WHERE id = ?1",
                    params![id.get() as i64],
                    |row| row.get(0),
                )
                .optional()?;

            let stored = decode_digest(stored.ok_or(LedgerError::NotFound(id))?)?;
            Ok(stored == candidate)
        })
        .await
    }

    async fn has_access(&self, id: DocumentId, user: Address) -> Result<bool> {
        self.transact(move |tx| {
            let granted: Option<bool> = tx
                .query_row(
                    "SELECT granted FROM access_grants WHERE document_id = ?1 AND recipient = ?2",
                    params![id.get() as i64, user.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(granted.unwrap_or(false))
        })
        .await
    }

    async fn grant_history(&self, id: DocumentId, recipient: Address) -> Result<Vec<GrantEvent>> {
        self.transact(move |tx| {
            let mut stmt = tx.prepare(
                "SELECT seq, granted, recorded_at FROM grant_events
                 WHERE document_id = ?1 AND recipient = ?2
                 ORDER BY seq",
            )?;

            let events = stmt
                .query_map(
                    params![id.get() as i64, recipient.as_bytes().as_slice()],
                    |row| {
                        Ok(GrantEvent {
                            seq: row.get::<_, i64>(0)? as u64,
                            document_id: id,
                            recipient,
                            granted: row.get(1)?,
                            recorded_at: row.get::<_, i64>(2)? as u64,
                        })
                    },
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(events)
        })
        .await
    }

    async fn document_count(&self) -> Result<u64> {
        self.transact(|tx| {
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
