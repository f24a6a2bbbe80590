//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{LedgerError, Result};
use crate::state::now_secs;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(LedgerError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_secs() as i64],
            )?;
            tracing::debug!(version, "applied ledger schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(LedgerError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Registered documents. AUTOINCREMENT keeps ids monotonic from 1.
        CREATE TABLE documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner BLOB NOT NULL,              -- 20 bytes
            content_digest BLOB NOT NULL,     -- 32 bytes, SHA-256 of ciphertext
            storage_locator TEXT NOT NULL,
            iv BLOB NOT NULL,                 -- stored as submitted
            created_at INTEGER NOT NULL       -- Unix seconds
        );

        -- Current grant per (document, recipient). Never deleted.
        CREATE TABLE access_grants (
            document_id INTEGER NOT NULL REFERENCES documents(id),
            recipient BLOB NOT NULL,          -- 20 bytes
            granted INTEGER NOT NULL,         -- 0=revoked, 1=granted
            wrapped_key BLOB,                 -- NULL once revoked
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (document_id, recipient)
        );

        -- Append-only grant/revoke log.
        CREATE TABLE grant_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL REFERENCES documents(id),
            recipient BLOB NOT NULL,
            granted INTEGER NOT NULL,
            recorded_at INTEGER NOT NULL
        );

        CREATE INDEX idx_documents_owner_digest ON documents(owner, content_digest);
        CREATE INDEX idx_grant_events_pair ON grant_events(document_id, recipient);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"access_grants".to_string()));
        assert!(tables.contains(&"grant_events".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, 0)",
            [CURRENT_VERSION + 1],
        )
        .unwrap();

        assert!(matches!(
            migrate(&mut conn),
            Err(LedgerError::Migration(_))
        ));
    }
}
