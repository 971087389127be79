//! Database schema migrations for SQLite.
//!
//! Each migration moves the schema from version N to N+1 and is recorded in
//! `schema_migrations`. All pending migrations apply in one transaction.

use docshare_core::time;
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{BackendError, Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: running it against an up-to-date database changes nothing.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| StoreError::repository("create schema_migrations", e))?;

    let current: u32 = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()
        .map_err(|e| StoreError::repository("read schema version", e))?
        .flatten()
        .unwrap_or(0);

    if current > CURRENT_VERSION {
        return Err(StoreError::repository(
            "migrate",
            BackendError::Migration(format!(
                "database schema version {} is newer than supported version {}",
                current, CURRENT_VERSION
            )),
        ));
    }

    if current < CURRENT_VERSION {
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::repository("begin migration", e))?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, time::to_micros(&time::now())],
            )
            .map_err(|e| StoreError::repository("record migration", e))?;
            info!(version, "applied schema migration");
        }

        tx.commit()
            .map_err(|e| StoreError::repository("commit migration", e))?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::repository(
            "migrate",
            BackendError::Migration(format!("unknown migration version: {}", version)),
        )),
    }
}

/// Migration v1: documents, permissions, guests.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE documents (
            id BLOB PRIMARY KEY,               -- 16-byte uuid
            name TEXT,
            description TEXT,
            created_at INTEGER NOT NULL,       -- µs since epoch
            last_modified_at INTEGER NOT NULL
        );

        -- One row per (recipient, document). Owner rows are written only by document creation.
        CREATE TABLE permissions (
            recipient_id BLOB NOT NULL,
            recipient_type TEXT NOT NULL CHECK (recipient_type IN ('user', 'guest')),
            document_id BLOB NOT NULL REFERENCES documents(id),
            permission_level TEXT NOT NULL CHECK (permission_level IN ('viewer', 'editor', 'owner')),
            created_by BLOB NOT NULL,
            created_at INTEGER NOT NULL,
            last_modified_at INTEGER NOT NULL,
            PRIMARY KEY (recipient_id, document_id)
        );

        CREATE TABLE guests (
            id BLOB PRIMARY KEY,
            document_id BLOB NOT NULL REFERENCES documents(id),
            created_by BLOB NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX idx_documents_created ON documents(created_at, id);
        CREATE INDEX idx_documents_modified ON documents(last_modified_at, id);
        -- Listing by principal seeks the primary key's recipient_id prefix and
        -- sorts that principal's rows; the document times live on documents.
        CREATE INDEX idx_permissions_doc_created ON permissions(document_id, created_at, recipient_id);
        CREATE INDEX idx_permissions_doc_modified ON permissions(document_id, last_modified_at, recipient_id);
        CREATE INDEX idx_guests_document ON guests(document_id);
        "#,
    )
    .map_err(|e| StoreError::repository("apply migration v1", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables = names(&conn, "table");
        for table in ["documents", "permissions", "guests", "schema_migrations"] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }

        let indexes = names(&conn, "index");
        assert!(indexes.contains(&"idx_permissions_doc_created".to_string()));
        assert!(indexes.contains(&"idx_documents_modified".to_string()));
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

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_rejects_newer_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, 0)",
            [CURRENT_VERSION + 1],
        )
        .unwrap();

        let err = migrate(&mut conn).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Repository);
    }

    #[test]
    fn test_level_check_constraint() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO documents (id, created_at, last_modified_at) VALUES (x'01', 0, 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO permissions VALUES (x'02', 'user', x'01', 'admin', x'02', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
