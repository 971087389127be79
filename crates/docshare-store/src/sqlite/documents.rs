//! Document rows.

use docshare_core::{time, Document, DocumentFields, DocumentId, UserId};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::rows;
use crate::error::{Result, StoreError};
use crate::tx::{run_in_transaction, CancelFlag};

/// Insert a document and its creator's Owner permission.
pub(super) fn create(
    conn: &mut Connection,
    cancel: &CancelFlag,
    creator: UserId,
    fields: &DocumentFields,
) -> Result<DocumentId> {
    let id = DocumentId::new_v4();
    let now = time::to_micros(&time::now());

    run_in_transaction(conn, cancel, "create document", |tx| {
        tx.conn()?
            .execute(
                "INSERT INTO documents (id, name, description, created_at, last_modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id.0, fields.name, fields.description, now],
            )
            .map_err(|e| StoreError::repository(tx.op(), e))?;

        tx.conn()?
            .execute(
                "INSERT INTO permissions (recipient_id, recipient_type, document_id,
                     permission_level, created_by, created_at, last_modified_at)
                 VALUES (?1, 'user', ?2, 'owner', ?1, ?3, ?3)",
                params![creator.0, id.0, now],
            )
            .map_err(|e| StoreError::repository(tx.op(), e))?;

        Ok(())
    })?;

    debug!(document = %id, creator = %creator, "created document");
    Ok(id)
}

pub(super) fn get(conn: &Connection, id: DocumentId) -> Result<Document> {
    conn.query_row(
        "SELECT id, name, description, created_at, last_modified_at
         FROM documents WHERE id = ?1",
        [id.0],
        rows::document,
    )
    .optional()
    .map_err(|e| StoreError::repository("get document", e))?
    .ok_or_else(|| StoreError::NotFound(format!("document {}", id)))
}

/// Overwrite the present fields. Callers skip the call when `fields` is empty.
pub(super) fn update(conn: &Connection, id: DocumentId, fields: &DocumentFields) -> Result<()> {
    let now = time::to_micros(&time::now());
    let changed = conn
        .execute(
            "UPDATE documents
             SET name = COALESCE(?2, name),
                 description = COALESCE(?3, description),
                 last_modified_at = ?4
             WHERE id = ?1",
            params![id.0, fields.name, fields.description, now],
        )
        .map_err(|e| StoreError::repository("update document", e))?;

    if changed == 0 {
        return Err(StoreError::NotFound(format!("document {}", id)));
    }
    debug!(document = %id, "updated document");
    Ok(())
}

/// Delete permissions, then guests, then the document itself.
pub(super) fn delete(conn: &mut Connection, cancel: &CancelFlag, id: DocumentId) -> Result<()> {
    let (permissions, guests) = run_in_transaction(conn, cancel, "delete document", |tx| {
        let permissions = tx
            .conn()?
            .execute("DELETE FROM permissions WHERE document_id = ?1", [id.0])
            .map_err(|e| StoreError::repository(tx.op(), e))?;
        let guests = tx
            .conn()?
            .execute("DELETE FROM guests WHERE document_id = ?1", [id.0])
            .map_err(|e| StoreError::repository(tx.op(), e))?;
        let documents = tx
            .conn()?
            .execute("DELETE FROM documents WHERE id = ?1", [id.0])
            .map_err(|e| StoreError::repository(tx.op(), e))?;

        if documents == 0 {
            return Err(StoreError::NotFound(format!("document {}", id)));
        }
        Ok((permissions, guests))
    })?;

    debug!(document = %id, permissions, guests, "deleted document");
    Ok(())
}
