//! Permission rows and listings.

use docshare_core::{
    time, Cursor, DocumentId, DocumentPermission, GuestId, LevelFilter, Page, PageSize,
    Permission, PermissionLevel, PrincipalId, UserId,
};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::rows;
use crate::error::{classify, Result, StoreError};
use crate::pagination::{KeysetQuery, ScanTarget};
use crate::tx::{read_snapshot, CancelFlag};

/// Insert a user permission, or update the level of the user's existing row.
///
/// The conflict update is guarded on `recipient_type = 'user'`; a guest row
/// under the same id is left alone and reported as a conflict.
pub(super) fn upsert_user(
    conn: &Connection,
    user: UserId,
    document: DocumentId,
    level: PermissionLevel,
) -> Result<()> {
    let now = time::to_micros(&time::now());
    let changed = conn
        .execute(
            "INSERT INTO permissions (recipient_id, recipient_type, document_id,
                 permission_level, created_by, created_at, last_modified_at)
             VALUES (?1, 'user', ?2, ?3, ?1, ?4, ?4)
             ON CONFLICT (recipient_id, document_id) DO UPDATE
                 SET permission_level = excluded.permission_level,
                     last_modified_at = excluded.last_modified_at
                 WHERE permissions.recipient_type = 'user'",
            params![user.0, document.0, level.as_str(), now],
        )
        .map_err(|e| classify(e, "upsert user permission"))?;

    if changed == 0 {
        return Err(StoreError::UniqueConflict(format!(
            "principal {} holds a guest permission on document {}",
            user, document
        )));
    }
    debug!(user = %user, document = %document, level = %level, "upserted user permission");
    Ok(())
}

/// Update the guest's permission on the document named by its Guest row.
pub(super) fn update_guest(conn: &Connection, guest: GuestId, level: PermissionLevel) -> Result<()> {
    let now = time::to_micros(&time::now());
    let changed = conn
        .execute(
            "UPDATE permissions
             SET permission_level = ?2, last_modified_at = ?3
             WHERE recipient_id = ?1
               AND recipient_type = 'guest'
               AND document_id = (SELECT document_id FROM guests WHERE id = ?1)",
            params![guest.0, level.as_str(), now],
        )
        .map_err(|e| StoreError::repository("update guest permission", e))?;

    if changed == 0 {
        return Err(StoreError::NotFound(format!("permission of guest {}", guest)));
    }
    debug!(guest = %guest, level = %level, "updated guest permission");
    Ok(())
}

pub(super) fn get(conn: &Connection, document: DocumentId, principal: PrincipalId) -> Result<Permission> {
    conn.query_row(
        "SELECT document_id, recipient_id, recipient_type, permission_level,
                created_by, created_at, last_modified_at
         FROM permissions WHERE document_id = ?1 AND recipient_id = ?2",
        [document.0, principal.0],
        rows::permission,
    )
    .optional()
    .map_err(|e| StoreError::repository("get permission", e))?
    .ok_or_else(|| {
        StoreError::NotFound(format!(
            "permission of principal {} on document {}",
            principal, document
        ))
    })
}

/// Delete one principal's row. Guest rows are not touched.
pub(super) fn delete(conn: &Connection, principal: PrincipalId, document: DocumentId) -> Result<()> {
    let changed = conn
        .execute(
            "DELETE FROM permissions WHERE recipient_id = ?1 AND document_id = ?2",
            [principal.0, document.0],
        )
        .map_err(|e| StoreError::repository("delete permission", e))?;

    if changed == 0 {
        return Err(StoreError::NotFound(format!(
            "permission of principal {} on document {}",
            principal, document
        )));
    }
    debug!(principal = %principal, document = %document, "deleted permission");
    Ok(())
}

/// Page through a document's permissions. The existence check and the page
/// read see the same snapshot.
pub(super) fn list_on_document(
    conn: &mut Connection,
    cancel: &CancelFlag,
    document: DocumentId,
    levels: &LevelFilter,
    cursor: &Cursor,
    size: PageSize,
) -> Result<Page<Permission>> {
    let query = KeysetQuery::new(
        ScanTarget::PermissionsOnDocument,
        document.as_bytes(),
        levels,
        cursor,
        size,
    );

    let items = read_snapshot(conn, cancel, "list permissions on document", |tx| {
        let exists: bool = tx
            .conn()?
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM documents WHERE id = ?1)",
                [document.0],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::repository(tx.op(), e))?;
        if !exists {
            return Err(StoreError::NotFound(format!("document {}", document)));
        }

        let conn = tx.conn()?;
        let mut stmt = conn
            .prepare(query.sql())
            .map_err(|e| StoreError::repository(tx.op(), e))?;
        let items = stmt
            .query_map(query.params(), rows::permission)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| StoreError::repository(tx.op(), e))?;
        Ok(items)
    })?;

    debug!(document = %document, count = items.len(), "listed permissions on document");
    Ok(Page::from_items(items, cursor))
}

/// Page through the documents a principal holds a permission on.
pub(super) fn list_documents(
    conn: &Connection,
    principal: PrincipalId,
    levels: &LevelFilter,
    cursor: &Cursor,
    size: PageSize,
) -> Result<Page<DocumentPermission>> {
    let query = KeysetQuery::new(
        ScanTarget::DocumentsByPrincipal,
        principal.as_bytes(),
        levels,
        cursor,
        size,
    );

    let mut stmt = conn
        .prepare(query.sql())
        .map_err(|e| StoreError::repository("list documents by principal", e))?;
    let items = stmt
        .query_map(query.params(), rows::document_permission)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(|e| StoreError::repository("list documents by principal", e))?;

    debug!(principal = %principal, count = items.len(), "listed documents by principal");
    Ok(Page::from_items(items, cursor))
}
