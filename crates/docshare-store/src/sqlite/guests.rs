//! Guest principals.

use docshare_core::{time, DocumentId, Guest, GuestId, PermissionLevel, PrincipalId};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::rows;
use crate::error::{classify, Result, StoreError};
use crate::tx::{run_in_transaction, CancelFlag};

/// Insert a Guest row and its permission in one transaction.
pub(super) fn create(
    conn: &mut Connection,
    cancel: &CancelFlag,
    creator: PrincipalId,
    document: DocumentId,
    level: PermissionLevel,
) -> Result<GuestId> {
    create_with_id(conn, cancel, GuestId::new_v4(), creator, document, level)
}

pub(super) fn create_with_id(
    conn: &mut Connection,
    cancel: &CancelFlag,
    guest: GuestId,
    creator: PrincipalId,
    document: DocumentId,
    level: PermissionLevel,
) -> Result<GuestId> {
    let now = time::to_micros(&time::now());

    run_in_transaction(conn, cancel, "create guest", |tx| {
        tx.conn()?
            .execute(
                "INSERT INTO guests (id, document_id, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![guest.0, document.0, creator.0, now],
            )
            .map_err(|e| classify(e, tx.op()))?;

        tx.conn()?
            .execute(
                "INSERT INTO permissions (recipient_id, recipient_type, document_id,
                     permission_level, created_by, created_at, last_modified_at)
                 VALUES (?1, 'guest', ?2, ?3, ?4, ?5, ?5)",
                params![guest.0, document.0, level.as_str(), creator.0, now],
            )
            .map_err(|e| classify(e, tx.op()))?;

        Ok(())
    })?;

    debug!(guest = %guest, document = %document, level = %level, "created guest");
    Ok(guest)
}

pub(super) fn get(conn: &Connection, guest: GuestId) -> Result<Guest> {
    conn.query_row(
        "SELECT id, document_id, created_by, created_at FROM guests WHERE id = ?1",
        [guest.0],
        rows::guest,
    )
    .optional()
    .map_err(|e| StoreError::repository("get guest", e))?
    .ok_or_else(|| StoreError::NotFound(format!("guest {}", guest)))
}
