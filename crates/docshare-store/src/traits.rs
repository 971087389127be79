//! DocumentStore trait: the abstract interface for document access control.
//!
//! Implementations include SQLite (primary) and in-memory (for tests). Both
//! must behave identically, down to which [`StoreError`](crate::StoreError)
//! variant each failure produces.

use async_trait::async_trait;
use docshare_core::{
    Cursor, Document, DocumentFields, DocumentId, DocumentPermission, Guest, GuestId, Page,
    Permission, PermissionLevel, PrincipalId, UserId,
};

use crate::error::Result;

/// Persistence for documents, permissions, and guest principals.
///
/// # Design Notes
///
/// - **Ownership**: a document has no owner column. `create_document` writes the
///   creator's Owner permission in the same transaction as the document.
/// - **Atomicity**: multi-statement writes are all-or-nothing, including when
///   the operation is cancelled or times out.
/// - **Listings**: keyset pages ordered by `(time DESC, id DESC)`. The returned
///   page carries the cursor to resume from; an empty page ends the listing.
/// - **Validation**: an empty level set or a zero page size fails with
///   `InvalidInput` before any query runs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a document owned by `creator`.
    ///
    /// Inserts the document and an Owner permission for `creator` atomically.
    /// Any failure is reported as `Repository`.
    async fn create_document(&self, creator: UserId, fields: DocumentFields) -> Result<DocumentId>;

    /// Fetch a document. `NotFound` if absent.
    async fn get_document(&self, id: DocumentId) -> Result<Document>;

    /// Overwrite the present fields and refresh `last_modified_at`.
    ///
    /// Succeeds without touching the store when `fields` is empty. `NotFound`
    /// if the document does not exist.
    async fn update_document(&self, id: DocumentId, fields: DocumentFields) -> Result<()>;

    /// Delete a document with all of its permissions and guests.
    ///
    /// `NotFound` if the document does not exist, in which case nothing changes.
    async fn delete_document(&self, id: DocumentId) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `level` to a user, or change the level the user already holds.
    ///
    /// A new row records the user as its own creator. `UniqueConflict` if the
    /// id already holds a guest permission on the document; `NotFound` if the
    /// document does not exist.
    async fn upsert_permission_user(
        &self,
        user: UserId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<()>;

    /// Change the level of a guest's permission on the document it was minted for.
    ///
    /// `NotFound` if the guest or its permission does not exist.
    async fn update_permission_guest(&self, guest: GuestId, level: PermissionLevel) -> Result<()>;

    /// The permission a principal holds on a document. `NotFound` if none.
    async fn get_permission_of_principal_on_document(
        &self,
        document: DocumentId,
        principal: PrincipalId,
    ) -> Result<Permission>;

    /// Remove a principal's permission on a document. `NotFound` if none.
    ///
    /// A guest's Guest row is kept.
    async fn delete_permissions_principal(
        &self,
        principal: PrincipalId,
        document: DocumentId,
    ) -> Result<()>;

    /// One page of a document's permissions, ordered by the cursor's sort
    /// field then recipient id, both descending.
    ///
    /// `NotFound` if the document does not exist.
    async fn list_permissions_on_document(
        &self,
        document: DocumentId,
        levels: &[PermissionLevel],
        cursor: Cursor,
        page_size: u32,
    ) -> Result<Page<Permission>>;

    /// One page of the documents a principal can access, with the principal's
    /// level on each, ordered by the cursor's sort field then document id.
    async fn list_documents_by_principal(
        &self,
        principal: PrincipalId,
        levels: &[PermissionLevel],
        cursor: Cursor,
        page_size: u32,
    ) -> Result<Page<DocumentPermission>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Guests
    // ─────────────────────────────────────────────────────────────────────────

    /// Mint a guest scoped to `document` and grant it `level`.
    ///
    /// `NotFound` if the document does not exist.
    async fn create_guest(
        &self,
        creator: PrincipalId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<GuestId>;

    /// Fetch a guest. `NotFound` if absent.
    async fn get_guest(&self, guest: GuestId) -> Result<Guest>;
}
