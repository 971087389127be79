//! The DocumentService: request-level rules over a [`DocumentStore`].
//!
//! The store enforces storage invariants. The service adds the rules a caller
//! facing API needs: listing defaults, page size clamping, and refusing to
//! hand out Owner except through document creation.

use std::sync::Arc;

use docshare_core::{
    Cursor, Document, DocumentFields, DocumentId, DocumentPermission, Guest, GuestId, Page,
    Permission, PermissionLevel, PrincipalId, SortField, UserId,
};
use docshare_store::{DocumentStore, Result, StoreError};
use tracing::debug;

/// Configuration for the DocumentService.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Page size used when the caller gives none, zero, or more than the max.
    pub default_page_size: u32,
    /// Largest page size a caller may request.
    pub max_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl ServiceConfig {
    /// The page size to query with for a caller's request.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(size) if size > 0 && size <= self.max_page_size => size,
            _ => self.default_page_size,
        }
    }
}

/// Document, permission, and guest operations for one deployment.
///
/// Cheap to clone; clones share the store.
pub struct DocumentService<S: DocumentStore> {
    store: Arc<S>,
    config: ServiceConfig,
}

impl<S: DocumentStore> Clone for DocumentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

fn reject_owner(level: PermissionLevel, op: &str) -> Result<()> {
    if level == PermissionLevel::Owner {
        debug!(op, "rejected owner grant");
        return Err(StoreError::InvalidInput(format!(
            "{}: owner can only be granted by creating a document",
            op
        )));
    }
    Ok(())
}

/// Empty means every level.
fn level_set(levels: &[PermissionLevel]) -> &[PermissionLevel] {
    if levels.is_empty() {
        &PermissionLevel::ALL
    } else {
        levels
    }
}

impl<S: DocumentStore> DocumentService<S> {
    /// Create a service over `store`.
    pub fn new(store: S, config: ServiceConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_document(&self, creator: UserId, fields: DocumentFields) -> Result<DocumentId> {
        self.store.create_document(creator, fields).await
    }

    pub async fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.store.get_document(id).await
    }

    /// Update a document. At least one field must be given.
    pub async fn update_document(&self, id: DocumentId, fields: DocumentFields) -> Result<()> {
        if fields.is_empty() {
            return Err(StoreError::InvalidInput(
                "update document: no fields to update".to_string(),
            ));
        }
        self.store.update_document(id, fields).await
    }

    pub async fn delete_document(&self, id: DocumentId) -> Result<()> {
        self.store.delete_document(id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant or change a user's level. Owner is refused.
    pub async fn upsert_permission_user(
        &self,
        user: UserId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<()> {
        reject_owner(level, "upsert user permission")?;
        self.store.upsert_permission_user(user, document, level).await
    }

    /// Change a guest's level. Owner is refused.
    pub async fn update_permission_guest(&self, guest: GuestId, level: PermissionLevel) -> Result<()> {
        reject_owner(level, "update guest permission")?;
        self.store.update_permission_guest(guest, level).await
    }

    pub async fn get_permission_of_principal_on_document(
        &self,
        document: DocumentId,
        principal: PrincipalId,
    ) -> Result<Permission> {
        self.store
            .get_permission_of_principal_on_document(document, principal)
            .await
    }

    pub async fn delete_permissions_principal(
        &self,
        principal: PrincipalId,
        document: DocumentId,
    ) -> Result<()> {
        self.store
            .delete_permissions_principal(principal, document)
            .await
    }

    /// List a document's permissions.
    ///
    /// An empty `levels` means all levels, a missing cursor starts from the
    /// newest row by creation time, and the page size is clamped by
    /// [`ServiceConfig::page_size`].
    pub async fn list_permissions_on_document(
        &self,
        document: DocumentId,
        levels: &[PermissionLevel],
        cursor: Option<Cursor>,
        page_size: Option<u32>,
    ) -> Result<Page<Permission>> {
        self.store
            .list_permissions_on_document(
                document,
                level_set(levels),
                cursor.unwrap_or_else(|| Cursor::beginning(SortField::CreatedAt)),
                self.config.page_size(page_size),
            )
            .await
    }

    /// List the documents a principal can access, with the same defaults as
    /// [`list_permissions_on_document`](Self::list_permissions_on_document).
    pub async fn list_documents_by_principal(
        &self,
        principal: PrincipalId,
        levels: &[PermissionLevel],
        cursor: Option<Cursor>,
        page_size: Option<u32>,
    ) -> Result<Page<DocumentPermission>> {
        self.store
            .list_documents_by_principal(
                principal,
                level_set(levels),
                cursor.unwrap_or_else(|| Cursor::beginning(SortField::CreatedAt)),
                self.config.page_size(page_size),
            )
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Guests
    // ─────────────────────────────────────────────────────────────────────────

    /// Mint a guest for a document. Owner is refused.
    pub async fn create_guest(
        &self,
        creator: PrincipalId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<GuestId> {
        reject_owner(level, "create guest")?;
        self.store.create_guest(creator, document, level).await
    }

    pub async fn get_guest(&self, guest: GuestId) -> Result<Guest> {
        self.store.get_guest(guest).await
    }
}

/// Decode a client cursor token, if one was sent.
///
/// A malformed token is `InvalidInput`.
pub fn decode_cursor(token: Option<&str>) -> Result<Option<Cursor>> {
    match token {
        None | Some("") => Ok(None),
        Some(token) => Ok(Some(Cursor::from_token(token)?)),
    }
}
