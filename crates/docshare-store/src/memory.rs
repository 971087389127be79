//! In-memory implementation of the DocumentStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite,
//! including error kinds and page order, but keeps everything in memory with
//! no persistence. Each operation runs under one lock acquisition, so
//! multi-step writes are all-or-nothing.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use docshare_core::{
    time, Cursor, Document, DocumentFields, DocumentId, DocumentPermission, Guest, GuestId,
    Keyed, Page, PageSize, Permission, PermissionLevel, PrincipalId, RecipientType,
    UserId,
};

use crate::error::{BackendError, Result, StoreError};
use crate::pagination;
use crate::traits::DocumentStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    documents: HashMap<DocumentId, Document>,

    /// Permission rows keyed like the SQLite primary key.
    permissions: BTreeMap<(PrincipalId, DocumentId), Permission>,

    guests: HashMap<GuestId, Guest>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self, op: &str) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::repository(op.to_string(), BackendError::Poisoned))
    }

    fn write(&self, op: &str) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::repository(op.to_string(), BackendError::Poisoned))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn document_not_found(id: DocumentId) -> StoreError {
    StoreError::NotFound(format!("document {}", id))
}

fn permission_not_found(principal: PrincipalId, document: DocumentId) -> StoreError {
    StoreError::NotFound(format!(
        "permission of principal {} on document {}",
        principal, document
    ))
}

/// Sort rows by `(time DESC, id DESC)`, keep those after the cursor, and cut
/// the page.
fn page_of<T: Keyed>(mut rows: Vec<T>, cursor: &Cursor, size: PageSize) -> Page<T> {
    let sort = cursor.sort_field;
    rows.retain(|row| {
        let (time, id) = row.order_key(sort);
        cursor.admits(&time, &id)
    });
    rows.sort_by(|a, b| b.order_key(sort).cmp(&a.order_key(sort)));
    rows.truncate(size.get() as usize);
    Page::from_items(rows, cursor)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, creator: UserId, fields: DocumentFields) -> Result<DocumentId> {
        let mut inner = self.write("create document")?;

        let id = DocumentId::new_v4();
        if inner.documents.contains_key(&id) {
            return Err(StoreError::repository(
                "create document",
                BackendError::InvalidData(format!("document id {} already in use", id)),
            ));
        }

        let now = time::now();
        inner.documents.insert(
            id,
            Document {
                id,
                name: fields.name,
                description: fields.description,
                created_at: now,
                last_modified_at: now,
            },
        );
        inner.permissions.insert(
            (creator.into(), id),
            Permission {
                document_id: id,
                recipient_id: creator.into(),
                recipient_type: RecipientType::User,
                level: PermissionLevel::Owner,
                created_by: creator.into(),
                created_at: now,
                last_modified_at: now,
            },
        );

        debug!(document = %id, creator = %creator, "created document");
        Ok(id)
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document> {
        let inner = self.read("get document")?;
        inner
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| document_not_found(id))
    }

    async fn update_document(&self, id: DocumentId, fields: DocumentFields) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut inner = self.write("update document")?;
        let doc = inner
            .documents
            .get_mut(&id)
            .ok_or_else(|| document_not_found(id))?;

        if let Some(name) = fields.name {
            doc.name = Some(name);
        }
        if let Some(description) = fields.description {
            doc.description = Some(description);
        }
        doc.last_modified_at = time::now();
        Ok(())
    }

    async fn delete_document(&self, id: DocumentId) -> Result<()> {
        let mut inner = self.write("delete document")?;
        if inner.documents.remove(&id).is_none() {
            return Err(document_not_found(id));
        }
        inner.permissions.retain(|(_, document), _| *document != id);
        inner.guests.retain(|_, guest| guest.document_id != id);
        debug!(document = %id, "deleted document");
        Ok(())
    }

    async fn upsert_permission_user(
        &self,
        user: UserId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<()> {
        let mut inner = self.write("upsert user permission")?;
        if !inner.documents.contains_key(&document) {
            return Err(document_not_found(document));
        }

        let now = time::now();
        let key = (PrincipalId::from(user), document);
        match inner.permissions.entry(key) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if existing.recipient_type == RecipientType::Guest {
                    return Err(StoreError::UniqueConflict(format!(
                        "principal {} holds a guest permission on document {}",
                        user, document
                    )));
                }
                existing.level = level;
                existing.last_modified_at = now;
            }
            Entry::Vacant(entry) => {
                entry.insert(Permission {
                    document_id: document,
                    recipient_id: user.into(),
                    recipient_type: RecipientType::User,
                    level,
                    created_by: user.into(),
                    created_at: now,
                    last_modified_at: now,
                });
            }
        }
        Ok(())
    }

    async fn update_permission_guest(&self, guest: GuestId, level: PermissionLevel) -> Result<()> {
        let mut inner = self.write("update guest permission")?;
        let not_found = || StoreError::NotFound(format!("permission of guest {}", guest));

        let document = inner.guests.get(&guest).ok_or_else(not_found)?.document_id;
        let perm = inner
            .permissions
            .get_mut(&(PrincipalId::from(guest), document))
            .filter(|perm| perm.recipient_type == RecipientType::Guest)
            .ok_or_else(not_found)?;

        perm.level = level;
        perm.last_modified_at = time::now();
        Ok(())
    }

    async fn get_permission_of_principal_on_document(
        &self,
        document: DocumentId,
        principal: PrincipalId,
    ) -> Result<Permission> {
        let inner = self.read("get permission")?;
        inner
            .permissions
            .get(&(principal, document))
            .cloned()
            .ok_or_else(|| permission_not_found(principal, document))
    }

    async fn delete_permissions_principal(
        &self,
        principal: PrincipalId,
        document: DocumentId,
    ) -> Result<()> {
        let mut inner = self.write("delete permission")?;
        inner
            .permissions
            .remove(&(principal, document))
            .map(|_| ())
            .ok_or_else(|| permission_not_found(principal, document))
    }

    async fn list_permissions_on_document(
        &self,
        document: DocumentId,
        levels: &[PermissionLevel],
        cursor: Cursor,
        page_size: u32,
    ) -> Result<Page<Permission>> {
        let (filter, size) = pagination::validate(levels, page_size)?;
        let inner = self.read("list permissions on document")?;
        if !inner.documents.contains_key(&document) {
            return Err(document_not_found(document));
        }

        let rows = inner
            .permissions
            .values()
            .filter(|perm| perm.document_id == document && filter.contains(perm.level))
            .cloned()
            .collect();
        Ok(page_of(rows, &cursor, size))
    }

    async fn list_documents_by_principal(
        &self,
        principal: PrincipalId,
        levels: &[PermissionLevel],
        cursor: Cursor,
        page_size: u32,
    ) -> Result<Page<DocumentPermission>> {
        let (filter, size) = pagination::validate(levels, page_size)?;
        let inner = self.read("list documents by principal")?;

        let rows = inner
            .permissions
            .range((principal, DocumentId(Uuid::nil()))..)
            .take_while(|((recipient, _), _)| *recipient == principal)
            .filter(|(_, perm)| filter.contains(perm.level))
            .filter_map(|((_, document), perm)| {
                inner.documents.get(document).map(|doc| DocumentPermission {
                    document: doc.clone(),
                    level: perm.level,
                })
            })
            .collect();
        Ok(page_of(rows, &cursor, size))
    }

    async fn create_guest(
        &self,
        creator: PrincipalId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<GuestId> {
        let mut inner = self.write("create guest")?;
        if !inner.documents.contains_key(&document) {
            return Err(document_not_found(document));
        }

        let guest = GuestId::new_v4();
        let key = (PrincipalId::from(guest), document);
        if inner.guests.contains_key(&guest) || inner.permissions.contains_key(&key) {
            return Err(StoreError::UniqueConflict(format!(
                "create guest: guest {} already exists",
                guest
            )));
        }

        let now = time::now();
        inner.guests.insert(
            guest,
            Guest {
                id: guest,
                document_id: document,
                created_by: creator,
                created_at: now,
            },
        );
        inner.permissions.insert(
            key,
            Permission {
                document_id: document,
                recipient_id: guest.into(),
                recipient_type: RecipientType::Guest,
                level,
                created_by: creator,
                created_at: now,
                last_modified_at: now,
            },
        );

        debug!(guest = %guest, document = %document, level = %level, "created guest");
        Ok(guest)
    }

    async fn get_guest(&self, guest: GuestId) -> Result<Guest> {
        let inner = self.read("get guest")?;
        inner
            .guests
            .get(&guest)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("guest {}", guest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use docshare_core::SortField;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let owner = UserId::new_v4();
        let id = store
            .create_document(owner, DocumentFields::named("notes"))
            .await
            .unwrap();

        assert_eq!(store.get_document(id).await.unwrap().name.as_deref(), Some("notes"));
        let perm = store
            .get_permission_of_principal_on_document(id, owner.into())
            .await
            .unwrap();
        assert_eq!(perm.level, PermissionLevel::Owner);
    }

    #[tokio::test]
    async fn test_list_documents_only_for_principal() {
        let store = MemoryStore::new();
        let alice = UserId::new_v4();
        let bob = UserId::new_v4();
        let a = store.create_document(alice, DocumentFields::default()).await.unwrap();
        store.create_document(bob, DocumentFields::default()).await.unwrap();
        store
            .upsert_permission_user(bob, a, PermissionLevel::Viewer)
            .await
            .unwrap();

        let page = store
            .list_documents_by_principal(
                bob.into(),
                &PermissionLevel::ALL,
                Cursor::beginning(SortField::CreatedAt),
                10,
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);

        let viewer_only = store
            .list_documents_by_principal(
                bob.into(),
                &[PermissionLevel::Viewer],
                Cursor::beginning(SortField::CreatedAt),
                10,
            )
            .await
            .unwrap();
        assert_eq!(viewer_only.items.len(), 1);
        assert_eq!(viewer_only.items[0].document.id, a);
    }

    #[tokio::test]
    async fn test_guest_conflict_on_user_upsert() {
        let store = MemoryStore::new();
        let owner = UserId::new_v4();
        let id = store.create_document(owner, DocumentFields::default()).await.unwrap();
        let guest = store
            .create_guest(owner.into(), id, PermissionLevel::Viewer)
            .await
            .unwrap();

        let err = store
            .upsert_permission_user(UserId(guest.0), id, PermissionLevel::Editor)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UniqueConflict);
    }

    #[tokio::test]
    async fn test_delete_missing_document_changes_nothing() {
        let store = MemoryStore::new();
        let owner = UserId::new_v4();
        let id = store.create_document(owner, DocumentFields::default()).await.unwrap();

        assert!(store
            .delete_document(DocumentId::new_v4())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.get_document(id).await.is_ok());
    }
}
