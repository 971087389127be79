//! Test fixtures and helpers.
//!
//! Common setup code for store and service tests.

use std::path::Path;

use docshare_core::{DocumentFields, DocumentId, GuestId, PermissionLevel, UserId};
use docshare_store::{DocumentStore, MemoryStore, Result, SqliteStore, StoreConfig};

/// A store plus a user who owns the documents the fixture creates.
pub struct TestFixture<S: DocumentStore = MemoryStore> {
    pub owner: UserId,
    pub store: S,
}

impl TestFixture<MemoryStore> {
    /// Create a fixture over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture<SqliteStore> {
    /// Create a fixture over an in-memory SQLite database.
    pub fn sqlite() -> Result<Self> {
        Ok(Self::with_store(SqliteStore::open_memory()?))
    }

    /// Create a fixture over a SQLite file in `dir`.
    pub fn sqlite_in(dir: &Path) -> Result<Self> {
        let config = StoreConfig::file(dir.join("docshare.db"));
        Ok(Self::with_store(SqliteStore::open(config)?))
    }
}

impl<S: DocumentStore> TestFixture<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            owner: UserId::new_v4(),
            store,
        }
    }

    /// Create a document owned by the fixture's owner.
    pub async fn document(&self, name: &str) -> Result<DocumentId> {
        self.store
            .create_document(self.owner, DocumentFields::named(name))
            .await
    }

    /// Create `count` documents owned by the fixture's owner.
    pub async fn documents(&self, count: usize) -> Result<Vec<DocumentId>> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            ids.push(self.document(&format!("doc-{}", i)).await?);
        }
        Ok(ids)
    }

    /// Grant `level` on `document` to `count` new users.
    pub async fn share_with_users(
        &self,
        document: DocumentId,
        count: usize,
        level: PermissionLevel,
    ) -> Result<Vec<UserId>> {
        let mut users = Vec::with_capacity(count);
        for _ in 0..count {
            let user = UserId::new_v4();
            self.store
                .upsert_permission_user(user, document, level)
                .await?;
            users.push(user);
        }
        Ok(users)
    }

    /// Mint a guest on `document`, created by the fixture's owner.
    pub async fn guest(&self, document: DocumentId, level: PermissionLevel) -> Result<GuestId> {
        self.store
            .create_guest(self.owner.into(), document, level)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_documents_are_owned() {
        let fixture = TestFixture::new();
        let ids = fixture.documents(3).await.unwrap();
        assert_eq!(ids.len(), 3);

        for id in ids {
            let perm = fixture
                .store
                .get_permission_of_principal_on_document(id, fixture.owner.into())
                .await
                .unwrap();
            assert_eq!(perm.level, PermissionLevel::Owner);
        }
    }

    #[tokio::test]
    async fn test_fixture_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = TestFixture::sqlite_in(dir.path()).unwrap();
        let doc = fixture.document("on disk").await.unwrap();
        let users = fixture
            .share_with_users(doc, 2, PermissionLevel::Viewer)
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert!(dir.path().join("docshare.db").exists());
    }
}
