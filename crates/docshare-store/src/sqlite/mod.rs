//! SQLite implementation of the DocumentStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite
//! behind an r2d2 connection pool, and runs every statement on a blocking
//! worker via `tokio::task::spawn_blocking`.

mod documents;
mod guests;
mod permissions;
mod rows;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::Connection;
use tracing::warn;

use docshare_core::{
    Cursor, Document, DocumentFields, DocumentId, DocumentPermission, Guest, GuestId, Page,
    Permission, PermissionLevel, PrincipalId, UserId,
};

use crate::config::StoreConfig;
use crate::error::{BackendError, Result, StoreError};
use crate::pagination;
use crate::pool::{self, ConnectionPool};
use crate::traits::DocumentStore;
use crate::tx::CancelFlag;

/// SQLite-based store implementation.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: ConnectionPool,
    operation_timeout: Duration,
}

impl SqliteStore {
    /// Open a store with the given configuration.
    ///
    /// Creates the database file if needed and runs migrations. Blocking.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let pool = pool::open(&config)?;
        Ok(Self {
            pool,
            operation_timeout: config.operation_timeout,
        })
    }

    /// Open a SQLite database file with default settings.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(StoreConfig::file(path.as_ref()))
    }

    /// Open a private in-memory database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::open(StoreConfig::memory())
    }

    /// Run blocking work on a pooled connection under the operation deadline.
    ///
    /// The checkout blocks, so it happens on the worker too. If the deadline
    /// passes, or the returned future is dropped, the work is told to stop at
    /// its next statement and any open transaction rolls back.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &CancelFlag) -> Result<T> + Send + 'static,
    {
        let cancel = CancelFlag::new();
        let _guard = cancel.guard();

        let pool = self.pool.clone();
        let flag = cancel.clone();
        let work = tokio::task::spawn_blocking(move || {
            flag.check(op)?;
            let mut conn = pool.get().map_err(|e| StoreError::repository(op, e))?;
            flag.check(op)?;
            f(&mut conn, &flag)
        });

        match tokio::time::timeout(self.operation_timeout, work).await {
            Ok(joined) => joined
                .map_err(|e| StoreError::repository(op, BackendError::Task(e.to_string())))?,
            Err(_) => {
                warn!(op, timeout = ?self.operation_timeout, "store operation timed out");
                Err(StoreError::deadline(op))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create_document(&self, creator: UserId, fields: DocumentFields) -> Result<DocumentId> {
        self.run("create document", move |conn, cancel| {
            documents::create(conn, cancel, creator, &fields)
        })
        .await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.run("get document", move |conn, _| documents::get(conn, id))
            .await
    }

    async fn update_document(&self, id: DocumentId, fields: DocumentFields) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.run("update document", move |conn, _| {
            documents::update(conn, id, &fields)
        })
        .await
    }

    async fn delete_document(&self, id: DocumentId) -> Result<()> {
        self.run("delete document", move |conn, cancel| {
            documents::delete(conn, cancel, id)
        })
        .await
    }

    async fn upsert_permission_user(
        &self,
        user: UserId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<()> {
        self.run("upsert user permission", move |conn, _| {
            permissions::upsert_user(conn, user, document, level)
        })
        .await
    }

    async fn update_permission_guest(&self, guest: GuestId, level: PermissionLevel) -> Result<()> {
        self.run("update guest permission", move |conn, _| {
            permissions::update_guest(conn, guest, level)
        })
        .await
    }

    async fn get_permission_of_principal_on_document(
        &self,
        document: DocumentId,
        principal: PrincipalId,
    ) -> Result<Permission> {
        self.run("get permission", move |conn, _| {
            permissions::get(conn, document, principal)
        })
        .await
    }

    async fn delete_permissions_principal(
        &self,
        principal: PrincipalId,
        document: DocumentId,
    ) -> Result<()> {
        self.run("delete permission", move |conn, _| {
            permissions::delete(conn, principal, document)
        })
        .await
    }

    async fn list_permissions_on_document(
        &self,
        document: DocumentId,
        levels: &[PermissionLevel],
        cursor: Cursor,
        page_size: u32,
    ) -> Result<Page<Permission>> {
        let (filter, size) = pagination::validate(levels, page_size)?;
        self.run("list permissions on document", move |conn, cancel| {
            permissions::list_on_document(conn, cancel, document, &filter, &cursor, size)
        })
        .await
    }

    async fn list_documents_by_principal(
        &self,
        principal: PrincipalId,
        levels: &[PermissionLevel],
        cursor: Cursor,
        page_size: u32,
    ) -> Result<Page<DocumentPermission>> {
        let (filter, size) = pagination::validate(levels, page_size)?;
        self.run("list documents by principal", move |conn, _| {
            permissions::list_documents(conn, principal, &filter, &cursor, size)
        })
        .await
    }

    async fn create_guest(
        &self,
        creator: PrincipalId,
        document: DocumentId,
        level: PermissionLevel,
    ) -> Result<GuestId> {
        self.run("create guest", move |conn, cancel| {
            guests::create(conn, cancel, creator, document, level)
        })
        .await
    }

    async fn get_guest(&self, guest: GuestId) -> Result<Guest> {
        self.run("get guest", move |conn, _| guests::get(conn, guest))
            .await
    }
}
