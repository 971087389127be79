//! # Docshare Store
//!
//! Storage abstraction for Docshare. Provides a trait-based interface for
//! documents, permissions, and guest principals with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store abstracts persistence behind the [`DocumentStore`] trait. The
//! primary implementation is [`SqliteStore`], with [`MemoryStore`] for tests.
//! Every failure is one of four [`ErrorKind`]s.
//!
//! ## Key Types
//!
//! - [`DocumentStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage with a connection pool
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`StoreConfig`] - Database location, pool size, and timeouts
//! - [`StoreError`] - Classified failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docshare_core::{Cursor, DocumentFields, PermissionLevel, SortField, UserId};
//! use docshare_store::{DocumentStore, SqliteStore, StoreConfig};
//!
//! async fn example() -> docshare_store::Result<()> {
//!     // Open a SQLite database configured from DOCSHARE_* variables
//!     let store = SqliteStore::open(StoreConfig::from_env())?;
//!
//!     let owner = UserId::new_v4();
//!     let doc = store
//!         .create_document(owner, DocumentFields::named("Q3 plan"))
//!         .await?;
//!
//!     let page = store
//!         .list_documents_by_principal(
//!             owner.into(),
//!             &PermissionLevel::ALL,
//!             Cursor::beginning(SortField::CreatedAt),
//!             10,
//!         )
//!         .await?;
//!     assert_eq!(page.items[0].document.id, doc);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Owner on create**: a document and its Owner permission are written together
//! - **Guests outlive permissions**: deleting a guest's permission keeps its Guest row
//! - **Cancellation**: a timed-out or dropped operation rolls back its transaction

pub mod config;
pub mod error;
pub mod memory;
pub mod migration;
mod pagination;
mod pool;
pub mod sqlite;
pub mod traits;
mod tx;

pub use config::{Database, StoreConfig};
pub use error::{BackendError, ErrorKind, Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::DocumentStore;
