//! # Docshare
//!
//! Access control for shared documents: documents, per-principal permissions,
//! and guest principals minted for share links.
//!
//! ## Overview
//!
//! Docshare provides:
//!
//! - **Documents**: metadata records whose ownership is a permission row
//! - **Permissions**: one level (Owner, Editor, Viewer) per principal per document
//! - **Guests**: principals scoped to a single document
//! - **Listings**: keyset pages resumable from an opaque cursor token
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docshare::{DocumentService, ServiceConfig};
//! use docshare::core::{DocumentFields, PermissionLevel, UserId};
//! use docshare::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open_file("docshare.db").unwrap();
//!     let service = DocumentService::new(store, ServiceConfig::default());
//!
//!     let owner = UserId::new_v4();
//!     let doc = service
//!         .create_document(owner, DocumentFields::named("handbook"))
//!         .await
//!         .unwrap();
//!
//!     let reviewer = UserId::new_v4();
//!     service
//!         .upsert_permission_user(reviewer, doc, PermissionLevel::Editor)
//!         .await
//!         .unwrap();
//!
//!     let page = service
//!         .list_permissions_on_document(doc, &[], None, None)
//!         .await
//!         .unwrap();
//!     let token = page.next_cursor.to_token();
//!     // hand `token` to the client to fetch the next page
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `docshare::core` - Identifiers, records, cursors
//! - `docshare::store` - Storage abstraction, SQLite and in-memory stores

pub mod service;

pub use docshare_core as core;
pub use docshare_store as store;

pub use service::{decode_cursor, DocumentService, ServiceConfig};

pub use docshare_core::{
    Cursor, Document, DocumentFields, DocumentId, DocumentPermission, Guest, GuestId, Page,
    Permission, PermissionLevel, Principal, PrincipalId, SortField, UserId,
};
pub use docshare_store::{DocumentStore, ErrorKind, Result, StoreError};
