//! # Docshare Core
//!
//! Value types for the Docshare access-control store: identifiers, principals,
//! permission levels, document and permission records, and keyset cursors.
//!
//! This crate performs no I/O. Storage lives in `docshare-store`.
//!
//! ## Key Types
//!
//! - [`Principal`] - A user or guest that can hold a permission
//! - [`PermissionLevel`] - Owner, Editor, or Viewer
//! - [`Document`], [`Permission`], [`Guest`] - Stored records
//! - [`Cursor`] - Client-held position in a keyset listing
//!
//! ## Cursors
//!
//! ```rust
//! use docshare_core::{Cursor, SortField};
//!
//! let cursor = Cursor::beginning(SortField::CreatedAt);
//! let token = cursor.to_token();
//! assert_eq!(Cursor::from_token(&token).unwrap(), cursor);
//! ```

pub mod cursor;
pub mod document;
pub mod error;
pub mod principal;
pub mod time;
pub mod types;

pub use cursor::{Cursor, Keyed, Page, PageSize, SortField, CURSOR_LEN, CURSOR_VERSION};
pub use document::{Document, DocumentFields, DocumentPermission, Guest, Permission};
pub use error::CoreError;
pub use principal::{LevelFilter, PermissionLevel, Principal, RecipientType};
pub use types::{DocumentId, GuestId, PrincipalId, UserId, MAX_UUID};
