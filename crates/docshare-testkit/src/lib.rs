//! # Docshare Testkit
//!
//! Testing utilities for Docshare.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Pinned cursor tokens so the client-facing encoding never drifts
//! - **Generators**: Proptest strategies for cursors, levels, and document fields
//! - **Fixtures**: A store plus an owning user, with helpers to populate it
//! - **Conformance**: One suite of behavioral checks every store must pass
//!
//! ## Golden Vectors
//!
//! ```rust
//! use docshare_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, token) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, token);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docshare_testkit::generators::cursor;
//!
//! proptest! {
//!     #[test]
//!     fn token_roundtrip(c in cursor()) {
//!         prop_assert_eq!(Cursor::from_token(&c.to_token()).unwrap(), c);
//!     }
//! }
//! ```
//!
//! ## Conformance
//!
//! ```rust,ignore
//! use docshare_store::SqliteStore;
//! use docshare_testkit::conformance;
//!
//! #[tokio::test]
//! async fn sqlite_conforms() {
//!     conformance::run_all(|| SqliteStore::open_memory().unwrap()).await;
//! }
//! ```

pub mod conformance;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::TestFixture;
