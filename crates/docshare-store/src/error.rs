//! Error types for the store module.
//!
//! Every store operation fails with exactly one [`StoreError`] variant. Backend
//! failures are classified where they happen: constraint violations become
//! [`StoreError::UniqueConflict`] or [`StoreError::NotFound`], everything else
//! is wrapped in [`StoreError::Repository`]. The `Display` text of a repository
//! error names only the operation; backend detail is kept behind
//! [`std::error::Error::source`].

use docshare_core::CoreError;
use rusqlite::ffi;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced document, permission, or guest does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated and not resolved by an upsert.
    #[error("unique conflict: {0}")]
    UniqueConflict(String),

    /// Caller-supplied data failed a precondition. Never depends on stored state.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected backend failure.
    #[error("repository error: {context}")]
    Repository {
        context: String,
        #[source]
        source: BackendError,
    },
}

/// Underlying cause of a [`StoreError::Repository`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The operation was cancelled or ran past its deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The blocking worker running the operation failed.
    #[error("worker task failed: {0}")]
    Task(String),

    /// No pooled connection could be checked out or opened.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A lock guarding in-memory state was poisoned.
    #[error("lock poisoned")]
    Poisoned,

    /// A stored value could not be decoded.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(String),
}

/// The four failure kinds, for exhaustive matching by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    UniqueConflict,
    InvalidInput,
    Repository,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::UniqueConflict(_) => ErrorKind::UniqueConflict,
            StoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            StoreError::Repository { .. } => ErrorKind::Repository,
        }
    }

    /// Wrap a backend failure with the operation it interrupted.
    pub fn repository(context: impl Into<String>, source: impl Into<BackendError>) -> Self {
        StoreError::Repository {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn deadline(context: impl Into<String>) -> Self {
        Self::repository(context, BackendError::DeadlineExceeded)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::repository("database operation failed", e)
    }
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        StoreError::InvalidInput(e.to_string())
    }
}

/// Classify a SQLite error raised by a write.
///
/// Unique and primary-key violations become `UniqueConflict`, foreign-key
/// violations become `NotFound` (the referenced row is missing), and anything
/// else becomes `Repository`.
pub(crate) fn classify(err: rusqlite::Error, context: &str) -> StoreError {
    let extended = match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    };

    match extended {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            StoreError::UniqueConflict(format!("{}: row already exists", context))
        }
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            StoreError::NotFound(format!("{}: referenced document does not exist", context))
        }
        _ => StoreError::repository(context.to_string(), err),
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn constraint(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some("constraint failed".into()),
        )
    }

    #[test]
    fn test_classify_unique() {
        let err = classify(constraint(ffi::SQLITE_CONSTRAINT_UNIQUE), "create guest");
        assert_eq!(err.kind(), ErrorKind::UniqueConflict);
        let err = classify(constraint(ffi::SQLITE_CONSTRAINT_PRIMARYKEY), "create guest");
        assert_eq!(err.kind(), ErrorKind::UniqueConflict);
    }

    #[test]
    fn test_classify_foreign_key() {
        let err = classify(constraint(ffi::SQLITE_CONSTRAINT_FOREIGNKEY), "create guest");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_classify_other_is_repository() {
        let err = classify(constraint(ffi::SQLITE_CONSTRAINT_CHECK), "upsert");
        assert_eq!(err.kind(), ErrorKind::Repository);
        let err = classify(rusqlite::Error::QueryReturnedNoRows, "upsert");
        assert_eq!(err.kind(), ErrorKind::Repository);
    }

    #[test]
    fn test_repository_display_hides_backend_detail() {
        let err = StoreError::repository(
            "get document",
            rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_ERROR),
                Some("no such table: documents_v0 near SELECT".into()),
            ),
        );
        assert_eq!(err.to_string(), "repository error: get document");
        assert!(err.source().unwrap().to_string().contains("documents_v0"));
    }

    #[test]
    fn test_core_errors_are_invalid_input() {
        let err: StoreError = CoreError::EmptyLevelFilter.into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
