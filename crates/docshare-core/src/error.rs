//! Error types for Docshare core values.

use thiserror::Error;

/// Errors raised while validating or decoding core values.
///
/// All of these describe caller-supplied data and never depend on stored state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("permission level filter must contain at least one level")]
    EmptyLevelFilter,

    #[error("unknown permission level: {0}")]
    UnknownPermissionLevel(String),

    #[error("unknown recipient type: {0}")]
    UnknownRecipientType(String),

    #[error("unknown sort field: {0}")]
    UnknownSortField(u8),

    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error("malformed cursor: {0}")]
    MalformedCursor(String),

    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),
}
