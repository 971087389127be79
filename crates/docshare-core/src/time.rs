//! Timestamp helpers.
//!
//! All timestamps handled by Docshare carry microsecond precision. Persisted
//! values and cursor tokens store whole microseconds since the Unix epoch, so a
//! timestamp read back from either is identical to the one written.

use chrono::{DateTime, SubsecRound, Utc};

use crate::error::CoreError;

/// Current time truncated to microseconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Microseconds since the Unix epoch.
pub fn to_micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Inverse of [`to_micros`].
pub fn from_micros(micros: i64) -> Result<DateTime<Utc>, CoreError> {
    DateTime::from_timestamp_micros(micros).ok_or(CoreError::TimestampOutOfRange(micros))
}
