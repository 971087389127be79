//! Store configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the SQLite database file. Unset means in-memory.
pub const ENV_DB_PATH: &str = "DOCSHARE_DB_PATH";
/// Environment variable for the connection pool size.
pub const ENV_POOL_MAX_CONNS: &str = "DOCSHARE_POOL_MAX_CONNS";
/// Environment variable for the SQLite busy timeout, in milliseconds.
pub const ENV_BUSY_TIMEOUT_MS: &str = "DOCSHARE_BUSY_TIMEOUT_MS";
/// Environment variable for the per-operation deadline, in milliseconds.
pub const ENV_OPERATION_TIMEOUT_MS: &str = "DOCSHARE_OPERATION_TIMEOUT_MS";

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    /// Private in-memory database, lost on drop. Always a single connection.
    Memory,
    /// SQLite file, created and migrated on open.
    File(PathBuf),
}

/// Configuration for [`SqliteStore`](crate::SqliteStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database: Database,
    /// Upper bound on open connections. Ignored for [`Database::Memory`].
    pub max_connections: usize,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Deadline applied to every operation, including waiting for a connection.
    pub operation_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: Database::Memory,
            max_connections: 8,
            busy_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30),
        }
    }
}

impl StoreConfig {
    /// In-memory configuration with defaults.
    pub fn memory() -> Self {
        Self::default()
    }

    /// File-backed configuration with defaults.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            database: Database::File(path.into()),
            ..Self::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Read configuration from `DOCSHARE_*` environment variables.
    ///
    /// Absent or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            database: lookup(ENV_DB_PATH)
                .filter(|v| !v.trim().is_empty())
                .map(|v| Database::File(PathBuf::from(v)))
                .unwrap_or(Database::Memory),
            max_connections: lookup(ENV_POOL_MAX_CONNS)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            busy_timeout: millis(ENV_BUSY_TIMEOUT_MS, defaults.busy_timeout),
            operation_timeout: millis(ENV_OPERATION_TIMEOUT_MS, defaults.operation_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config.database, Database::Memory);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_reads_values() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/docshare.db"),
            (ENV_POOL_MAX_CONNS, "25"),
            (ENV_OPERATION_TIMEOUT_MS, "1500"),
        ]));
        assert_eq!(
            config.database,
            Database::File(PathBuf::from("/var/lib/docshare.db"))
        );
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.operation_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_POOL_MAX_CONNS, "lots"),
            (ENV_BUSY_TIMEOUT_MS, "-3"),
            (ENV_DB_PATH, "  "),
        ]));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert_eq!(config.database, Database::Memory);
    }
}
