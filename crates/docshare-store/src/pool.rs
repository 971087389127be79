//! SQLite connection pool.
//!
//! An r2d2 pool over `r2d2_sqlite`. Every connection enables foreign keys and
//! the busy timeout as it is opened; file databases also switch to WAL.
//!
//! An in-memory database exists only inside its one connection, so a memory
//! pool holds exactly that connection and never retires it.

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::config::{Database, StoreConfig};
use crate::error::{Result, StoreError};
use crate::migration;

pub(crate) type ConnectionPool = Pool<SqliteConnectionManager>;

/// Open the pool and bring the schema up to date.
///
/// Blocking: opens and migrates the first connection on the calling thread.
pub(crate) fn open(config: &StoreConfig) -> Result<ConnectionPool> {
    let busy_timeout = config.busy_timeout;
    let builder = ConnectionPool::builder()
        .connection_timeout(config.operation_timeout.max(Duration::from_millis(1)))
        .min_idle(Some(1))
        .error_handler(Box::new(TraceErrors));

    let (manager, builder) = match &config.database {
        Database::Memory => (
            SqliteConnectionManager::memory()
                .with_init(move |conn| configure(conn, busy_timeout, false)),
            builder
                .max_size(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .test_on_check_out(false),
        ),
        Database::File(path) => (
            SqliteConnectionManager::file(path)
                .with_init(move |conn| configure(conn, busy_timeout, true)),
            builder.max_size(pool_size(config.max_connections)),
        ),
    };

    let pool = builder
        .build(manager)
        .map_err(|e| StoreError::repository("open database", e))?;

    let mut conn = pool
        .get()
        .map_err(|e| StoreError::repository("open database", e))?;
    migration::migrate(&mut conn)?;

    debug!(
        size = pool.max_size(),
        memory = matches!(config.database, Database::Memory),
        "opened connection pool"
    );
    Ok(pool)
}

fn pool_size(max_connections: usize) -> u32 {
    u32::try_from(max_connections).unwrap_or(u32::MAX).max(1)
}

/// Per-connection settings. Foreign keys are off by default in SQLite.
fn configure(conn: &Connection, busy_timeout: Duration, wal: bool) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(busy_timeout)?;
    if wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            warn!(mode = %mode, "database did not switch to WAL journaling");
        }
    }
    Ok(())
}

/// Routes pool-side connection errors into tracing.
#[derive(Debug)]
struct TraceErrors;

impl r2d2::HandleError<rusqlite::Error> for TraceErrors {
    fn handle_error(&self, error: rusqlite::Error) {
        warn!(error = %error, "pooled connection error");
    }
}
