//! Scoped transactions and cancellation.
//!
//! A store operation runs on a blocking worker while its caller awaits it. If
//! the caller's future is dropped or the operation deadline passes, the
//! worker keeps running. The two sides share a [`CancelFlag`]; the async side
//! holds a [`CancelGuard`] that raises the flag when dropped, and the blocking
//! side checks it before every statement and before commit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use crate::error::{ErrorKind, Result, StoreError};

/// Shared cancellation signal for one operation.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fail with a deadline error if the operation was cancelled.
    pub(crate) fn check(&self, op: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(StoreError::deadline(op));
        }
        Ok(())
    }

    /// A guard that cancels this flag when dropped.
    pub(crate) fn guard(&self) -> CancelGuard {
        CancelGuard { flag: self.clone() }
    }
}

/// Raises its [`CancelFlag`] on drop.
///
/// Held by the awaiting side. Once the blocking work has finished, raising the
/// flag has no effect.
pub(crate) struct CancelGuard {
    flag: CancelFlag,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.flag.cancel();
    }
}

/// An open write transaction that checks for cancellation before each use.
pub(crate) struct Tx<'a> {
    inner: Transaction<'a>,
    cancel: &'a CancelFlag,
    op: &'a str,
}

impl Tx<'_> {
    /// The connection to issue the next statement on.
    pub(crate) fn conn(&self) -> Result<&Connection> {
        self.cancel.check(self.op)?;
        Ok(&*self.inner)
    }

    /// Operation name, for error context.
    pub(crate) fn op(&self) -> &str {
        self.op
    }
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction.
///
/// Commits when `f` succeeds and the operation is still live. Any error,
/// including cancellation noticed before commit, rolls the whole transaction
/// back.
pub(crate) fn run_in_transaction<T>(
    conn: &mut Connection,
    cancel: &CancelFlag,
    op: &str,
    f: impl FnOnce(&Tx<'_>) -> Result<T>,
) -> Result<T> {
    run(conn, cancel, op, TransactionBehavior::Immediate, f)
}

/// Run several reads against one consistent snapshot.
///
/// Takes no write lock. Cancellation and errors behave as in
/// [`run_in_transaction`].
pub(crate) fn read_snapshot<T>(
    conn: &mut Connection,
    cancel: &CancelFlag,
    op: &str,
    f: impl FnOnce(&Tx<'_>) -> Result<T>,
) -> Result<T> {
    run(conn, cancel, op, TransactionBehavior::Deferred, f)
}

fn run<T>(
    conn: &mut Connection,
    cancel: &CancelFlag,
    op: &str,
    behavior: TransactionBehavior,
    f: impl FnOnce(&Tx<'_>) -> Result<T>,
) -> Result<T> {
    cancel.check(op)?;
    let inner = conn
        .transaction_with_behavior(behavior)
        .map_err(|e| StoreError::repository(format!("{}: begin", op), e))?;
    let tx = Tx { inner, cancel, op };

    let outcome = f(&tx).and_then(|value| cancel.check(op).map(|()| value));

    match outcome {
        Ok(value) => {
            tx.inner
                .commit()
                .map_err(|e| StoreError::repository(format!("{}: commit", op), e))?;
            Ok(value)
        }
        Err(err) => {
            if err.kind() == ErrorKind::Repository {
                warn!(op, error = %err, "rolling back transaction");
            } else {
                debug!(op, error = %err, "rolling back transaction");
            }
            if let Err(rollback) = tx.inner.rollback() {
                warn!(op, error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}
