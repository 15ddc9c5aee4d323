//! Transaction plumbing shared by every write path.
//!
//! Each write runs as one closure on the connection thread. The closure opens
//! an `IMMEDIATE` transaction so the database write lock is taken up front,
//! and the transaction is either committed or explicitly rolled back before
//! the result leaves the closure.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::Result;

/// Result of a unit of work that honours shutdown. `None` means shutdown was
/// observed and the work was abandoned.
pub type Interruptible<T> = Option<T>;

/// Run `f` inside one transaction.
///
/// Commits when `f` returns `Ok(Some(_))`. Rolls back when `f` returns
/// `Ok(None)` (shutdown) or `Err`, so a failed or interrupted call never
/// leaves a partial effect behind.
pub fn atomically<T>(
  conn: &mut Connection,
  f: impl FnOnce(&Transaction<'_>) -> Result<Interruptible<T>>,
) -> Result<Interruptible<T>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  match f(&tx) {
    Ok(Some(value)) => {
      tx.commit()?;
      Ok(Some(value))
    }
    Ok(None) => {
      tx.rollback()?;
      Ok(None)
    }
    Err(e) => {
      if let Err(abort) = tx.rollback() {
        tracing::error!(error = %abort, "transaction rollback failed");
      }
      Err(e)
    }
  }
}

