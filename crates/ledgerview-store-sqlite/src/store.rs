//! [`SqliteStore`], the SQLite implementation of the ledgerview traits.
//!
//! This module holds the store handle, the writer discipline shared by every
//! write path, and the [`LedgerStore`] impl. Writes go through one
//! connection and reads through a second, read-only one, so a reader sees
//! the last committed state without waiting for a running write. The indexer, rollback engine,
//! UTXO index and rating ledger live in sibling modules.

use std::{
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use rusqlite::{Connection, OpenFlags, OptionalExtension as _};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use ledgerview_core::{
  entity::{LedgerEntity, NewTransaction, TxOutput},
  outcome::WriteOutcome,
  rating::{ReputationPolicy, StandardReputation},
  store::LedgerStore,
};

use crate::{
  encode::{
    encode_payload, encode_time, RawEntity, RawOutput, ENTITY_COLUMNS,
    OUTPUT_COLUMNS,
  },
  schema::SCHEMA,
  txn::{atomically, Interruptible},
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

pub(crate) type WriteGuard<'a> = MutexGuard<'a, ()>;

/// A chain index backed by a single SQLite file.
///
/// Cloning is cheap; clones share the connections, the writer lock and the
/// shutdown token.
#[derive(Clone)]
pub struct SqliteStore {
  conn:              tokio_rusqlite::Connection,
  /// Read-only connection to the same database.
  reader:            tokio_rusqlite::Connection,
  /// Held for the whole duration of every write. Readers never take it.
  writer:            Arc<Mutex<()>>,
  shutdown:          CancellationToken,
  pub(crate) policy: Arc<dyn ReputationPolicy>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// Writes stop early, returning a stopped outcome, once `shutdown` is
  /// cancelled.
  pub async fn open(
    path: impl AsRef<Path>,
    shutdown: CancellationToken,
  ) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    Self::init(conn, path, shutdown).await
  }

  /// Open an in-memory store with its own shutdown token. Used by tests.
  ///
  /// Each call gets a fresh database, shared between the writer and the
  /// reader connection through SQLite's `memdb` VFS.
  pub async fn open_in_memory() -> Result<Self> {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let name = PathBuf::from(format!(
      "file:/ledgerview-{}-{}?vfs=memdb",
      std::process::id(),
      NEXT.fetch_add(1, Ordering::Relaxed),
    ));
    let conn = tokio_rusqlite::Connection::open_with_flags(
      name.clone(),
      OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .await?;
    Self::init(conn, name, CancellationToken::new()).await
  }

  /// Create the schema through the writer, then open the reader.
  async fn init(
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
    shutdown: CancellationToken,
  ) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    let reader = tokio_rusqlite::Connection::open_with_flags(
      path,
      OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .await?;

    Ok(Self {
      conn,
      reader,
      writer: Arc::new(Mutex::new(())),
      shutdown,
      policy: Arc::new(StandardReputation),
    })
  }

  /// Replace the policy used to turn scores into rating deltas.
  pub fn with_reputation_policy(
    mut self,
    policy: impl ReputationPolicy + 'static,
  ) -> Self {
    self.policy = Arc::new(policy);
    self
  }

  pub fn shutdown_token(&self) -> &CancellationToken { &self.shutdown }

  /// Acquire the writer lock, or `None` if shutdown was requested before or
  /// while waiting for it.
  pub(crate) async fn begin_write(&self) -> Option<WriteGuard<'_>> {
    if self.shutdown.is_cancelled() {
      return None;
    }
    let guard = self.writer.lock().await;
    if self.shutdown.is_cancelled() {
      return None;
    }
    Some(guard)
  }

  /// Run one write step on the connection thread under an already held
  /// writer lock. Returns `None` without touching the store if shutdown has
  /// been requested; the closure receives the token for its own outer loop.
  pub(crate) async fn run_locked<T, F>(
    &self,
    _guard: &WriteGuard<'_>,
    f: F,
  ) -> Result<Interruptible<T>>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection, &CancellationToken) -> Result<Interruptible<T>>
      + Send
      + 'static,
  {
    if self.shutdown.is_cancelled() {
      return Ok(None);
    }
    let shutdown = self.shutdown.clone();
    self.conn.call(move |conn| Ok(f(conn, &shutdown))).await?
  }

  /// [`Self::run_locked`] for a single-step write: takes the lock, runs the
  /// step, releases the lock.
  pub(crate) async fn write<T, F>(&self, f: F) -> Result<Interruptible<T>>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection, &CancellationToken) -> Result<Interruptible<T>>
      + Send
      + 'static,
  {
    let Some(guard) = self.begin_write().await else {
      return Ok(None);
    };
    self.run_locked(&guard, f).await
  }

  /// Run a read closure on the reader connection. It sees the last committed
  /// state and does not wait for the writer lock or a running write.
  pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.reader.call(move |conn| Ok(f(conn))).await?
  }
}

pub(crate) fn stopped_or(outcome: Interruptible<WriteOutcome>) -> WriteOutcome {
  outcome.unwrap_or(WriteOutcome::Stopped)
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_transactions(
    &self,
    txs: Vec<NewTransaction>,
  ) -> Result<WriteOutcome> {
    let count = txs.len();
    let outcome = self
      .write(move |conn, shutdown| {
        atomically(conn, |tx| {
          let mut insert_tx = tx.prepare_cached(
            "INSERT INTO Transactions (
               Type, Hash, Time, Last,
               String1, String2, String3, String4, String5, Int1
             ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (Hash) DO NOTHING",
          )?;
          let mut insert_out = tx.prepare_cached(
            "INSERT INTO TxOutputs (TxHash, Number, AddressHash, Value)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (TxHash, Number) DO NOTHING",
          )?;

          let mut changes = 0;
          for new_tx in &txs {
            if shutdown.is_cancelled() {
              return Ok(None);
            }
            let slots = encode_payload(&new_tx.payload);
            let inserted = insert_tx.execute(rusqlite::params![
              new_tx.payload.kind().code(),
              new_tx.hash,
              encode_time(new_tx.time),
              slots.string1,
              slots.string2,
              slots.string3,
              slots.string4,
              slots.string5,
              slots.int1,
            ])?;
            if inserted == 0 {
              continue;
            }
            changes += inserted;
            for out in &new_tx.outputs {
              changes += insert_out.execute(rusqlite::params![
                new_tx.hash,
                out.number,
                out.address,
                out.value,
              ])?;
            }
          }
          Ok(Some(WriteOutcome::from_changes(changes)))
        })
      })
      .await?;

    let outcome = stopped_or(outcome);
    tracing::debug!(count, ?outcome, "ingested transactions");
    Ok(outcome)
  }

  async fn transaction(&self, hash: &str) -> Result<Option<LedgerEntity>> {
    let hash = hash.to_owned();

    let raw: Option<RawEntity> = self
      .read(move |conn| {
        Ok(
          conn
            .prepare_cached(&format!(
              "SELECT {ENTITY_COLUMNS} FROM Transactions WHERE Hash = ?1"
            ))?
            .query_row(rusqlite::params![hash], RawEntity::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEntity::into_entity).transpose()
  }

  async fn transactions_at_height(&self, height: i64) -> Result<Vec<LedgerEntity>> {
    let raws: Vec<RawEntity> = self
      .read(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {ENTITY_COLUMNS} FROM Transactions
           WHERE Height = ?1
           ORDER BY BlockNum"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![height], RawEntity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntity::into_entity).collect()
  }

  async fn outputs(&self, tx_hash: &str) -> Result<Vec<TxOutput>> {
    let tx_hash = tx_hash.to_owned();

    let raws: Vec<RawOutput> = self
      .read(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {OUTPUT_COLUMNS} FROM TxOutputs
           WHERE TxHash = ?1
           ORDER BY Number"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tx_hash], RawOutput::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOutput::into_output).collect()
  }

  async fn tip_height(&self) -> Result<Option<i64>> {
    self
      .read(|conn| {
        Ok(conn.query_row("SELECT max(Height) FROM Transactions", [], |r| {
          r.get(0)
        })?)
      })
      .await
  }
}
