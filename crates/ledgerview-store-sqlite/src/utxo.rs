//! [`UtxoIndex`] impl over the `Utxo` table.

use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

use ledgerview_core::{
  outcome::WriteOutcome,
  store::UtxoIndex,
  utxo::{AddressBalance, Utxo},
};

use crate::{
  encode::{encode_time, RawUtxo, UTXO_COLUMNS},
  store::{stopped_or, SqliteStore},
  txn::{atomically, Interruptible},
  Error, Result,
};

fn insert_one(conn: &Connection, utxo: &Utxo) -> Result<usize> {
  let inserted = conn
    .prepare_cached(
      "INSERT INTO Utxo (TxId, Block, TxOut, TxTime, Address, BlockSpent, Amount)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
       ON CONFLICT (TxId, TxOut) DO NOTHING",
    )?
    .execute(rusqlite::params![
      utxo.tx_id,
      utxo.block,
      utxo.output_index,
      encode_time(utxo.time),
      utxo.address,
      utxo.block_spent,
      utxo.amount,
    ])?;
  Ok(inserted)
}

fn spend_one(conn: &Connection, utxo: &Utxo) -> Result<usize> {
  let Some(block_spent) = utxo.block_spent else {
    return Err(Error::MissingSpendHeight {
      tx_id:        utxo.tx_id.clone(),
      output_index: utxo.output_index,
    });
  };

  let changed = conn
    .prepare_cached(
      "UPDATE Utxo SET BlockSpent = ?1 WHERE TxId = ?2 AND TxOut = ?3",
    )?
    .execute(rusqlite::params![block_spent, utxo.tx_id, utxo.output_index])?;
  if changed == 0 {
    return Err(Error::UtxoNotFound {
      tx_id:        utxo.tx_id.clone(),
      output_index: utxo.output_index,
    });
  }
  Ok(changed)
}

/// Apply `op` to every record in one transaction, checking for shutdown
/// before each record. Any error rolls the whole batch back.
fn apply_batch(
  conn: &mut Connection,
  shutdown: &CancellationToken,
  utxos: &[Utxo],
  op: fn(&Connection, &Utxo) -> Result<usize>,
) -> Result<Interruptible<WriteOutcome>> {
  atomically(conn, |tx| {
    let mut changes = 0;
    for utxo in utxos {
      if shutdown.is_cancelled() {
        return Ok(None);
      }
      changes += op(tx, utxo)?;
    }
    Ok(Some(WriteOutcome::from_changes(changes)))
  })
}

impl UtxoIndex for SqliteStore {
  type Error = Error;

  async fn insert(&self, utxo: &Utxo) -> Result<WriteOutcome> {
    let utxo = utxo.clone();
    let outcome = self
      .write(move |conn, _| {
        atomically(conn, |tx| {
          Ok(Some(WriteOutcome::from_changes(insert_one(tx, &utxo)?)))
        })
      })
      .await?;
    Ok(stopped_or(outcome))
  }

  async fn spent(&self, utxo: &Utxo) -> Result<WriteOutcome> {
    let utxo = utxo.clone();
    let outcome = self
      .write(move |conn, _| {
        atomically(conn, |tx| {
          Ok(Some(WriteOutcome::from_changes(spend_one(tx, &utxo)?)))
        })
      })
      .await?;
    Ok(stopped_or(outcome))
  }

  async fn bulk_insert(&self, utxos: &[Utxo]) -> Result<WriteOutcome> {
    let utxos = utxos.to_vec();
    let count = utxos.len();
    let outcome = self
      .write(move |conn, shutdown| apply_batch(conn, shutdown, &utxos, insert_one))
      .await?;
    let outcome = stopped_or(outcome);
    tracing::debug!(count, ?outcome, "bulk utxo insert");
    Ok(outcome)
  }

  async fn bulk_spent(&self, utxos: &[Utxo]) -> Result<WriteOutcome> {
    let utxos = utxos.to_vec();
    let count = utxos.len();
    let outcome = self
      .write(move |conn, shutdown| apply_batch(conn, shutdown, &utxos, spend_one))
      .await?;
    let outcome = stopped_or(outcome);
    tracing::debug!(count, ?outcome, "bulk utxo spend");
    Ok(outcome)
  }

  async fn clear_all(&self) -> Result<WriteOutcome> {
    let outcome = self
      .write(|conn, _| {
        atomically(conn, |tx| {
          let deleted = tx.execute("DELETE FROM Utxo", [])?;
          tracing::info!(deleted, "cleared utxo index");
          Ok(Some(WriteOutcome::from_changes(deleted)))
        })
      })
      .await?;
    Ok(stopped_or(outcome))
  }

  async fn utxos_by_address(
    &self,
    address: &str,
    include_spent: bool,
  ) -> Result<Vec<Utxo>> {
    let address = address.to_owned();

    let raws: Vec<RawUtxo> = self
      .read(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {UTXO_COLUMNS} FROM Utxo
           WHERE Address = ?1
             AND (?2 OR BlockSpent IS NULL)
           ORDER BY Block, TxId, TxOut"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![address, include_spent], RawUtxo::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUtxo::into_utxo).collect()
  }

  async fn balance(&self, address: &str) -> Result<i64> {
    let address = address.to_owned();
    self
      .read(move |conn| {
        Ok(
          conn
            .prepare_cached(
              "SELECT coalesce(sum(Amount), 0) FROM Utxo
               WHERE Address = ?1 AND BlockSpent IS NULL",
            )?
            .query_row(rusqlite::params![address], |r| r.get(0))?,
        )
      })
      .await
  }

  async fn top_addresses(&self, count: usize) -> Result<Vec<AddressBalance>> {
    let limit = i64::try_from(count).unwrap_or(i64::MAX);
    self
      .read(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT Address, sum(Amount) AS Balance FROM Utxo
           WHERE BlockSpent IS NULL
           GROUP BY Address
           ORDER BY Balance DESC, Address
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |r| {
            Ok(AddressBalance { address: r.get(0)?, balance: r.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
  }
}
