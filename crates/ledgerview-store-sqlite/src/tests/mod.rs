//! Integration tests for `SqliteStore` against an in-memory database.

mod ledger;
mod ratings;
mod utxo;

use chrono::{DateTime, Utc};
use ledgerview_core::{
  block::{BlockTx, ConnectedBlock},
  entity::NewTransaction,
  outcome::{IndexReport, WriteOutcome},
  payload::{
    AccountRole, CommentAction, ContentFormat, ScoreTarget, SubscribeMode,
    TxPayload,
  },
  store::{ChainIndexer, LedgerStore},
};
use tokio_util::sync::CancellationToken;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A store on a real file under `dir`, for tests that need WAL or a reopen.
async fn file_store(dir: &tempfile::TempDir, shutdown: CancellationToken) -> SqliteStore {
  SqliteStore::open(dir.path().join("index.db"), shutdown)
    .await
    .expect("file store")
}

fn at(secs: i64) -> DateTime<Utc> {
  DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
}

// ─── Transaction fixtures ────────────────────────────────────────────────────

fn account(hash: &str, address: &str) -> NewTransaction {
  NewTransaction::new(hash, at(0), TxPayload::Account {
    role:     AccountRole::User,
    address:  address.into(),
    referrer: None,
  })
}

/// A post revision; `root` equals `hash` for the original.
fn post(hash: &str, author: &str, root: &str) -> NewTransaction {
  NewTransaction::new(hash, at(1), TxPayload::Content {
    format:   ContentFormat::Post,
    address:  author.into(),
    root_tx:  root.into(),
    relay_tx: None,
  })
}

fn score(hash: &str, voter: &str, target: &str, value: i64) -> NewTransaction {
  NewTransaction::new(hash, at(2), TxPayload::Score {
    target: ScoreTarget::Content,
    address: voter.into(),
    target_tx: target.into(),
    value,
  })
}

/// A comment revision on `content`; `root` equals `hash` for the original.
fn comment(
  hash: &str,
  author: &str,
  root: &str,
  content: &str,
  action: CommentAction,
) -> NewTransaction {
  NewTransaction::new(hash, at(2), TxPayload::Comment {
    action,
    address: author.into(),
    root_tx: root.into(),
    content_tx: content.into(),
    parent_tx: None,
    answer_tx: None,
  })
}

fn comment_score(hash: &str, voter: &str, target: &str, value: i64) -> NewTransaction {
  NewTransaction::new(hash, at(3), TxPayload::Score {
    target: ScoreTarget::Comment,
    address: voter.into(),
    target_tx: target.into(),
    value,
  })
}

fn subscribe(hash: &str, from: &str, to: &str, mode: SubscribeMode) -> NewTransaction {
  NewTransaction::new(hash, at(3), TxPayload::Subscribe {
    mode,
    address: from.into(),
    address_to: to.into(),
  })
}

fn coinbase(hash: &str, address: &str, value: i64) -> NewTransaction {
  NewTransaction::new(hash, at(4), TxPayload::Coinbase).with_output(0, address, value)
}

fn transfer(hash: &str, address: &str, value: i64) -> NewTransaction {
  NewTransaction::new(hash, at(5), TxPayload::Transfer).with_output(0, address, value)
}

// ─── Block helpers ───────────────────────────────────────────────────────────

/// A block confirming `txs` in order, with no spends.
fn block(hash: &str, txs: &[&NewTransaction]) -> ConnectedBlock {
  ConnectedBlock::new(
    hash,
    txs
      .iter()
      .map(|tx| BlockTx::new(tx.hash.clone(), tx.payload.kind()))
      .collect(),
  )
}

async fn ingest(s: &SqliteStore, txs: &[&NewTransaction]) {
  let outcome = s
    .insert_transactions(txs.iter().map(|tx| (*tx).clone()).collect())
    .await
    .unwrap();
  assert_eq!(outcome, WriteOutcome::Applied);
}

async fn index(s: &SqliteStore, block: &ConnectedBlock, height: i64) -> IndexReport {
  s.index_block(block, height)
    .await
    .unwrap()
    .finished()
    .expect("indexing finished")
}

async fn short_id(s: &SqliteStore, hash: &str) -> Option<i64> {
  s.transaction(hash).await.unwrap().expect("transaction exists").short_id
}

// ─── Observable state ────────────────────────────────────────────────────────

/// Everything a reader can observe, in a stable order.
#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
  transactions: Vec<(String, Option<String>, Option<i64>, Option<i64>, bool, Option<i64>)>,
  outputs:      Vec<(String, i64, Option<i64>, Option<i64>, Option<String>)>,
  ratings:      Vec<(i64, i64, i64, i64)>,
  utxo:         Vec<(String, i64, i64, Option<i64>)>,
}

async fn snapshot(s: &SqliteStore) -> Snapshot {
  s.read(|conn| {
    let transactions = conn
      .prepare(
        "SELECT Hash, BlockHash, BlockNum, Height, Last, Id
         FROM Transactions ORDER BY Hash",
      )?
      .query_map([], |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    let outputs = conn
      .prepare(
        "SELECT TxHash, Number, TxHeight, SpentHeight, SpentTxHash
         FROM TxOutputs ORDER BY TxHash, Number",
      )?
      .query_map([], |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    let ratings = conn
      .prepare(
        "SELECT Type, Height, Id, Value FROM Ratings
         ORDER BY Type, Id, Height, Value",
      )?
      .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    let utxo = conn
      .prepare("SELECT TxId, TxOut, Block, BlockSpent FROM Utxo ORDER BY TxId, TxOut")?
      .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Snapshot { transactions, outputs, ratings, utxo })
  })
  .await
  .unwrap()
}
