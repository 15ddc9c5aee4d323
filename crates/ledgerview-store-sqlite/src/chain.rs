//! The chain indexer: applies a connected block in four steps.
//!
//! 1. stamp chain position on transactions and their outputs;
//! 2. mark consumed outputs as spent;
//! 3. assign short ids and maintain the `Last` flag;
//! 4. turn confirmed scores into rating ledger records.
//!
//! Each step is its own transaction. Every statement is written so that
//! running a step again over the same block changes nothing, which makes a
//! crashed block safe to re-apply from the start.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
};

use rusqlite::{Connection, OptionalExtension as _};

use ledgerview_core::{
  block::ConnectedBlock,
  kind::{IdentityFamily, RatingKind, RelationFamily, TxKind},
  outcome::{Completion, IndexReport, RollbackReport},
  payload::ScoreTarget,
  rating::{ReputationPolicy, ScoreData},
  store::ChainIndexer,
};

use crate::{
  encode::kind_codes,
  ratings::{append_delta, append_liker},
  rollback::rollback_from,
  store::SqliteStore,
  txn::atomically,
  Error, Result,
};

// ─── Step 1: chain stamping ──────────────────────────────────────────────────

fn stamp(conn: &mut Connection, block: &ConnectedBlock, height: i64) -> Result<usize> {
  let stamped = atomically(conn, |tx| {
    let mut stamp_tx = tx.prepare_cached(
      "UPDATE Transactions SET BlockHash = ?1, BlockNum = ?2, Height = ?3
       WHERE Hash = ?4",
    )?;
    let mut stamp_outputs = tx.prepare_cached(
      "UPDATE TxOutputs SET TxHeight = ?1 WHERE TxHash = ?2",
    )?;

    for (num, btx) in block.txs.iter().enumerate() {
      let changed = stamp_tx.execute(rusqlite::params![
        block.hash,
        num as i64,
        height,
        btx.hash
      ])?;
      if changed == 0 {
        return Err(Error::MissingTransaction(btx.hash.clone()));
      }
      stamp_outputs.execute(rusqlite::params![height, btx.hash])?;
    }
    Ok(Some(block.txs.len()))
  })?;
  Ok(stamped.unwrap_or_default())
}

// ─── Step 2: spends ──────────────────────────────────────────────────────────

fn mark_spent(
  conn: &mut Connection,
  block: &ConnectedBlock,
  height: i64,
) -> Result<usize> {
  let spent = atomically(conn, |tx| {
    let mut spend = tx.prepare_cached(
      "UPDATE TxOutputs SET SpentHeight = ?1, SpentTxHash = ?2
       WHERE TxHash = ?3 AND Number = ?4",
    )?;

    let mut spent = 0;
    for btx in &block.txs {
      for input in &btx.inputs {
        let changed = spend.execute(rusqlite::params![
          height,
          btx.hash,
          input.tx_hash,
          input.number
        ])?;
        if changed == 0 {
          tracing::warn!(
            height,
            spender = %btx.hash,
            output = %format!("{}:{}", input.tx_hash, input.number),
            "spent output is not indexed"
          );
        }
        spent += changed;
      }
    }
    Ok(Some(spent))
  })?;
  Ok(spent.unwrap_or_default())
}

// ─── Step 3: short ids and Last ──────────────────────────────────────────────

/// Give a confirmed identity row its short id and make it the last revision
/// of its subject.
///
/// A row that already holds an id keeps it. Otherwise it takes the id of
/// another confirmed revision of the same subject, or the next id of its
/// family, or 0 for the first subject of the family.
fn assign_identity(
  conn: &Connection,
  family: IdentityFamily,
  hash: &str,
) -> Result<usize> {
  let codes = kind_codes(family.kinds());
  let key = family.key_column();

  let assigned = conn
    .prepare_cached(&format!(
      "UPDATE Transactions SET
         Id = coalesce(
           Id,
           (SELECT max(o.Id) FROM Transactions o
             WHERE o.Type IN {codes}
               AND o.{key} = Transactions.{key}
               AND o.Hash != Transactions.Hash
               AND o.Height IS NOT NULL),
           (SELECT max(o.Id) + 1 FROM Transactions o
             WHERE o.Type IN {codes}
               AND o.Height IS NOT NULL),
           0
         ),
         Last = 1
       WHERE Hash = ?1 AND Height IS NOT NULL"
    ))?
    .execute(rusqlite::params![hash])?;

  conn
    .prepare_cached(&format!(
      "UPDATE Transactions SET Last = 0
       WHERE Type IN {codes}
         AND {key} = (SELECT {key} FROM Transactions WHERE Hash = ?1)
         AND Hash != ?1
         AND Last = 1"
    ))?
    .execute(rusqlite::params![hash])?;

  Ok(assigned)
}

/// Make a subscribe or blocking row the last revision of its
/// `(address, target)` relation.
fn mark_relation_last(
  conn: &Connection,
  family: RelationFamily,
  hash: &str,
) -> Result<()> {
  let codes = kind_codes(family.kinds());

  conn
    .prepare_cached(
      "UPDATE Transactions SET Last = 1 WHERE Hash = ?1 AND Height IS NOT NULL",
    )?
    .execute(rusqlite::params![hash])?;

  conn
    .prepare_cached(&format!(
      "UPDATE Transactions SET Last = 0
       WHERE Type IN {codes}
         AND (String1, String2) =
             (SELECT String1, String2 FROM Transactions WHERE Hash = ?1)
         AND Hash != ?1
         AND Last = 1"
    ))?
    .execute(rusqlite::params![hash])?;

  Ok(())
}

fn assign_short_ids(conn: &mut Connection, block: &ConnectedBlock) -> Result<usize> {
  let assigned = atomically(conn, |tx| {
    let mut assigned = 0;
    for btx in &block.txs {
      if let Some(family) = btx.kind.identity_family() {
        assigned += assign_identity(tx, family, &btx.hash)?;
      } else if let Some(family) = btx.kind.relation_family() {
        mark_relation_last(tx, family, &btx.hash)?;
      }
    }
    Ok(Some(assigned))
  })?;
  Ok(assigned.unwrap_or_default())
}

// ─── Step 4: reputation ──────────────────────────────────────────────────────

/// Short id of the current revision of an identity subject.
fn current_identity(
  conn: &Connection,
  family: IdentityFamily,
  key: &str,
) -> Result<Option<(i64, String)>> {
  let codes = kind_codes(family.kinds());
  let column = family.key_column();
  let found = conn
    .prepare_cached(&format!(
      "SELECT Id, String1 FROM Transactions
       WHERE Type IN {codes}
         AND {column} = ?1
         AND Last = 1
         AND Height IS NOT NULL
         AND Id IS NOT NULL"
    ))?
    .query_row(rusqlite::params![key], |r| Ok((r.get(0)?, r.get(1)?)))
    .optional()?;
  Ok(found)
}

/// Resolve a confirmed score transaction to short ids.
fn resolve_score(conn: &Connection, hash: &str) -> Result<ScoreData> {
  let missing = || Error::MissingScoreTarget(hash.to_owned());

  let (kind, voter, target_tx, value): (i64, String, String, i64) = conn
    .prepare_cached(
      "SELECT Type, String1, String2, Int1 FROM Transactions WHERE Hash = ?1",
    )?
    .query_row(rusqlite::params![hash], |r| {
      Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
    })
    .optional()?
    .ok_or_else(missing)?;

  let target = match TxKind::from_code(kind)? {
    TxKind::ScoreContent => ScoreTarget::Content,
    TxKind::ScoreComment => ScoreTarget::Comment,
    other => {
      return Err(Error::Decode(format!(
        "transaction {hash} is {other:?}, not a score"
      )));
    }
  };
  let target_family = match target {
    ScoreTarget::Content => IdentityFamily::Content,
    ScoreTarget::Comment => IdentityFamily::Comment,
  };

  let (voter_id, _) = current_identity(conn, IdentityFamily::Account, &voter)?
    .ok_or_else(missing)?;
  let (target_id, author) = current_identity(conn, target_family, &target_tx)?
    .ok_or_else(missing)?;
  let (author_id, _) = current_identity(conn, IdentityFamily::Account, &author)?
    .ok_or_else(missing)?;

  Ok(ScoreData {
    score_hash: hash.to_owned(),
    target,
    value,
    voter_id,
    target_id,
    author_id,
  })
}

fn apply_scores(
  conn: &mut Connection,
  policy: &dyn ReputationPolicy,
  block: &ConnectedBlock,
  height: i64,
) -> Result<(usize, usize)> {
  let applied = atomically(conn, |tx| {
    let mut deltas: BTreeMap<(RatingKind, i64), i64> = BTreeMap::new();
    let mut likers: BTreeSet<(i64, i64)> = BTreeSet::new();

    for btx in block.txs.iter().filter(|t| t.kind.is_score()) {
      let score = resolve_score(tx, &btx.hash)?;
      let effects = policy.effects(&score);

      for (kind, subject_id, delta) in [
        (RatingKind::Account, score.author_id, effects.author_delta),
        (score.target_kind(), score.target_id, effects.target_delta),
      ] {
        let total = deltas.entry((kind, subject_id)).or_default();
        *total = total
          .checked_add(delta)
          .ok_or(Error::RatingOverflow { kind, subject_id })?;
      }
      if effects.liked {
        likers.insert((score.author_id, score.voter_id));
      }
    }

    let mut ratings = 0;
    for ((kind, subject_id), delta) in deltas {
      if delta != 0 {
        ratings += append_delta(tx, kind, subject_id, height, delta)?;
      }
    }
    let mut liked = 0;
    for (subject_id, liker_id) in likers {
      liked += append_liker(tx, subject_id, liker_id, height)?;
    }
    Ok(Some((ratings, liked)))
  })?;
  Ok(applied.unwrap_or_default())
}

// ─── ChainIndexer impl ───────────────────────────────────────────────────────

impl ChainIndexer for SqliteStore {
  type Error = Error;

  async fn index_block(
    &self,
    block: &ConnectedBlock,
    height: i64,
  ) -> Result<Completion<IndexReport>> {
    let Some(guard) = self.begin_write().await else {
      return Ok(Completion::Stopped);
    };
    let block = Arc::new(block.clone());
    let mut report = IndexReport::default();

    let b = Arc::clone(&block);
    let Some(stamped) = self
      .run_locked(&guard, move |conn, _| stamp(conn, &b, height).map(Some))
      .await?
    else {
      return Ok(Completion::Stopped);
    };
    report.stamped = stamped;

    let b = Arc::clone(&block);
    let Some(spent) = self
      .run_locked(&guard, move |conn, _| mark_spent(conn, &b, height).map(Some))
      .await?
    else {
      return Ok(Completion::Stopped);
    };
    report.spent_outputs = spent;

    let b = Arc::clone(&block);
    let Some(short_ids) = self
      .run_locked(&guard, move |conn, _| assign_short_ids(conn, &b).map(Some))
      .await?
    else {
      return Ok(Completion::Stopped);
    };
    report.short_ids = short_ids;

    let b = Arc::clone(&block);
    let policy = Arc::clone(&self.policy);
    let Some((ratings, likers)) = self
      .run_locked(&guard, move |conn, _| {
        apply_scores(conn, policy.as_ref(), &b, height).map(Some)
      })
      .await?
    else {
      return Ok(Completion::Stopped);
    };
    report.ratings = ratings;
    report.likers = likers;

    tracing::info!(
      height,
      hash = %block.hash,
      txs = block.txs.len(),
      stamped = report.stamped,
      spent = report.spent_outputs,
      short_ids = report.short_ids,
      ratings = report.ratings,
      likers = report.likers,
      "indexed block"
    );
    Ok(Completion::Finished(report))
  }

  async fn rollback_to_height(&self, height: i64) -> Result<Completion<RollbackReport>> {
    let report = self
      .write(move |conn, _| atomically(conn, |tx| rollback_from(tx, height).map(Some)))
      .await?;

    let Some(report) = report else {
      return Ok(Completion::Stopped);
    };
    if report.is_empty() {
      tracing::debug!(height, "rollback found nothing to undo");
    } else {
      tracing::info!(
        height,
        transactions = report.transactions,
        restored_last = report.restored_last,
        outputs = report.outputs,
        utxo_deleted = report.utxo_deleted,
        utxo_unspent = report.utxo_unspent,
        ratings = report.ratings,
        "rolled back"
      );
    }
    Ok(Completion::Finished(report))
  }
}
