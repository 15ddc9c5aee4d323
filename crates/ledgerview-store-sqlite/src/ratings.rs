//! The append-only rating ledger.
//!
//! The free functions run inside a caller's transaction so the indexer can
//! apply a whole block's deltas in one step; the [`ReputationLedger`] impl
//! wraps each of them in its own write.

use rusqlite::{Connection, OptionalExtension as _};

use ledgerview_core::{
  kind::RatingKind,
  outcome::WriteOutcome,
  rating::RatingRecord,
  store::ReputationLedger,
};

use crate::{
  encode::RawRating,
  store::{stopped_or, SqliteStore},
  txn::atomically,
  Error, Result,
};

// ─── Statements ──────────────────────────────────────────────────────────────

/// Latest value recorded for a subject at or below `height`. Same-height
/// rows are ordered by insertion.
pub(crate) fn value_at_or_before(
  conn: &Connection,
  kind: RatingKind,
  subject_id: i64,
  height: i64,
) -> Result<Option<i64>> {
  let value = conn
    .prepare_cached(
      "SELECT Value FROM Ratings
       WHERE Type = ?1 AND Id = ?2 AND Height <= ?3
       ORDER BY Height DESC, rowid DESC
       LIMIT 1",
    )?
    .query_row(rusqlite::params![kind.code(), subject_id, height], |r| r.get(0))
    .optional()?;
  Ok(value)
}

/// Append `previous + delta` at `height`. Returns the number of rows
/// inserted: 0 when the identical record is already present.
pub(crate) fn append_delta(
  conn: &Connection,
  kind: RatingKind,
  subject_id: i64,
  height: i64,
  delta: i64,
) -> Result<usize> {
  if !kind.is_aggregating() {
    return Err(Error::NotAggregating(kind));
  }

  let previous =
    value_at_or_before(conn, kind, subject_id, height.saturating_sub(1))?.unwrap_or(0);
  let value = previous
    .checked_add(delta)
    .ok_or(Error::RatingOverflow { kind, subject_id })?;

  let inserted = conn
    .prepare_cached(
      "INSERT INTO Ratings (Type, Height, Id, Value)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (Type, Id, Height, Value) DO NOTHING",
    )?
    .execute(rusqlite::params![kind.code(), height, subject_id, value])?;

  tracing::trace!(?kind, subject_id, height, delta, value, inserted, "rating delta");
  Ok(inserted)
}

/// Record `liker_id` against `subject_id` unless the pair exists at any
/// height.
pub(crate) fn append_liker(
  conn: &Connection,
  subject_id: i64,
  liker_id: i64,
  height: i64,
) -> Result<usize> {
  let likers = RatingKind::AccountLikers.code();
  let inserted = conn
    .prepare_cached(
      "INSERT INTO Ratings (Type, Height, Id, Value)
       SELECT ?1, ?2, ?3, ?4
       WHERE NOT EXISTS (
         SELECT 1 FROM Ratings WHERE Type = ?1 AND Id = ?3 AND Value = ?4
       )",
    )?
    .execute(rusqlite::params![likers, height, subject_id, liker_id])?;
  Ok(inserted)
}

// ─── ReputationLedger impl ───────────────────────────────────────────────────

impl ReputationLedger for SqliteStore {
  type Error = Error;

  async fn append_delta(
    &self,
    kind: RatingKind,
    subject_id: i64,
    height: i64,
    delta: i64,
  ) -> Result<WriteOutcome> {
    let outcome = self
      .write(move |conn, _| {
        atomically(conn, |tx| {
          let inserted = append_delta(tx, kind, subject_id, height, delta)?;
          Ok(Some(WriteOutcome::from_changes(inserted)))
        })
      })
      .await?;
    Ok(stopped_or(outcome))
  }

  async fn append_liker(
    &self,
    subject_id: i64,
    liker_id: i64,
    height: i64,
  ) -> Result<WriteOutcome> {
    let outcome = self
      .write(move |conn, _| {
        atomically(conn, |tx| {
          let inserted = append_liker(tx, subject_id, liker_id, height)?;
          Ok(Some(WriteOutcome::from_changes(inserted)))
        })
      })
      .await?;
    Ok(stopped_or(outcome))
  }

  async fn value_at_or_before(
    &self,
    kind: RatingKind,
    subject_id: i64,
    height: i64,
  ) -> Result<Option<i64>> {
    if !kind.is_aggregating() {
      return Err(Error::NotAggregating(kind));
    }
    self
      .read(move |conn| value_at_or_before(conn, kind, subject_id, height))
      .await
  }

  async fn liker_count_at_or_before(
    &self,
    subject_id: i64,
    height: i64,
  ) -> Result<i64> {
    self
      .read(move |conn| {
        Ok(
          conn
            .prepare_cached(
              "SELECT count(*) FROM Ratings
               WHERE Type = ?1 AND Id = ?2 AND Height <= ?3",
            )?
            .query_row(
              rusqlite::params![
                RatingKind::AccountLikers.code(),
                subject_id,
                height
              ],
              |r| r.get(0),
            )?,
        )
      })
      .await
  }

  async fn rating_history(
    &self,
    kind: RatingKind,
    subject_id: i64,
  ) -> Result<Vec<RatingRecord>> {
    let raws: Vec<RawRating> = self
      .read(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT Type, Height, Id, Value FROM Ratings
           WHERE Type = ?1 AND Id = ?2
           ORDER BY Height, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![kind.code(), subject_id], |row| {
            Ok(RawRating {
              kind:       row.get(0)?,
              height:     row.get(1)?,
              subject_id: row.get(2)?,
              value:      row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRating::into_record).collect()
  }
}
