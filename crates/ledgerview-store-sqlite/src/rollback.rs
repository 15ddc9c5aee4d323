//! The rollback engine: undoes every effect attributable to heights at or
//! above a fork point. Runs inside one transaction owned by the caller.

use std::collections::BTreeSet;

use rusqlite::Connection;

use ledgerview_core::{
  kind::{IdentityFamily, RelationFamily, TxKind},
  outcome::RollbackReport,
};

use crate::{encode::kind_codes, Result};

/// A logical subject whose `Last` revision may need restoring.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Subject {
  Identity { family: IdentityFamily, key: String },
  Relation { family: RelationFamily, from: String, to: String },
}

impl Subject {
  fn classify(
    kind: TxKind,
    string1: Option<String>,
    string2: Option<String>,
  ) -> Option<Self> {
    if let Some(family) = kind.identity_family() {
      let key = match family {
        IdentityFamily::Account => string1,
        IdentityFamily::Content | IdentityFamily::Comment => string2,
      }?;
      return Some(Self::Identity { family, key });
    }
    let family = kind.relation_family()?;
    Some(Self::Relation { family, from: string1?, to: string2? })
  }

  /// Set `Last` on the highest surviving revision of the subject.
  fn restore_last(&self, conn: &Connection) -> Result<usize> {
    let restored = match self {
      Self::Identity { family, key } => conn
        .prepare_cached(&format!(
          "UPDATE Transactions SET Last = 1
           WHERE Hash = (
             SELECT Hash FROM Transactions
             WHERE Type IN {codes}
               AND {column} = ?1
               AND Height IS NOT NULL
             ORDER BY Height DESC, BlockNum DESC
             LIMIT 1
           )",
          codes = kind_codes(family.kinds()),
          column = family.key_column(),
        ))?
        .execute(rusqlite::params![key])?,
      Self::Relation { family, from, to } => conn
        .prepare_cached(&format!(
          "UPDATE Transactions SET Last = 1
           WHERE Hash = (
             SELECT Hash FROM Transactions
             WHERE Type IN {codes}
               AND String1 = ?1
               AND String2 = ?2
               AND Height IS NOT NULL
             ORDER BY Height DESC, BlockNum DESC
             LIMIT 1
           )",
          codes = kind_codes(family.kinds()),
        ))?
        .execute(rusqlite::params![from, to])?,
    };
    Ok(restored)
  }
}

/// Subjects whose current revision is confirmed at or above `height`.
fn displaced_subjects(conn: &Connection, height: i64) -> Result<BTreeSet<Subject>> {
  let mut stmt = conn.prepare_cached(
    "SELECT Type, String1, String2 FROM Transactions
     WHERE Height >= ?1 AND Last = 1",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![height], |r| {
      Ok((
        r.get::<_, i64>(0)?,
        r.get::<_, Option<String>>(1)?,
        r.get::<_, Option<String>>(2)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut subjects = BTreeSet::new();
  for (code, string1, string2) in rows {
    if let Some(subject) = Subject::classify(TxKind::from_code(code)?, string1, string2) {
      subjects.insert(subject);
    }
  }
  Ok(subjects)
}

/// Undo everything at heights `>= height`.
///
/// Every statement filters on its own height column, so the order below
/// only matters for `Last`: displaced subjects are collected before their
/// rows lose their height.
pub(crate) fn rollback_from(conn: &Connection, height: i64) -> Result<RollbackReport> {
  let mut report = RollbackReport::default();
  let params = rusqlite::params![height];

  let subjects = displaced_subjects(conn, height)?;

  report.transactions = conn
    .prepare_cached(
      "UPDATE Transactions
       SET BlockHash = NULL, BlockNum = NULL, Height = NULL, Id = NULL, Last = 0
       WHERE Height >= ?1",
    )?
    .execute(params)?;

  for subject in &subjects {
    report.restored_last += subject.restore_last(conn)?;
  }

  report.outputs = conn
    .prepare_cached(
      "UPDATE TxOutputs SET SpentHeight = NULL, SpentTxHash = NULL
       WHERE SpentHeight >= ?1",
    )?
    .execute(params)?;
  conn
    .prepare_cached("UPDATE TxOutputs SET TxHeight = NULL WHERE TxHeight >= ?1")?
    .execute(params)?;

  report.utxo_deleted = conn
    .prepare_cached("DELETE FROM Utxo WHERE Block >= ?1")?
    .execute(params)?;
  report.utxo_unspent = conn
    .prepare_cached("UPDATE Utxo SET BlockSpent = NULL WHERE BlockSpent >= ?1")?
    .execute(params)?;

  report.ratings = conn
    .prepare_cached("DELETE FROM Ratings WHERE Height >= ?1")?
    .execute(params)?;

  Ok(report)
}
