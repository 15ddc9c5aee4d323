//! Error type for `ledgerview-store-sqlite`.

use ledgerview_core::kind::RatingKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ledgerview_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("decode error: {0}")]
  Decode(String),

  /// Chain stamping referenced a transaction that was never ingested.
  #[error("transaction not found: {0}")]
  MissingTransaction(String),

  /// A confirmed score whose voter, target or target author cannot be
  /// resolved to a short id.
  #[error("cannot resolve score {0}")]
  MissingScoreTarget(String),

  #[error("utxo not found: {tx_id}:{output_index}")]
  UtxoNotFound { tx_id: String, output_index: i64 },

  #[error("utxo {tx_id}:{output_index} has no spend height")]
  MissingSpendHeight { tx_id: String, output_index: i64 },

  #[error("{0:?} is not an aggregating rating kind")]
  NotAggregating(RatingKind),

  #[error("rating overflow for {kind:?} {subject_id}")]
  RatingOverflow { kind: RatingKind, subject_id: i64 },
}

impl Error {
  /// Whether the error is a broken caller or consensus-layer invariant
  /// rather than a store failure. Retrying will not help.
  pub fn is_precondition(&self) -> bool {
    matches!(
      self,
      Self::MissingTransaction(_)
        | Self::MissingScoreTarget(_)
        | Self::UtxoNotFound { .. }
        | Self::MissingSpendHeight { .. }
        | Self::NotAggregating(_)
    )
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Self::Database(e.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
