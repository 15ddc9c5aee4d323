//! Error types for `ledgerview-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown transaction kind code: {0}")]
  UnknownTxKind(i64),

  #[error("unknown rating kind code: {0}")]
  UnknownRatingKind(i64),

  #[error("unknown rating kind name: {0:?}")]
  UnknownRatingName(String),

  #[error("{kind:?} transaction is missing its {slot} column")]
  MissingSlot {
    kind: crate::kind::TxKind,
    slot: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
