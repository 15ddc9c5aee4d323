//! Result values of write operations.
//!
//! A write that did nothing because its effect was already present, and a
//! write interrupted by shutdown, are both successful calls. Only store
//! failures and precondition violations travel through `Err`.

use serde::{Deserialize, Serialize};

/// Outcome of a single-row or batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
  /// At least one row changed.
  Applied,
  /// The effect was already present; nothing changed.
  NoEffect,
  /// Shutdown was requested before the write committed. Nothing from this
  /// call is visible; resume later.
  Stopped,
}

impl WriteOutcome {
  pub fn from_changes(changes: usize) -> Self {
    if changes > 0 { Self::Applied } else { Self::NoEffect }
  }

  pub fn is_stopped(self) -> bool { matches!(self, Self::Stopped) }
}

/// Outcome of a multi-step engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion<T> {
  Finished(T),
  /// Shutdown interrupted the operation between committed steps.
  Stopped,
}

impl<T> Completion<T> {
  pub fn finished(self) -> Option<T> {
    match self {
      Self::Finished(t) => Some(t),
      Self::Stopped => None,
    }
  }

  pub fn is_stopped(&self) -> bool { matches!(self, Self::Stopped) }
}

/// Rows touched by each step of indexing one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
  pub stamped:       usize,
  pub spent_outputs: usize,
  pub short_ids:     usize,
  pub ratings:       usize,
  pub likers:        usize,
}

/// Rows touched by a rollback, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
  pub transactions:   usize,
  pub restored_last:  usize,
  pub outputs:        usize,
  pub utxo_deleted:   usize,
  pub utxo_unspent:   usize,
  pub ratings:        usize,
}

impl RollbackReport {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}
