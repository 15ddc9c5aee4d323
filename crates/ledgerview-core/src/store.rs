//! Storage traits for the chain index.
//!
//! Implemented by storage backends (e.g. `ledgerview-store-sqlite`). The host
//! node drives [`ChainIndexer`] from its connect/disconnect logic; query
//! layers use the read methods, which only ever observe committed state.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes.

use std::future::Future;

use crate::{
  block::ConnectedBlock,
  entity::{LedgerEntity, NewTransaction, TxOutput},
  kind::RatingKind,
  outcome::{Completion, IndexReport, RollbackReport, WriteOutcome},
  rating::RatingRecord,
  utxo::{AddressBalance, Utxo},
};

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Raw transaction rows and their outputs.
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist unconfirmed transactions and their outputs. Rows whose hash
  /// already exists are left untouched. All-or-nothing per call.
  fn insert_transactions(
    &self,
    txs: Vec<NewTransaction>,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  /// Look up a transaction by hash. Returns `None` if not found.
  fn transaction<'a>(
    &'a self,
    hash: &'a str,
  ) -> impl Future<Output = Result<Option<LedgerEntity>, Self::Error>> + Send + 'a;

  /// All transactions confirmed at `height`, in block order.
  fn transactions_at_height(
    &self,
    height: i64,
  ) -> impl Future<Output = Result<Vec<LedgerEntity>, Self::Error>> + Send + '_;

  /// Outputs created by `tx_hash`, ordered by output number.
  fn outputs<'a>(
    &'a self,
    tx_hash: &'a str,
  ) -> impl Future<Output = Result<Vec<TxOutput>, Self::Error>> + Send + 'a;

  /// Highest confirmed height, or `None` for an empty index.
  fn tip_height(
    &self,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;
}

// ─── Chain indexing ──────────────────────────────────────────────────────────

/// Connect and disconnect blocks.
///
/// The host serialises calls: an `index_block` and a `rollback_to_height`
/// are never in flight together.
pub trait ChainIndexer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Apply a block connected at `height` as the new tip.
  ///
  /// Each step commits on its own. A failure leaves the earlier steps in
  /// place; repair with [`ChainIndexer::rollback_to_height`] for `height`.
  /// Re-applying an already applied block changes nothing.
  fn index_block<'a>(
    &'a self,
    block: &'a ConnectedBlock,
    height: i64,
  ) -> impl Future<Output = Result<Completion<IndexReport>, Self::Error>> + Send + 'a;

  /// Undo every effect attributable to heights `>= height` in one
  /// transaction. Either everything is undone or nothing is.
  fn rollback_to_height(
    &self,
    height: i64,
  ) -> impl Future<Output = Result<Completion<RollbackReport>, Self::Error>> + Send + '_;
}

// ─── UTXO ────────────────────────────────────────────────────────────────────

/// The address-keyed unspent output projection.
pub trait UtxoIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert unless `(tx_id, output_index)` is already present.
  fn insert<'a>(
    &'a self,
    utxo: &'a Utxo,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + 'a;

  /// Set `block_spent` from `utxo.block_spent` on the matching row.
  ///
  /// A missing row fails with a precondition error instead of reporting
  /// [`WriteOutcome::NoEffect`], as does a `utxo` without `block_spent`.
  /// Spending an output the index never saw means the caller is out of sync.
  fn spent<'a>(
    &'a self,
    utxo: &'a Utxo,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + 'a;

  /// [`UtxoIndex::insert`] for a batch, in one transaction.
  fn bulk_insert<'a>(
    &'a self,
    utxos: &'a [Utxo],
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + 'a;

  /// [`UtxoIndex::spent`] for a batch, in one transaction. Any failing
  /// record aborts the whole batch.
  fn bulk_spent<'a>(
    &'a self,
    utxos: &'a [Utxo],
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + 'a;

  /// Delete every row. Full rebuilds only.
  fn clear_all(
    &self,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  fn utxos_by_address<'a>(
    &'a self,
    address: &'a str,
    include_spent: bool,
  ) -> impl Future<Output = Result<Vec<Utxo>, Self::Error>> + Send + 'a;

  /// Sum of unspent amounts held by `address`.
  fn balance<'a>(
    &'a self,
    address: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Addresses with the largest unspent balance, descending.
  fn top_addresses(
    &self,
    count: usize,
  ) -> impl Future<Output = Result<Vec<AddressBalance>, Self::Error>> + Send + '_;
}

// ─── Reputation ──────────────────────────────────────────────────────────────

/// The append-only, height-versioned rating ledger.
///
/// Values are signed 64-bit integers with no clamping.
pub trait ReputationLedger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append `previous + delta` at `height`, where `previous` is the latest
  /// value strictly below `height` (0 if none). Returns
  /// [`WriteOutcome::NoEffect`] if that exact record already exists.
  ///
  /// Callers must sum their deltas per `(kind, subject_id, height)` and call
  /// this once, as the indexer does for each block. A second call at the
  /// same height starts from the same `previous`, so its record replaces
  /// the first one for readers instead of adding to it.
  fn append_delta(
    &self,
    kind: RatingKind,
    subject_id: i64,
    height: i64,
    delta: i64,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  /// Record `liker_id` as a liker of `subject_id` unless the pair exists at
  /// any height.
  fn append_liker(
    &self,
    subject_id: i64,
    liker_id: i64,
    height: i64,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  /// Latest value with `Height <= height`, or `None` if no record exists.
  fn value_at_or_before(
    &self,
    kind: RatingKind,
    subject_id: i64,
    height: i64,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Number of likers recorded at or below `height`.
  fn liker_count_at_or_before(
    &self,
    subject_id: i64,
    height: i64,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Every record for a subject, oldest first.
  fn rating_history(
    &self,
    kind: RatingKind,
    subject_id: i64,
  ) -> impl Future<Output = Result<Vec<RatingRecord>, Self::Error>> + Send + '_;
}
