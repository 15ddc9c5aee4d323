//! The per-block input handed over by the consensus layer.

use serde::{Deserialize, Serialize};

use crate::kind::TxKind;

/// A reference to a previously created output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
  pub tx_hash: String,
  pub number:  i64,
}

impl OutPoint {
  pub fn new(tx_hash: impl Into<String>, number: i64) -> Self {
    Self { tx_hash: tx_hash.into(), number }
  }
}

/// A transaction as it appears in a connected block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTx {
  pub hash:   String,
  pub kind:   TxKind,
  /// Outputs consumed by this transaction; empty for coinbase.
  pub inputs: Vec<OutPoint>,
}

impl BlockTx {
  pub fn new(hash: impl Into<String>, kind: TxKind) -> Self {
    Self { hash: hash.into(), kind, inputs: Vec::new() }
  }

  pub fn spending(mut self, tx_hash: impl Into<String>, number: i64) -> Self {
    self.inputs.push(OutPoint::new(tx_hash, number));
    self
  }
}

/// A block already validated upstream, in chain order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedBlock {
  pub hash: String,
  /// Transactions in block order; the position becomes `BlockNum`.
  pub txs:  Vec<BlockTx>,
}

impl ConnectedBlock {
  pub fn new(hash: impl Into<String>, txs: Vec<BlockTx>) -> Self {
    Self { hash: hash.into(), txs }
  }
}
