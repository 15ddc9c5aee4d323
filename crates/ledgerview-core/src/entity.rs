//! Ledger entities: indexed transactions and their outputs.
//!
//! A transaction row is written once by ingestion and afterwards only gains
//! or loses chain linkage: connecting a block stamps its position, rolling
//! back the block clears it again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{kind::TxKind, payload::TxPayload};

// ─── Chain position ──────────────────────────────────────────────────────────

/// Where a confirmed transaction sits in the chain. Block hash and height
/// are set and cleared together, so they live in one optional value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPosition {
  pub block_hash: String,
  /// Index of the transaction inside its block.
  pub block_num:  i64,
  pub height:     i64,
}

// ─── LedgerEntity ────────────────────────────────────────────────────────────

/// One row of the `Transactions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntity {
  pub hash:     String,
  pub time:     DateTime<Utc>,
  /// `None` until a connect pass confirms it, and again after rollback.
  pub chain:    Option<ChainPosition>,
  /// Stable per-family sequence number; only identity-bearing kinds get one.
  pub short_id: Option<i64>,
  /// Most recent confirmed revision of its logical subject.
  pub last:     bool,
  pub payload:  TxPayload,
}

impl LedgerEntity {
  pub fn kind(&self) -> TxKind { self.payload.kind() }

  pub fn height(&self) -> Option<i64> {
    self.chain.as_ref().map(|c| c.height)
  }

  pub fn is_confirmed(&self) -> bool { self.chain.is_some() }
}

// ─── Ingestion input ─────────────────────────────────────────────────────────

/// An output created by a transaction, as supplied for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOutput {
  pub number:  i64,
  pub address: String,
  pub value:   i64,
}

/// Input to [`crate::store::LedgerStore::insert_transactions`]. Chain
/// linkage is never accepted here; it is set only by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
  pub hash:    String,
  pub time:    DateTime<Utc>,
  pub payload: TxPayload,
  pub outputs: Vec<NewOutput>,
}

impl NewTransaction {
  pub fn new(hash: impl Into<String>, time: DateTime<Utc>, payload: TxPayload) -> Self {
    Self { hash: hash.into(), time, payload, outputs: Vec::new() }
  }

  pub fn with_output(
    mut self,
    number: i64,
    address: impl Into<String>,
    value: i64,
  ) -> Self {
    self.outputs.push(NewOutput { number, address: address.into(), value });
    self
  }
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// The spend of an output: both fields are set and cleared together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spend {
  pub height:  i64,
  pub tx_hash: String,
}

/// One row of the `TxOutputs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
  pub tx_hash:   String,
  pub number:    i64,
  pub address:   String,
  pub value:     i64,
  /// Height of the creating transaction, once confirmed.
  pub tx_height: Option<i64>,
  pub spent:     Option<Spend>,
}
