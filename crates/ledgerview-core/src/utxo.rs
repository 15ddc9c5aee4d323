//! Address-keyed projection of unspent outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `Utxo` table, unique by `(tx_id, output_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
  pub tx_id:        String,
  /// Height of the block that created the output.
  pub block:        i64,
  pub output_index: i64,
  pub time:         DateTime<Utc>,
  pub address:      String,
  pub amount:       i64,
  /// Height of the block that consumed it, if any.
  pub block_spent:  Option<i64>,
}

impl Utxo {
  pub fn is_spent(&self) -> bool { self.block_spent.is_some() }
}

/// Unspent balance held by one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
  pub address: String,
  pub balance: i64,
}
