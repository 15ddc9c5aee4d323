//! Encoding and decoding helpers between Rust domain types and the flat
//! column layout of the SQLite tables.
//!
//! Timestamps are stored as unix seconds. Payload variants are spread over
//! the generic `String1..5` / `Int1` columns; this module is the only place
//! that knows which slot holds which field.

use chrono::{DateTime, Utc};
use ledgerview_core::{
  entity::{ChainPosition, LedgerEntity, Spend, TxOutput},
  kind::{RatingKind, TxKind},
  payload::{
    AccountRole, CommentAction, ContentFormat, ScoreTarget, SubscribeMode,
    TxPayload,
  },
  rating::RatingRecord,
  utxo::Utxo,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_time(dt: DateTime<Utc>) -> i64 { dt.timestamp() }

pub fn decode_time(secs: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp(secs, 0)
    .ok_or_else(|| Error::Decode(format!("timestamp out of range: {secs}")))
}

// ─── Payload slots ───────────────────────────────────────────────────────────

/// The kind-dependent columns of a `Transactions` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadSlots {
  pub string1: Option<String>,
  pub string2: Option<String>,
  pub string3: Option<String>,
  pub string4: Option<String>,
  pub string5: Option<String>,
  pub int1:    Option<i64>,
}

pub fn encode_payload(payload: &TxPayload) -> PayloadSlots {
  let s = |v: &str| Some(v.to_owned());
  match payload {
    TxPayload::Transfer | TxPayload::Coinbase | TxPayload::Coinstake => {
      PayloadSlots::default()
    }
    TxPayload::Account { address, referrer, .. } => PayloadSlots {
      string1: s(address),
      string2: referrer.clone(),
      ..Default::default()
    },
    TxPayload::AccountDelete { address } => PayloadSlots {
      string1: s(address),
      ..Default::default()
    },
    TxPayload::Content { address, root_tx, relay_tx, .. } => PayloadSlots {
      string1: s(address),
      string2: s(root_tx),
      string3: relay_tx.clone(),
      ..Default::default()
    },
    TxPayload::ContentDelete { address, root_tx } => PayloadSlots {
      string1: s(address),
      string2: s(root_tx),
      ..Default::default()
    },
    TxPayload::Comment {
      address,
      root_tx,
      content_tx,
      parent_tx,
      answer_tx,
      ..
    } => PayloadSlots {
      string1: s(address),
      string2: s(root_tx),
      string3: s(content_tx),
      string4: parent_tx.clone(),
      string5: answer_tx.clone(),
      int1:    None,
    },
    TxPayload::Score { address, target_tx, value, .. } => PayloadSlots {
      string1: s(address),
      string2: s(target_tx),
      int1: Some(*value),
      ..Default::default()
    },
    TxPayload::Subscribe { address, address_to, .. }
    | TxPayload::Blocking { address, address_to, .. } => PayloadSlots {
      string1: s(address),
      string2: s(address_to),
      ..Default::default()
    },
    TxPayload::Complain { address, content_tx, reason } => PayloadSlots {
      string1: s(address),
      string2: s(content_tx),
      int1: Some(*reason),
      ..Default::default()
    },
  }
}

pub fn decode_payload(kind: TxKind, slots: PayloadSlots) -> Result<TxPayload> {
  let PayloadSlots { string1, string2, string3, string4, string5, int1 } = slots;
  let need = |v: Option<String>, slot: &'static str| {
    v.ok_or(ledgerview_core::Error::MissingSlot { kind, slot })
  };
  let need_int = |v: Option<i64>| {
    v.ok_or(ledgerview_core::Error::MissingSlot { kind, slot: "Int1" })
  };

  let account = |role| -> Result<TxPayload> {
    Ok(TxPayload::Account {
      role,
      address: need(string1.clone(), "String1")?,
      referrer: string2.clone(),
    })
  };
  let content = |format| -> Result<TxPayload> {
    Ok(TxPayload::Content {
      format,
      address: need(string1.clone(), "String1")?,
      root_tx: need(string2.clone(), "String2")?,
      relay_tx: string3.clone(),
    })
  };
  let comment = |action| -> Result<TxPayload> {
    Ok(TxPayload::Comment {
      action,
      address: need(string1.clone(), "String1")?,
      root_tx: need(string2.clone(), "String2")?,
      content_tx: need(string3.clone(), "String3")?,
      parent_tx: string4.clone(),
      answer_tx: string5.clone(),
    })
  };
  let score = |target| -> Result<TxPayload> {
    Ok(TxPayload::Score {
      target,
      address: need(string1.clone(), "String1")?,
      target_tx: need(string2.clone(), "String2")?,
      value: need_int(int1)?,
    })
  };
  let subscribe = |mode| -> Result<TxPayload> {
    Ok(TxPayload::Subscribe {
      mode,
      address: need(string1.clone(), "String1")?,
      address_to: need(string2.clone(), "String2")?,
    })
  };
  let blocking = |cancel| -> Result<TxPayload> {
    Ok(TxPayload::Blocking {
      cancel,
      address: need(string1.clone(), "String1")?,
      address_to: need(string2.clone(), "String2")?,
    })
  };

  match kind {
    TxKind::Transfer => Ok(TxPayload::Transfer),
    TxKind::Coinbase => Ok(TxPayload::Coinbase),
    TxKind::Coinstake => Ok(TxPayload::Coinstake),
    TxKind::AccountUser => account(AccountRole::User),
    TxKind::AccountVideoServer => account(AccountRole::VideoServer),
    TxKind::AccountMessageServer => account(AccountRole::MessageServer),
    TxKind::AccountDelete => Ok(TxPayload::AccountDelete {
      address: need(string1.clone(), "String1")?,
    }),
    TxKind::ContentPost => content(ContentFormat::Post),
    TxKind::ContentVideo => content(ContentFormat::Video),
    TxKind::ContentArticle => content(ContentFormat::Article),
    TxKind::ContentDelete => Ok(TxPayload::ContentDelete {
      address: need(string1.clone(), "String1")?,
      root_tx: need(string2.clone(), "String2")?,
    }),
    TxKind::Comment => comment(CommentAction::Create),
    TxKind::CommentEdit => comment(CommentAction::Edit),
    TxKind::CommentDelete => comment(CommentAction::Delete),
    TxKind::ScoreContent => score(ScoreTarget::Content),
    TxKind::ScoreComment => score(ScoreTarget::Comment),
    TxKind::Subscribe => subscribe(SubscribeMode::Public),
    TxKind::SubscribePrivate => subscribe(SubscribeMode::Private),
    TxKind::SubscribeCancel => subscribe(SubscribeMode::Cancel),
    TxKind::Blocking => blocking(false),
    TxKind::BlockingCancel => blocking(true),
    TxKind::Complain => Ok(TxPayload::Complain {
      address: need(string1.clone(), "String1")?,
      content_tx: need(string2.clone(), "String2")?,
      reason: need_int(int1)?,
    }),
  }
}

/// SQL list literal of kind codes, e.g. `(100,101,102,170)`.
pub fn kind_codes(kinds: &[TxKind]) -> String {
  let codes: Vec<String> = kinds.iter().map(|k| k.code().to_string()).collect();
  format!("({})", codes.join(","))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for every `Transactions` read, in [`RawEntity`] order.
pub const ENTITY_COLUMNS: &str = "Type, Hash, Time, BlockHash, BlockNum, Height, \
  Last, Id, String1, String2, String3, String4, String5, Int1";

/// Raw values read directly from a `Transactions` row.
pub struct RawEntity {
  pub kind:       i64,
  pub hash:       String,
  pub time:       i64,
  pub block_hash: Option<String>,
  pub block_num:  Option<i64>,
  pub height:     Option<i64>,
  pub last:       bool,
  pub id:         Option<i64>,
  pub slots:      PayloadSlots,
}

impl RawEntity {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      kind:       row.get(0)?,
      hash:       row.get(1)?,
      time:       row.get(2)?,
      block_hash: row.get(3)?,
      block_num:  row.get(4)?,
      height:     row.get(5)?,
      last:       row.get(6)?,
      id:         row.get(7)?,
      slots:      PayloadSlots {
        string1: row.get(8)?,
        string2: row.get(9)?,
        string3: row.get(10)?,
        string4: row.get(11)?,
        string5: row.get(12)?,
        int1:    row.get(13)?,
      },
    })
  }

  pub fn into_entity(self) -> Result<LedgerEntity> {
    let kind = TxKind::from_code(self.kind)?;
    let chain = match (self.block_hash, self.block_num, self.height) {
      (Some(block_hash), Some(block_num), Some(height)) => {
        Some(ChainPosition { block_hash, block_num, height })
      }
      (None, None, None) => None,
      _ => {
        return Err(Error::Decode(format!(
          "partial chain position on transaction {}",
          self.hash
        )));
      }
    };

    Ok(LedgerEntity {
      time: decode_time(self.time)?,
      payload: decode_payload(kind, self.slots)?,
      hash: self.hash,
      chain,
      short_id: self.id,
      last: self.last,
    })
  }
}

pub const OUTPUT_COLUMNS: &str =
  "TxHash, Number, AddressHash, Value, TxHeight, SpentHeight, SpentTxHash";

/// Raw values read directly from a `TxOutputs` row.
pub struct RawOutput {
  pub tx_hash:      String,
  pub number:       i64,
  pub address:      String,
  pub value:        i64,
  pub tx_height:    Option<i64>,
  pub spent_height: Option<i64>,
  pub spent_tx:     Option<String>,
}

impl RawOutput {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tx_hash:      row.get(0)?,
      number:       row.get(1)?,
      address:      row.get(2)?,
      value:        row.get(3)?,
      tx_height:    row.get(4)?,
      spent_height: row.get(5)?,
      spent_tx:     row.get(6)?,
    })
  }

  pub fn into_output(self) -> Result<TxOutput> {
    let spent = match (self.spent_height, self.spent_tx) {
      (Some(height), Some(tx_hash)) => Some(Spend { height, tx_hash }),
      (None, None) => None,
      _ => {
        return Err(Error::Decode(format!(
          "partial spend on output {}:{}",
          self.tx_hash, self.number
        )));
      }
    };

    Ok(TxOutput {
      tx_hash: self.tx_hash,
      number: self.number,
      address: self.address,
      value: self.value,
      tx_height: self.tx_height,
      spent,
    })
  }
}

pub const UTXO_COLUMNS: &str =
  "TxId, Block, TxOut, TxTime, Address, Amount, BlockSpent";

/// Raw values read directly from a `Utxo` row.
pub struct RawUtxo {
  pub tx_id:        String,
  pub block:        i64,
  pub output_index: i64,
  pub time:         i64,
  pub address:      String,
  pub amount:       i64,
  pub block_spent:  Option<i64>,
}

impl RawUtxo {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tx_id:        row.get(0)?,
      block:        row.get(1)?,
      output_index: row.get(2)?,
      time:         row.get(3)?,
      address:      row.get(4)?,
      amount:       row.get(5)?,
      block_spent:  row.get(6)?,
    })
  }

  pub fn into_utxo(self) -> Result<Utxo> {
    Ok(Utxo {
      tx_id:        self.tx_id,
      block:        self.block,
      output_index: self.output_index,
      time:         decode_time(self.time)?,
      address:      self.address,
      amount:       self.amount,
      block_spent:  self.block_spent,
    })
  }
}

/// Raw values read directly from a `Ratings` row.
pub struct RawRating {
  pub kind:       i64,
  pub height:     i64,
  pub subject_id: i64,
  pub value:      i64,
}

impl RawRating {
  pub fn into_record(self) -> Result<RatingRecord> {
    Ok(RatingRecord {
      kind:       RatingKind::from_code(self.kind)?,
      height:     self.height,
      subject_id: self.subject_id,
      value:      self.value,
    })
  }
}
