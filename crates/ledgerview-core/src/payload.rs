//! Kind-specific transaction payloads.
//!
//! Each variant names its fields. The storage layer flattens them into the
//! generic `String1..5` / `Int1` columns and back; nothing above the storage
//! boundary ever sees positional slots.

use serde::{Deserialize, Serialize};

use crate::kind::TxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
  User,
  VideoServer,
  MessageServer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
  Post,
  Video,
  Article,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
  Create,
  Edit,
  Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTarget {
  Content,
  Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeMode {
  Public,
  Private,
  Cancel,
}

// ─── TxPayload ───────────────────────────────────────────────────────────────

/// The typed payload of a ledger transaction. The variant (plus its mode
/// field, where present) determines the stored [`TxKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxPayload {
  Transfer,
  Coinbase,
  Coinstake,

  Account {
    role:     AccountRole,
    address:  String,
    referrer: Option<String>,
  },
  AccountDelete {
    address: String,
  },

  Content {
    format:   ContentFormat,
    address:  String,
    /// Hash of the first revision; equals the own hash for originals.
    root_tx:  String,
    relay_tx: Option<String>,
  },
  ContentDelete {
    address: String,
    root_tx: String,
  },

  Comment {
    action:     CommentAction,
    address:    String,
    root_tx:    String,
    content_tx: String,
    parent_tx:  Option<String>,
    answer_tx:  Option<String>,
  },

  Score {
    target:    ScoreTarget,
    /// Voter address.
    address:   String,
    /// Root hash of the scored content or comment.
    target_tx: String,
    value:     i64,
  },

  Subscribe {
    mode:       SubscribeMode,
    address:    String,
    address_to: String,
  },
  Blocking {
    cancel:     bool,
    address:    String,
    address_to: String,
  },

  Complain {
    address:    String,
    content_tx: String,
    reason:     i64,
  },
}

impl TxPayload {
  pub fn kind(&self) -> TxKind {
    match self {
      Self::Transfer => TxKind::Transfer,
      Self::Coinbase => TxKind::Coinbase,
      Self::Coinstake => TxKind::Coinstake,
      Self::Account { role, .. } => match role {
        AccountRole::User => TxKind::AccountUser,
        AccountRole::VideoServer => TxKind::AccountVideoServer,
        AccountRole::MessageServer => TxKind::AccountMessageServer,
      },
      Self::AccountDelete { .. } => TxKind::AccountDelete,
      Self::Content { format, .. } => match format {
        ContentFormat::Post => TxKind::ContentPost,
        ContentFormat::Video => TxKind::ContentVideo,
        ContentFormat::Article => TxKind::ContentArticle,
      },
      Self::ContentDelete { .. } => TxKind::ContentDelete,
      Self::Comment { action, .. } => match action {
        CommentAction::Create => TxKind::Comment,
        CommentAction::Edit => TxKind::CommentEdit,
        CommentAction::Delete => TxKind::CommentDelete,
      },
      Self::Score { target, .. } => match target {
        ScoreTarget::Content => TxKind::ScoreContent,
        ScoreTarget::Comment => TxKind::ScoreComment,
      },
      Self::Subscribe { mode, .. } => match mode {
        SubscribeMode::Public => TxKind::Subscribe,
        SubscribeMode::Private => TxKind::SubscribePrivate,
        SubscribeMode::Cancel => TxKind::SubscribeCancel,
      },
      Self::Blocking { cancel: false, .. } => TxKind::Blocking,
      Self::Blocking { cancel: true, .. } => TxKind::BlockingCancel,
      Self::Complain { .. } => TxKind::Complain,
    }
  }

  /// The author address, for every kind that has one.
  pub fn address(&self) -> Option<&str> {
    match self {
      Self::Transfer | Self::Coinbase | Self::Coinstake => None,
      Self::Account { address, .. }
      | Self::AccountDelete { address }
      | Self::Content { address, .. }
      | Self::ContentDelete { address, .. }
      | Self::Comment { address, .. }
      | Self::Score { address, .. }
      | Self::Subscribe { address, .. }
      | Self::Blocking { address, .. }
      | Self::Complain { address, .. } => Some(address),
    }
  }

  /// The logical subject shared by all revisions of an identity-bearing
  /// entity: the address for accounts, the root transaction for content and
  /// comments.
  pub fn subject_key(&self) -> Option<&str> {
    match self {
      Self::Account { address, .. } | Self::AccountDelete { address } => {
        Some(address)
      }
      Self::Content { root_tx, .. }
      | Self::ContentDelete { root_tx, .. }
      | Self::Comment { root_tx, .. } => Some(root_tx),
      _ => None,
    }
  }
}
