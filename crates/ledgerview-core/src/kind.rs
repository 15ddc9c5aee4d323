//! Closed sets of discriminants stored in integer columns: transaction kinds,
//! the identity families they belong to, and rating kinds.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── TxKind ──────────────────────────────────────────────────────────────────

/// The kind tag of a ledger transaction. The numeric code is what lives in
/// `Transactions.Type`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
  Transfer,
  Coinbase,
  Coinstake,

  AccountUser,
  AccountVideoServer,
  AccountMessageServer,
  AccountDelete,

  ContentPost,
  ContentVideo,
  ContentArticle,
  ContentDelete,

  Comment,
  CommentEdit,
  CommentDelete,

  ScoreContent,
  ScoreComment,

  Subscribe,
  SubscribePrivate,
  SubscribeCancel,

  Blocking,
  BlockingCancel,

  Complain,
}

impl TxKind {
  pub const ALL: [TxKind; 22] = [
    Self::Transfer,
    Self::Coinbase,
    Self::Coinstake,
    Self::AccountUser,
    Self::AccountVideoServer,
    Self::AccountMessageServer,
    Self::AccountDelete,
    Self::ContentPost,
    Self::ContentVideo,
    Self::ContentArticle,
    Self::ContentDelete,
    Self::Comment,
    Self::CommentEdit,
    Self::CommentDelete,
    Self::ScoreContent,
    Self::ScoreComment,
    Self::Subscribe,
    Self::SubscribePrivate,
    Self::SubscribeCancel,
    Self::Blocking,
    Self::BlockingCancel,
    Self::Complain,
  ];

  /// The code stored in the `Type` column.
  pub fn code(self) -> i64 {
    match self {
      Self::Transfer => 1,
      Self::Coinbase => 2,
      Self::Coinstake => 3,
      Self::AccountUser => 100,
      Self::AccountVideoServer => 101,
      Self::AccountMessageServer => 102,
      Self::AccountDelete => 170,
      Self::ContentPost => 200,
      Self::ContentVideo => 201,
      Self::ContentArticle => 202,
      Self::Comment => 204,
      Self::CommentEdit => 205,
      Self::CommentDelete => 206,
      Self::ContentDelete => 207,
      Self::ScoreContent => 300,
      Self::ScoreComment => 301,
      Self::Subscribe => 302,
      Self::SubscribePrivate => 303,
      Self::SubscribeCancel => 304,
      Self::Blocking => 305,
      Self::BlockingCancel => 306,
      Self::Complain => 307,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.code() == code)
      .ok_or(Error::UnknownTxKind(code))
  }

  /// The family whose members share a [`ShortId`](crate::entity::LedgerEntity::short_id)
  /// sequence, if this kind carries a stable identity.
  pub fn identity_family(self) -> Option<IdentityFamily> {
    IdentityFamily::ALL
      .into_iter()
      .find(|f| f.kinds().contains(&self))
  }

  /// The relation family (subscribe or blocking) keyed by
  /// `(address, target address)`, if any.
  pub fn relation_family(self) -> Option<RelationFamily> {
    RelationFamily::ALL
      .into_iter()
      .find(|f| f.kinds().contains(&self))
  }

  pub fn is_score(self) -> bool {
    matches!(self, Self::ScoreContent | Self::ScoreComment)
  }
}

// ─── Families ────────────────────────────────────────────────────────────────

/// Kinds whose revisions share one logical subject and one short id.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IdentityFamily {
  /// Keyed by the account address (`String1`).
  Account,
  /// Keyed by the root transaction hash (`String2`).
  Content,
  /// Keyed by the root transaction hash (`String2`).
  Comment,
}

impl IdentityFamily {
  pub const ALL: [IdentityFamily; 3] =
    [Self::Account, Self::Content, Self::Comment];

  pub fn kinds(self) -> &'static [TxKind] {
    match self {
      Self::Account => &[
        TxKind::AccountUser,
        TxKind::AccountVideoServer,
        TxKind::AccountMessageServer,
        TxKind::AccountDelete,
      ],
      Self::Content => &[
        TxKind::ContentPost,
        TxKind::ContentVideo,
        TxKind::ContentArticle,
        TxKind::ContentDelete,
      ],
      Self::Comment => &[
        TxKind::Comment,
        TxKind::CommentEdit,
        TxKind::CommentDelete,
      ],
    }
  }

  /// Name of the flat column holding the subject key.
  pub fn key_column(self) -> &'static str {
    match self {
      Self::Account => "String1",
      Self::Content | Self::Comment => "String2",
    }
  }
}

/// Kinds whose revisions describe one directed relation between two
/// addresses. They track `Last` but never receive a short id.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationFamily {
  Subscribe,
  Blocking,
}

impl RelationFamily {
  pub const ALL: [RelationFamily; 2] = [Self::Subscribe, Self::Blocking];

  pub fn kinds(self) -> &'static [TxKind] {
    match self {
      Self::Subscribe => &[
        TxKind::Subscribe,
        TxKind::SubscribePrivate,
        TxKind::SubscribeCancel,
      ],
      Self::Blocking => &[TxKind::Blocking, TxKind::BlockingCancel],
    }
  }
}

// ─── RatingKind ──────────────────────────────────────────────────────────────

/// The subject kind of a rating ledger row (`Ratings.Type`).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RatingKind {
  Account,
  /// Deduplicated `(subject, liker)` pairs; never aggregated.
  AccountLikers,
  Content,
  Comment,
}

impl RatingKind {
  pub const ALL: [RatingKind; 4] =
    [Self::Account, Self::AccountLikers, Self::Content, Self::Comment];

  pub fn code(self) -> i64 {
    match self {
      Self::Account => 0,
      Self::AccountLikers => 1,
      Self::Content => 2,
      Self::Comment => 3,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.code() == code)
      .ok_or(Error::UnknownRatingKind(code))
  }

  pub fn is_aggregating(self) -> bool { !matches!(self, Self::AccountLikers) }
}

impl std::str::FromStr for RatingKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "account" => Ok(Self::Account),
      "account_likers" | "likers" => Ok(Self::AccountLikers),
      "content" => Ok(Self::Content),
      "comment" => Ok(Self::Comment),
      other => Err(Error::UnknownRatingName(other.to_owned())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_are_unique() {
    let mut codes: Vec<_> = TxKind::ALL.iter().map(|k| k.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), TxKind::ALL.len());
  }

  #[test]
  fn unknown_code_is_rejected() {
    assert!(matches!(TxKind::from_code(203), Err(Error::UnknownTxKind(203))));
    assert!(matches!(
      RatingKind::from_code(9),
      Err(Error::UnknownRatingKind(9))
    ));
  }

  #[test]
  fn families_partition_identity_kinds() {
    assert_eq!(
      TxKind::AccountDelete.identity_family(),
      Some(IdentityFamily::Account)
    );
    assert_eq!(
      TxKind::ContentDelete.identity_family(),
      Some(IdentityFamily::Content)
    );
    assert_eq!(
      TxKind::CommentEdit.identity_family(),
      Some(IdentityFamily::Comment)
    );
    assert_eq!(TxKind::ScoreContent.identity_family(), None);
    assert_eq!(TxKind::Transfer.identity_family(), None);
  }

  #[test]
  fn relations_have_no_identity() {
    for kind in [TxKind::Subscribe, TxKind::BlockingCancel] {
      assert!(kind.relation_family().is_some());
      assert!(kind.identity_family().is_none());
    }
  }

  #[test]
  fn rating_kind_names_parse() {
    assert_eq!("likers".parse::<RatingKind>().unwrap(), RatingKind::AccountLikers);
    assert!("karma".parse::<RatingKind>().is_err());
  }
}
