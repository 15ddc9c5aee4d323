//! Rating ledger records and the policy that turns scores into deltas.

use serde::{Deserialize, Serialize};

use crate::{kind::RatingKind, payload::ScoreTarget};

// ─── Ledger rows ─────────────────────────────────────────────────────────────

/// One row of the append-only `Ratings` table.
///
/// For aggregating kinds `value` is the running total at `height`; for
/// [`RatingKind::AccountLikers`] it is the liker's account id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
  pub kind:       RatingKind,
  pub height:     i64,
  pub subject_id: i64,
  pub value:      i64,
}

/// A signed change to one subject's running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDelta {
  pub kind:       RatingKind,
  pub subject_id: i64,
  pub delta:      i64,
}

// ─── Scores ──────────────────────────────────────────────────────────────────

/// A confirmed score resolved to short ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreData {
  pub score_hash: String,
  pub target:     ScoreTarget,
  pub value:      i64,
  /// Account id of the voter.
  pub voter_id:   i64,
  /// Short id of the scored content or comment.
  pub target_id:  i64,
  /// Account id of the scored item's author.
  pub author_id:  i64,
}

/// What a single score contributes to the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEffects {
  /// Added to the author's [`RatingKind::Account`] total.
  pub author_delta: i64,
  /// Added to the target's [`RatingKind::Content`] or
  /// [`RatingKind::Comment`] total.
  pub target_delta: i64,
  /// Record the voter as a liker of the author.
  pub liked:        bool,
}

/// Maps a resolved score to its rating effects.
///
/// Domain bounds (reputation floors, old-post cutoffs) belong here, never in
/// the ledger itself.
pub trait ReputationPolicy: Send + Sync {
  fn effects(&self, score: &ScoreData) -> ScoreEffects;
}

/// Content scores run 1..=5 centred on 3; comment scores are -1 or 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardReputation;

impl ReputationPolicy for StandardReputation {
  fn effects(&self, score: &ScoreData) -> ScoreEffects {
    match score.target {
      ScoreTarget::Content => ScoreEffects {
        author_delta: score.value - 3,
        target_delta: score.value - 3,
        liked:        score.value >= 4,
      },
      ScoreTarget::Comment => ScoreEffects {
        author_delta: score.value,
        target_delta: score.value,
        liked:        score.value > 0,
      },
    }
  }
}

impl ScoreData {
  /// The rating kind the target's running total is kept under.
  pub fn target_kind(&self) -> RatingKind {
    match self.target {
      ScoreTarget::Content => RatingKind::Content,
      ScoreTarget::Comment => RatingKind::Comment,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn score(target: ScoreTarget, value: i64) -> ScoreData {
    ScoreData {
      score_hash: "s".into(),
      target,
      value,
      voter_id: 1,
      target_id: 7,
      author_id: 2,
    }
  }

  #[test]
  fn content_scores_are_centred() {
    let p = StandardReputation;
    let low = p.effects(&score(ScoreTarget::Content, 1));
    assert_eq!(low.author_delta, -2);
    assert!(!low.liked);

    let neutral = p.effects(&score(ScoreTarget::Content, 3));
    assert_eq!(neutral, ScoreEffects::default());

    let high = p.effects(&score(ScoreTarget::Content, 5));
    assert_eq!(high.target_delta, 2);
    assert!(high.liked);
  }

  #[test]
  fn comment_scores_pass_through() {
    let p = StandardReputation;
    let down = p.effects(&score(ScoreTarget::Comment, -1));
    assert_eq!((down.author_delta, down.target_delta), (-1, -1));
    assert!(!down.liked);
    assert_eq!(
      score(ScoreTarget::Comment, 1).target_kind(),
      RatingKind::Comment
    );
  }
}
