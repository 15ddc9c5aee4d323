use ledgerview_core::{
  kind::RatingKind,
  outcome::WriteOutcome,
  rating::RatingRecord,
  store::ReputationLedger,
};

use super::*;
use crate::Error;

#[tokio::test]
async fn value_difference_is_the_sum_of_deltas_between() {
  let s = store().await;
  let kind = RatingKind::Content;
  for (height, delta) in [(1, 2), (3, -1), (5, 4), (8, -10)] {
    s.append_delta(kind, 7, height, delta).await.unwrap();
  }

  let value = |h| {
    let s = s.clone();
    async move { s.value_at_or_before(kind, 7, h).await.unwrap().unwrap_or(0) }
  };
  assert_eq!(value(0).await, 0);
  assert_eq!(value(4).await - value(1).await, -1);
  assert_eq!(value(5).await - value(1).await, 3);
  assert_eq!(value(8).await - value(2).await, -7);
  assert_eq!(value(100).await, -5);
}

#[tokio::test]
async fn missing_record_is_none_not_zero() {
  let s = store().await;
  assert_eq!(s.value_at_or_before(RatingKind::Account, 1, 10).await.unwrap(), None);

  s.append_delta(RatingKind::Account, 1, 4, 0).await.unwrap();
  assert_eq!(s.value_at_or_before(RatingKind::Account, 1, 10).await.unwrap(), Some(0));
}

#[tokio::test]
async fn reapplying_a_delta_is_a_no_op() {
  let s = store().await;
  let first = s.append_delta(RatingKind::Account, 1, 2, 3).await.unwrap();
  let again = s.append_delta(RatingKind::Account, 1, 2, 3).await.unwrap();
  assert_eq!(first, WriteOutcome::Applied);
  assert_eq!(again, WriteOutcome::NoEffect);
  assert_eq!(s.value_at_or_before(RatingKind::Account, 1, 2).await.unwrap(), Some(3));
}

#[tokio::test]
async fn likers_are_counted_once() {
  let s = store().await;
  assert_eq!(s.append_liker(1, 9, 10).await.unwrap(), WriteOutcome::Applied);
  assert_eq!(s.append_liker(1, 9, 12).await.unwrap(), WriteOutcome::NoEffect);
  s.append_liker(1, 4, 11).await.unwrap();

  assert_eq!(s.liker_count_at_or_before(1, 9).await.unwrap(), 0);
  assert_eq!(s.liker_count_at_or_before(1, 10).await.unwrap(), 1);
  assert_eq!(s.liker_count_at_or_before(1, 12).await.unwrap(), 2);
}

#[tokio::test]
async fn likers_do_not_aggregate() {
  let s = store().await;
  let err = s
    .append_delta(RatingKind::AccountLikers, 1, 1, 1)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotAggregating(RatingKind::AccountLikers)));
}

#[tokio::test]
async fn overflow_is_reported() {
  let s = store().await;
  s.append_delta(RatingKind::Comment, 3, 1, i64::MAX).await.unwrap();
  let err = s.append_delta(RatingKind::Comment, 3, 2, 1).await.unwrap_err();
  assert!(matches!(err, Error::RatingOverflow { subject_id: 3, .. }));
}

#[tokio::test]
async fn history_is_oldest_first() {
  let s = store().await;
  s.append_delta(RatingKind::Account, 2, 5, 1).await.unwrap();
  s.append_delta(RatingKind::Account, 2, 6, 1).await.unwrap();

  let history = s.rating_history(RatingKind::Account, 2).await.unwrap();
  assert_eq!(history, vec![
    RatingRecord { kind: RatingKind::Account, height: 5, subject_id: 2, value: 1 },
    RatingRecord { kind: RatingKind::Account, height: 6, subject_id: 2, value: 2 },
  ]);
}

#[tokio::test]
async fn same_height_deltas_do_not_accumulate() {
  let s = store().await;
  s.append_delta(RatingKind::Account, 1, 1, 10).await.unwrap();

  assert_eq!(s.append_delta(RatingKind::Account, 1, 2, 3).await.unwrap(), WriteOutcome::Applied);
  assert_eq!(s.append_delta(RatingKind::Account, 1, 2, 4).await.unwrap(), WriteOutcome::Applied);

  // Both rows start from the height-1 value; the later one wins.
  assert_eq!(s.value_at_or_before(RatingKind::Account, 1, 2).await.unwrap(), Some(14));
  assert_eq!(s.rating_history(RatingKind::Account, 1).await.unwrap().len(), 3);
}
