use ledgerview_core::{
  entity::NewTransaction,
  kind::TxKind,
  payload::{CommentAction, TxPayload},
  store::LedgerStore,
};

use super::*;

#[tokio::test]
async fn ingested_transactions_start_unconfirmed() {
  let s = store().await;
  let alice = account("a1", "alice");
  ingest(&s, &[&alice]).await;

  let tx = s.transaction("a1").await.unwrap().unwrap();
  assert_eq!(tx.kind(), TxKind::AccountUser);
  assert_eq!(tx.time, at(0));
  assert!(!tx.is_confirmed());
  assert!(!tx.last);
  assert_eq!(tx.short_id, None);
  assert_eq!(tx.payload, alice.payload);
}

#[tokio::test]
async fn unknown_hash_returns_none() {
  let s = store().await;
  assert!(s.transaction("nope").await.unwrap().is_none());
  assert!(s.outputs("nope").await.unwrap().is_empty());
  assert!(s.transactions_at_height(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_payload_survives_storage() {
  let s = store().await;
  let reply = NewTransaction::new("c2", at(9), TxPayload::Comment {
    action:     CommentAction::Create,
    address:    "bob".into(),
    root_tx:    "c2".into(),
    content_tx: "p1".into(),
    parent_tx:  Some("c1".into()),
    answer_tx:  Some("c1".into()),
  });
  ingest(&s, &[&reply]).await;

  let stored = s.transaction("c2").await.unwrap().unwrap();
  assert_eq!(stored.payload, reply.payload);
  assert_eq!(stored.payload.subject_key(), Some("c2"));
}

#[tokio::test]
async fn outputs_are_ordered_by_number() {
  let s = store().await;
  let split = NewTransaction::new("t1", at(0), TxPayload::Transfer)
    .with_output(1, "bob", 7)
    .with_output(0, "alice", 3);
  ingest(&s, &[&split]).await;

  let outputs = s.outputs("t1").await.unwrap();
  let numbers: Vec<i64> = outputs.iter().map(|o| o.number).collect();
  assert_eq!(numbers, vec![0, 1]);
  assert_eq!(outputs[1].address, "bob");
  assert_eq!(outputs[1].value, 7);
}

#[tokio::test]
async fn first_copy_of_a_hash_wins() {
  let s = store().await;
  let batch = vec![account("a1", "alice"), account("a1", "mallory")];
  let outcome = s.insert_transactions(batch).await.unwrap();
  assert_eq!(outcome, WriteOutcome::Applied);

  let stored = s.transaction("a1").await.unwrap().unwrap();
  assert_eq!(stored.payload.address(), Some("alice"));
}
