use std::time::Duration;

use ledgerview_core::{
  outcome::WriteOutcome,
  store::{ChainIndexer, UtxoIndex},
  utxo::{AddressBalance, Utxo},
};

use tokio_util::sync::CancellationToken;

use super::*;
use crate::Error;

fn utxo(tx_id: &str, output_index: i64, block: i64, address: &str, amount: i64) -> Utxo {
  Utxo {
    tx_id: tx_id.into(),
    block,
    output_index,
    time: at(block),
    address: address.into(),
    amount,
    block_spent: None,
  }
}

fn spent_at(u: &Utxo, height: i64) -> Utxo {
  Utxo { block_spent: Some(height), ..u.clone() }
}

#[tokio::test]
async fn insert_is_idempotent() {
  let s = store().await;
  let u = utxo("t1", 0, 5, "alice", 10);

  assert_eq!(s.insert(&u).await.unwrap(), WriteOutcome::Applied);
  assert_eq!(s.insert(&u).await.unwrap(), WriteOutcome::NoEffect);

  let found = s.utxos_by_address("alice", false).await.unwrap();
  assert_eq!(found, vec![u]);
}

#[tokio::test]
async fn spend_round_trips_through_rollback() {
  let s = store().await;
  let u = utxo("t1", 0, 5, "alice", 10);
  s.insert(&u).await.unwrap();

  assert_eq!(s.spent(&spent_at(&u, 7)).await.unwrap(), WriteOutcome::Applied);
  assert_eq!(s.balance("alice").await.unwrap(), 0);
  assert!(s.utxos_by_address("alice", false).await.unwrap().is_empty());
  let all = s.utxos_by_address("alice", true).await.unwrap();
  assert_eq!(all[0].block_spent, Some(7));

  let report = s.rollback_to_height(7).await.unwrap().finished().unwrap();
  assert_eq!(report.utxo_unspent, 1);
  assert_eq!(s.utxos_by_address("alice", false).await.unwrap(), vec![u.clone()]);
  assert_eq!(s.balance("alice").await.unwrap(), 10);

  let report = s.rollback_to_height(5).await.unwrap().finished().unwrap();
  assert_eq!(report.utxo_deleted, 1);
  assert!(s.utxos_by_address("alice", true).await.unwrap().is_empty());
}

#[tokio::test]
async fn spending_an_unknown_utxo_fails() {
  let s = store().await;
  let ghost = spent_at(&utxo("t9", 3, 1, "alice", 1), 2);

  let err = s.spent(&ghost).await.unwrap_err();
  assert!(matches!(err, Error::UtxoNotFound { ref tx_id, output_index: 3 } if tx_id == "t9"));
  assert!(err.is_precondition());
}

#[tokio::test]
async fn spending_requires_a_height() {
  let s = store().await;
  let u = utxo("t1", 0, 5, "alice", 10);
  s.insert(&u).await.unwrap();

  let err = s.spent(&u).await.unwrap_err();
  assert!(matches!(err, Error::MissingSpendHeight { .. }));
}

#[tokio::test]
async fn failed_bulk_spend_leaves_nothing_behind() {
  let s = store().await;
  let known = utxo("t1", 0, 5, "alice", 10);
  let unknown = utxo("t2", 0, 5, "alice", 4);
  s.insert(&known).await.unwrap();

  let err = s
    .bulk_spent(&[spent_at(&known, 6), spent_at(&unknown, 6)])
    .await
    .unwrap_err();
  assert!(err.is_precondition());

  let rows = s.utxos_by_address("alice", true).await.unwrap();
  assert_eq!(rows, vec![known]);
}

#[tokio::test]
async fn bulk_insert_reports_no_effect_for_known_rows() {
  let s = store().await;
  let batch = vec![utxo("t1", 0, 1, "alice", 10), utxo("t1", 1, 1, "bob", 3)];

  assert_eq!(s.bulk_insert(&batch).await.unwrap(), WriteOutcome::Applied);
  assert_eq!(s.bulk_insert(&batch).await.unwrap(), WriteOutcome::NoEffect);
  assert_eq!(s.utxos_by_address("bob", false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_insert_honours_shutdown() {
  let s = store().await;
  s.shutdown_token().cancel();

  let outcome = s.bulk_insert(&[utxo("t1", 0, 1, "alice", 10)]).await.unwrap();
  assert_eq!(outcome, WriteOutcome::Stopped);
  assert!(s.utxos_by_address("alice", true).await.unwrap().is_empty());
}

#[tokio::test]
async fn top_addresses_rank_unspent_balance() {
  let s = store().await;
  let batch = vec![
    utxo("t1", 0, 1, "alice", 10),
    utxo("t1", 1, 1, "bob", 30),
    utxo("t2", 0, 2, "alice", 15),
    utxo("t3", 0, 2, "carol", 100),
  ];
  s.bulk_insert(&batch).await.unwrap();
  s.spent(&spent_at(&batch[3], 3)).await.unwrap();

  let top = s.top_addresses(2).await.unwrap();
  assert_eq!(top, vec![
    AddressBalance { address: "bob".into(), balance: 30 },
    AddressBalance { address: "alice".into(), balance: 25 },
  ]);

  assert_eq!(s.clear_all().await.unwrap(), WriteOutcome::Applied);
  assert!(s.top_addresses(10).await.unwrap().is_empty());
  assert_eq!(s.clear_all().await.unwrap(), WriteOutcome::NoEffect);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reads_do_not_wait_for_a_running_write() {
  let dir = tempfile::tempdir().unwrap();
  let s = file_store(&dir, CancellationToken::new()).await;
  let batch: Vec<Utxo> = (0..200_000)
    .map(|i| utxo(&format!("t{i}"), 0, 1, "alice", 1))
    .collect();

  let write = tokio::spawn({
    let s = s.clone();
    async move { s.bulk_insert(&batch).await }
  });
  tokio::time::sleep(Duration::from_millis(50)).await;

  // Answered from the last committed state while the batch is still open.
  assert_eq!(s.balance("alice").await.unwrap(), 0);
  assert!(!write.is_finished());

  assert_eq!(write.await.unwrap().unwrap(), WriteOutcome::Applied);
  assert_eq!(s.balance("alice").await.unwrap(), 200_000);
}
