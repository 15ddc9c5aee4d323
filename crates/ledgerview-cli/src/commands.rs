//! Subcommand handlers. Each returns the JSON value printed on stdout.

use anyhow::{Context as _, bail};
use ledgerview_core::{
  kind::RatingKind,
  store::{ChainIndexer, LedgerStore, ReputationLedger, UtxoIndex},
};
use ledgerview_store_sqlite::SqliteStore;
use serde_json::{Value, json};

use crate::Command;

pub(crate) async fn run(store: &SqliteStore, command: Command) -> anyhow::Result<Value> {
  let value = match command {
    Command::Status => json!({ "tip_height": store.tip_height().await? }),

    Command::Rollback { height } => {
      let completion = store
        .rollback_to_height(height)
        .await
        .with_context(|| format!("rollback to {height} failed"))?;
      if completion.is_stopped() {
        tracing::warn!(height, "rollback interrupted before it started");
      }
      serde_json::to_value(completion)?
    }

    Command::ClearUtxo => json!({ "outcome": store.clear_all().await? }),

    Command::Tx { hash } => {
      let Some(tx) = store.transaction(&hash).await? else {
        bail!("transaction {hash} not found");
      };
      let outputs = store.outputs(&hash).await?;
      json!({ "transaction": tx, "outputs": outputs })
    }

    Command::Utxo { address, all } => {
      let utxos = store.utxos_by_address(&address, all).await?;
      let balance = store.balance(&address).await?;
      json!({ "address": address, "balance": balance, "utxos": utxos })
    }

    Command::TopAddresses { count } => {
      serde_json::to_value(store.top_addresses(count).await?)?
    }

    Command::Rating { kind, id, height } => match height {
      Some(height) => {
        let value = store.value_at_or_before(kind, id, height).await?;
        json!({ "kind": kind, "id": id, "height": height, "value": value })
      }
      None => serde_json::to_value(store.rating_history(kind, id).await?)?,
    },

    Command::Likers { id, height } => {
      let height = height.unwrap_or(i64::MAX);
      let count = store.liker_count_at_or_before(id, height).await?;
      json!({ "kind": RatingKind::AccountLikers, "id": id, "likers": count })
    }
  };
  Ok(value)
}
