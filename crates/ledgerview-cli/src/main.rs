//! `ledgerview`: operator tool for a ledgerview chain index.
//!
//! Opens the SQLite index named in `ledgerview.toml` (or `--store`), prints
//! query results as JSON and runs maintenance such as rollbacks.
//!
//! # Usage
//!
//! ```
//! ledgerview status
//! ledgerview rollback 120345
//! ledgerview rating account 42 --height 120000
//! LEDGERVIEW_STORE_PATH=~/index.db ledgerview top-addresses --count 20
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use ledgerview_core::kind::RatingKind;
use ledgerview_store_sqlite::SqliteStore;
use settings::Settings;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Inspect and maintain a ledgerview index")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "ledgerview.toml")]
  config: PathBuf,

  /// Index file; overrides `store_path` from the configuration.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Show the indexed tip height.
  Status,
  /// Undo everything indexed at or above HEIGHT.
  Rollback { height: i64 },
  /// Delete every UTXO row ahead of a full rebuild.
  ClearUtxo,
  /// Show a transaction and its outputs.
  Tx { hash: String },
  /// List the UTXOs and balance of an address.
  Utxo {
    address: String,
    /// Include spent outputs.
    #[arg(long)]
    all:     bool,
  },
  /// Addresses with the largest unspent balance.
  TopAddresses {
    #[arg(long, default_value_t = 10)]
    count: usize,
  },
  /// Rating value at a height, or the full history without `--height`.
  Rating {
    /// account, content or comment.
    kind:   RatingKind,
    id:     i64,
    #[arg(long)]
    height: Option<i64>,
  },
  /// Number of distinct likers of an account.
  Likers {
    id:     i64,
    #[arg(long)]
    height: Option<i64>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  let shutdown = CancellationToken::new();
  tokio::spawn({
    let shutdown = shutdown.clone();
    async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupt received, stopping after the current step");
        shutdown.cancel();
      }
    }
  });

  let store = SqliteStore::open(&settings.store_path, shutdown)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  let output = commands::run(&store, cli.command).await?;
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}
