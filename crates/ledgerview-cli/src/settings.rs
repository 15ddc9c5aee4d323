//! Runtime settings, layered from an optional TOML file and `LEDGERVIEW_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Deserialised from `ledgerview.toml`.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
  /// SQLite file holding the index.
  pub store_path: PathBuf,
}

impl Settings {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", "ledgerview.db")?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("LEDGERVIEW"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
