//! Runtime configuration, layered from defaults, an optional TOML file and
//! `PERSONA_*` environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use persona_store_sqlite::StoreTimeouts;
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `PERSONA_PORT=9000`.
pub const ENV_PREFIX: &str = "PERSONA";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub create_timeout_secs: u64,
  pub read_timeout_secs:   u64,
}

impl ServerConfig {
  /// Load from `path` (if it exists) with environment overrides on top.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8080)?
      .set_default("store_path", "personas.db")?
      .set_default("create_timeout_secs", 5)?
      .set_default("read_timeout_secs", 30)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn timeouts(&self) -> StoreTimeouts {
    StoreTimeouts {
      write: Duration::from_secs(self.create_timeout_secs),
      read:  Duration::from_secs(self.read_timeout_secs),
    }
  }

  /// `store_path` with a leading `~/` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
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
