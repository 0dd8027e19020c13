//! Process wiring for the Pact agreement server: runtime configuration and
//! the directory seeding used by the `--seed` flag.

pub mod seed;

use std::path::{Path, PathBuf};

use serde::Deserialize;

// ─── Config ──────────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PACT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Move agreements to ACTIVE as soon as they seal if the stay has started.
  #[serde(default)]
  pub activate_on_seal: bool,
  /// Lines per rendered document page, footer included.
  #[serde(default = "default_page_lines")]
  pub page_lines:       usize,
  #[serde(default = "default_page_width")]
  pub page_width:       usize,
  /// Capacity of the in-process notification queue.
  #[serde(default = "default_notify_buffer")]
  pub notify_buffer:    usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/pact/pact.db") }
fn default_page_lines() -> usize { pact_document::DEFAULT_PAGE_LINES }
fn default_page_width() -> usize { pact_document::DEFAULT_PAGE_WIDTH }
fn default_notify_buffer() -> usize { 256 }

impl ServerConfig {
  /// Layer the optional config file under `PACT_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    use anyhow::Context as _;

    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PACT").try_parsing(true))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
