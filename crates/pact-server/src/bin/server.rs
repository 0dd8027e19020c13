//! pact server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the agreement API over HTTP.
//!
//! Two one-shot modes exist for operators:
//!
//! ```
//! server --seed directory.json   # load users and listings, then exit
//! server --sweep                 # run today's lifecycle sweep, then exit
//! ```

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use pact_api::{AgreementService, notify::ChannelNotifier};
use pact_document::TextRenderer;
use pact_server::{ServerConfig, expand_tilde, seed};
use pact_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Pact agreement server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run one lifecycle sweep for today's date and exit.
  #[arg(long)]
  sweep: bool,

  /// Load users and listings from a JSON file and exit.
  #[arg(long, value_name = "PATH")]
  seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: seed the directory mirror and exit.
  if let Some(path) = cli.seed {
    let (users, listings) = seed::load(&store, &path).await?;
    tracing::info!(users, listings, "seeded directory from {path:?}");
    return Ok(());
  }

  let renderer = TextRenderer::new(server_cfg.page_lines, server_cfg.page_width)
    .context("invalid document page size")?;
  let (notifier, delivery) = ChannelNotifier::spawn(server_cfg.notify_buffer);

  let service = AgreementService::new(Arc::new(store), Arc::new(notifier), Arc::new(renderer))
    .with_activate_on_seal(server_cfg.activate_on_seal);

  // Helper mode: one sweep, then let the queued notifications drain.
  if cli.sweep {
    let report = service
      .sweep(Utc::now().date_naive())
      .await
      .context("lifecycle sweep failed")?;
    tracing::info!(
      activated = report.activated,
      completed = report.completed,
      skipped = report.skipped,
      failed = report.failed,
      "sweep finished"
    );
    drop(service);
    delivery.await.context("notification task panicked")?;
    return Ok(());
  }

  let app = pact_api::router(service);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}
