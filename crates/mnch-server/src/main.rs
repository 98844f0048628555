//! mnch-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `MNCH__*` environment variables, opens the SQLite store, and serves the
//! analytics API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use mnch_analytics::{Engine, MemoryCache};
use mnch_server::ServerConfig;
use mnch_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "MNCH training coverage analytics server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MNCH").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store = SqliteStore::open(&server_cfg.database_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.database_path)
    })?;

  let engine = Engine::new(Arc::new(store), MemoryCache::new())
    .with_ttls(server_cfg.cache.clone())
    .with_heuristics(server_cfg.heuristics.clone());

  let app = mnch_server::app(Arc::new(engine), &server_cfg.base_path);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}{}", server_cfg.base_path);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
