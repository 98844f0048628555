//! Server wiring for the MNCH analytics API: configuration and the
//! top-level router.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use mnch_analytics::{Cache, CacheTtls, Engine};
use mnch_core::{metrics::Heuristics, store::AnalyticsStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `MNCH__*`
/// environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
  /// Mount point for the analytics API.
  pub base_path:     String,
  pub cache:         CacheTtls,
  pub heuristics:    Heuristics,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_owned(),
      port:          8080,
      database_path: PathBuf::from("mnch.sqlite3"),
      base_path:     "/api/analytics".to_owned(),
      cache:         CacheTtls::default(),
      heuristics:    Heuristics::default(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The analytics API nested under `base_path`, with request tracing.
pub fn app<S, C>(engine: Arc<Engine<S, C>>, base_path: &str) -> Router
where
  S: AnalyticsStore + 'static,
  C: Cache,
{
  let api = mnch_api::api_router(engine);
  let router = match base_path.trim_end_matches('/') {
    "" => api,
    path => Router::new().nest(path, api),
  };
  router.layer(TraceLayer::new_for_http())
}
