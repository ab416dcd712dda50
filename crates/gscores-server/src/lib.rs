//! HTTP server assembly for G-Scores.
//!
//! Mounts the query API under `/api` and at the root, with request tracing
//! and optional permissive CORS.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use gscores_core::store::ScoreStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GSCORES_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Allow cross-origin requests from any origin.
  pub cors:       bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "0.0.0.0".to_string(),
      port:       3000,
      store_path: PathBuf::from("gscores.db"),
      cors:       true,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's axum [`Router`] over `store`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: ScoreStore + 'static,
{
  let api = gscores_api::api_router(store);
  let app = Router::new()
    .nest("/api", api.clone())
    .merge(api)
    .layer(TraceLayer::new_for_http());

  if config.cors {
    app.layer(CorsLayer::permissive())
  } else {
    app
  }
}
