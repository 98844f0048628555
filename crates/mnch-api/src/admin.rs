//! Operational endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dashboard-stats` | `?type=&year=` |
//! | `GET`  | `/api-status` | 503 when any check is unhealthy |
//! | `POST` | `/clear-cache` | Optional body: `{"scope_type":"county","scope_id":3}` |

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mnch_analytics::{
  Cache, ClearedCache, Engine, Invalidation,
  health::OverallStatus,
  stats::DashboardStats,
};
use mnch_core::store::AnalyticsStore;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, params::FilterParams};

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /dashboard-stats[?type=&year=]`
pub async fn dashboard_stats<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<DashboardStats>, ApiError> {
  let (training_type, year) = params.resolve()?;
  Ok(Json(engine.dashboard_stats(training_type, year).await?))
}

// ─── Health ──────────────────────────────────────────────────────────────────

/// `GET /api-status`
pub async fn api_status<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
) -> impl IntoResponse {
  let report = engine.health().await;
  let status = match report.overall_status {
    OverallStatus::Healthy => StatusCode::OK,
    OverallStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
  };
  (status, Json(report))
}

// ─── Cache ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
  County,
  Facility,
  Participant,
}

#[derive(Debug, Deserialize)]
pub struct ClearBody {
  pub scope_type: Option<ScopeType>,
  pub scope_id:   Option<i64>,
}

impl ClearBody {
  fn invalidation(self) -> Result<Invalidation, ApiError> {
    match (self.scope_type, self.scope_id) {
      (None, _) => Ok(Invalidation::All),
      (Some(_), None) => {
        Err(ApiError::BadRequest("scope_id is required with scope_type".to_owned()))
      }
      (Some(ScopeType::County), Some(id)) => Ok(Invalidation::County(id)),
      (Some(ScopeType::Facility), Some(id)) => Ok(Invalidation::Facility(id)),
      (Some(ScopeType::Participant), Some(id)) => Ok(Invalidation::Participant(id)),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
  pub message: String,
  pub cleared: ClearedCache,
}

/// `POST /clear-cache`: an empty body flushes everything.
pub async fn clear_cache<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  body: Bytes,
) -> Result<Json<ClearResponse>, ApiError> {
  let target = if body.iter().all(u8::is_ascii_whitespace) {
    Invalidation::All
  } else {
    serde_json::from_slice::<ClearBody>(&body)
      .map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))?
      .invalidation()?
  };

  let cleared = engine.invalidate(target).await?;
  let message = match target {
    Invalidation::All => "cache flushed".to_owned(),
    _ => format!("cleared {} cached entries", cleared.entries_removed),
  };
  Ok(Json(ClearResponse { message, cleared }))
}
