//! Dependency health: storage round trip, cache round trip, entity counts.
//!
//! Each check reports independently; a failed check degrades the overall
//! status but never fails the report itself.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use mnch_core::store::{AnalyticsStore, EntityCounts};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{cache::Cache, engine::Engine};

const CHECK_KEY: &str = "health:check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
  Healthy,
  Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
  Healthy,
  Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
  pub status:           CheckStatus,
  pub message:          String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response_time_ms: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub counts:           Option<EntityCounts>,
}

impl HealthCheck {
  fn healthy(message: impl Into<String>) -> Self {
    Self {
      status:           CheckStatus::Healthy,
      message:          message.into(),
      response_time_ms: None,
      counts:           None,
    }
  }

  fn unhealthy(message: impl Into<String>) -> Self {
    Self { status: CheckStatus::Unhealthy, ..Self::healthy(message) }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthChecks {
  pub database: HealthCheck,
  pub cache:    HealthCheck,
  pub models:   HealthCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
  pub overall_status: OverallStatus,
  pub checks:         HealthChecks,
  pub timestamp:      DateTime<Utc>,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  /// Never cached.
  pub async fn health(&self) -> HealthReport {
    let checks = HealthChecks {
      database: self.check_database().await,
      cache:    self.check_cache().await,
      models:   self.check_models().await,
    };
    let all_healthy = [&checks.database, &checks.cache, &checks.models]
      .iter()
      .all(|c| c.status == CheckStatus::Healthy);

    let overall_status = if all_healthy {
      OverallStatus::Healthy
    } else {
      warn!(?checks, "health check degraded");
      OverallStatus::Degraded
    };
    HealthReport { overall_status, checks, timestamp: Utc::now() }
  }

  async fn check_database(&self) -> HealthCheck {
    let started = Instant::now();
    match self.store.ping().await {
      Ok(()) => {
        let elapsed = started.elapsed().as_secs_f64() * 1000.0;
        HealthCheck {
          response_time_ms: Some((elapsed * 100.0).round() / 100.0),
          ..HealthCheck::healthy("database connection successful")
        }
      }
      Err(e) => HealthCheck::unhealthy(format!("database connection failed: {e}")),
    }
  }

  async fn check_cache(&self) -> HealthCheck {
    let marker = json!({ "checked_at": Utc::now().timestamp_millis() });
    self
      .cache
      .put(CHECK_KEY.to_owned(), marker.clone(), Duration::from_secs(10))
      .await;
    let read = self.cache.get(CHECK_KEY).await;
    self.cache.remove(CHECK_KEY).await;

    if read.as_ref() == Some(&marker) {
      HealthCheck::healthy("cache read/write successful")
    } else {
      HealthCheck::unhealthy("cache read/write round trip returned a different value")
    }
  }

  async fn check_models(&self) -> HealthCheck {
    match self.store.entity_counts().await {
      Ok(counts) => HealthCheck {
        counts: Some(counts),
        ..HealthCheck::healthy("entity tables readable")
      },
      Err(e) => HealthCheck::unhealthy(format!("entity count failed: {e}")),
    }
  }
}
