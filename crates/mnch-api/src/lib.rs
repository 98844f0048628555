//! JSON drill-down API for MNCH training coverage.
//!
//! Exposes an axum [`Router`] backed by an [`mnch_analytics::Engine`] over any
//! [`mnch_core::store::AnalyticsStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/analytics", mnch_api::api_router(engine.clone()))
//! ```

pub mod admin;
pub mod comparison;
pub mod drilldown;
pub mod error;
pub mod export;
pub mod params;
pub mod search;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use mnch_analytics::{Cache, Engine};
use mnch_core::store::AnalyticsStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(engine: Arc<Engine<S, C>>) -> Router<()>
where
  S: AnalyticsStore + 'static,
  C: Cache,
{
  Router::new()
    // Drill-down
    .route("/national", get(drilldown::national::<S, C>))
    .route("/county/{id}", get(drilldown::county::<S, C>))
    .route(
      "/county/{id}/facility-type/{type_id}",
      get(drilldown::facility_type::<S, C>),
    )
    .route("/facility/{id}", get(drilldown::facility::<S, C>))
    .route("/participant/{id}", get(drilldown::participant::<S, C>))
    // Cross-cutting
    .route("/search-facilities", get(search::handler::<S, C>))
    .route("/county-comparison", get(comparison::handler::<S, C>))
    .route("/dashboard-stats", get(admin::dashboard_stats::<S, C>))
    // Export
    .route("/export/national", get(export::national::<S, C>))
    .route("/export/county/{id}", get(export::county::<S, C>))
    // Operations
    .route("/api-status", get(admin::api_status::<S, C>))
    .route("/clear-cache", post(admin::clear_cache::<S, C>))
    .with_state(engine)
}
