//! Handlers for `/export/*`: flattened tables for a CSV or PDF writer.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use mnch_analytics::{Cache, Engine, export::ExportTable};
use mnch_core::{entity::CountyId, store::AnalyticsStore};

use crate::{error::ApiError, params::FilterParams};

/// `GET /export/national[?type=&year=]`
pub async fn national<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<ExportTable>, ApiError> {
  let (training_type, year) = params.resolve()?;
  Ok(Json(engine.export_national(training_type, year).await?))
}

/// `GET /export/county/{id}[?type=&year=]`
pub async fn county<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<CountyId>,
  Query(params): Query<FilterParams>,
) -> Result<Json<ExportTable>, ApiError> {
  let (training_type, year) = params.resolve()?;
  Ok(Json(engine.export_county(id, training_type, year).await?))
}
