//! Handler for `GET /county-comparison`.
//!
//! Ids arrive as `county_ids[]=1&county_ids[]=2` or `county_ids=1,2`. At most
//! five distinct ids are accepted; more is a 400 before anything is computed.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, RawQuery, State},
};
use mnch_analytics::{Cache, Engine, comparison::CountyComparison};
use mnch_core::store::AnalyticsStore;

use crate::{
  error::ApiError,
  params::{FilterParams, county_ids},
};

/// `GET /county-comparison?county_ids[]=…[&type=&year=]`
pub async fn handler<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  RawQuery(raw): RawQuery,
  Query(params): Query<FilterParams>,
) -> Result<Json<CountyComparison>, ApiError> {
  let ids = county_ids(raw.as_deref())?;
  let (training_type, year) = params.resolve()?;
  let comparison = engine.compare_counties(&ids, training_type, year).await?;
  Ok(Json(comparison))
}
