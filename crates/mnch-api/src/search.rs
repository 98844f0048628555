//! Handler for `GET /search-facilities`.
//!
//! Query parameters: `query`, `county_id`, `facility_type_id`,
//! `coverage_filter` (`covered|uncovered|high|low`), `type`, `year`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use mnch_analytics::{
  Cache, Engine,
  search::{CoverageFilter, SearchQuery, SearchResults},
};
use mnch_core::{
  entity::{CountyId, FacilityTypeId},
  store::AnalyticsStore,
};
use serde::Deserialize;

use crate::{error::ApiError, params::FilterParams};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub query:            Option<String>,
  pub county_id:        Option<CountyId>,
  pub facility_type_id: Option<FacilityTypeId>,
  pub coverage_filter:  Option<String>,
  #[serde(rename = "type")]
  pub training_type:    Option<String>,
  pub year:             Option<String>,
}

/// `GET /search-facilities`
pub async fn handler<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
  let (training_type, year) = FilterParams {
    training_type: params.training_type,
    year:          params.year,
  }
  .resolve()?;
  let coverage_filter = params
    .coverage_filter
    .as_deref()
    .filter(|f| !f.trim().is_empty())
    .map(CoverageFilter::parse)
    .transpose()?;

  let results = engine
    .search_facilities(SearchQuery {
      text: params.query,
      county_id: params.county_id,
      facility_type_id: params.facility_type_id,
      coverage_filter,
      training_type,
      year,
    })
    .await?;
  Ok(Json(results))
}
