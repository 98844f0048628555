//! Handlers for the five drill-down levels.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/national` | `?type=&year=` |
//! | `GET`  | `/county/{id}` | 404 if the county does not exist |
//! | `GET`  | `/county/{id}/facility-type/{type_id}` | 404 for either id |
//! | `GET`  | `/facility/{id}` | 404 if not found |
//! | `GET`  | `/participant/{id}` | Ignores `type` and `year` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use mnch_analytics::{
  Cache, Engine,
  county::CountyAnalysis,
  facility::FacilityAnalysis,
  facility_type::FacilityTypeAnalysis,
  national::NationalOverview,
  participant::ParticipantProfile,
};
use mnch_core::{
  entity::{CountyId, FacilityId, FacilityTypeId, UserId},
  store::AnalyticsStore,
};

use crate::{error::ApiError, params::FilterParams};

/// `GET /national[?type=&year=]`
pub async fn national<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<NationalOverview>, ApiError> {
  let (training_type, year) = params.resolve()?;
  Ok(Json(engine.national(training_type, year).await?))
}

/// `GET /county/{id}[?type=&year=]`
pub async fn county<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<CountyId>,
  Query(params): Query<FilterParams>,
) -> Result<Json<CountyAnalysis>, ApiError> {
  let (training_type, year) = params.resolve()?;
  Ok(Json(engine.county(id, training_type, year).await?))
}

/// `GET /county/{id}/facility-type/{type_id}[?type=&year=]`
pub async fn facility_type<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path((county_id, type_id)): Path<(CountyId, FacilityTypeId)>,
  Query(params): Query<FilterParams>,
) -> Result<Json<FacilityTypeAnalysis>, ApiError> {
  let (training_type, year) = params.resolve()?;
  let analysis = engine
    .facility_type(county_id, type_id, training_type, year)
    .await?;
  Ok(Json(analysis))
}

/// `GET /facility/{id}[?type=&year=]`
pub async fn facility<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<FacilityId>,
  Query(params): Query<FilterParams>,
) -> Result<Json<FacilityAnalysis>, ApiError> {
  let (training_type, year) = params.resolve()?;
  Ok(Json(engine.facility(id, training_type, year).await?))
}

/// `GET /participant/{id}`
pub async fn participant<S: AnalyticsStore, C: Cache>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<UserId>,
) -> Result<Json<ParticipantProfile>, ApiError> {
  Ok(Json(engine.participant(id).await?))
}
