//! Facility search with per-facility coverage filtering.

use std::str::FromStr;

use mnch_core::{
  entity::{CountyId, FacilityTypeId, TrainingType},
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, FacilityQuery},
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::{
  Error, Result,
  cache::Cache,
  breakdown::{FacilityCoverageRow, facility_rows},
  engine::{Engine, group_rows},
};

/// Maximum facilities returned by one search.
pub const SEARCH_LIMIT: usize = 50;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CoverageFilter {
  /// At least one attributed participation.
  Covered,
  Uncovered,
  /// Coverage score at or above the success threshold.
  High,
  /// Coverage score below the low threshold.
  Low,
}

impl CoverageFilter {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s.trim()).map_err(|_| {
      Error::Validation(format!(
        "invalid coverage_filter {s:?} (expected covered, uncovered, high, or low)"
      ))
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
  /// Substring of the facility name or MFL code.
  pub text:             Option<String>,
  pub county_id:        Option<CountyId>,
  pub facility_type_id: Option<FacilityTypeId>,
  pub coverage_filter:  Option<CoverageFilter>,
  pub training_type:    TrainingType,
  pub year:             YearFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
  pub facilities:      Vec<FacilityCoverageRow>,
  /// Matches before truncation to [`SEARCH_LIMIT`].
  pub total_found:     usize,
  pub filters_applied: SearchQuery,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn search_facilities(&self, query: SearchQuery) -> Result<SearchResults> {
    let text = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let facilities = self
      .store
      .facilities(&FacilityQuery {
        county_id:        query.county_id,
        facility_type_id: query.facility_type_id,
        facility_id:      None,
        text:             text.map(str::to_owned),
        limit:            None,
      })
      .await
      .map_err(Error::store)?;

    let scope = match (query.county_id, query.facility_type_id) {
      (Some(county_id), Some(facility_type_id)) => {
        Scope::FacilityType { county_id, facility_type_id }
      }
      (Some(county_id), None) => Scope::County(county_id),
      _ => Scope::National,
    };
    let rows = if facilities.is_empty() {
      Vec::new()
    } else {
      self.participations(scope, query.training_type, query.year).await?
    };

    let by_facility = group_rows(&rows, |r| r.facility_id);
    let t = &self.heuristics.insights;
    let mut matches: Vec<FacilityCoverageRow> =
      facility_rows(&facilities, &by_facility, &self.heuristics.score)
        .into_iter()
        .filter(|f| match query.coverage_filter {
          None => true,
          Some(CoverageFilter::Covered) => f.is_covered,
          Some(CoverageFilter::Uncovered) => !f.is_covered,
          Some(CoverageFilter::High) => f.coverage_score >= t.facility_score_success,
          Some(CoverageFilter::Low) => f.coverage_score < t.facility_score_low,
        })
        .collect();

    let total_found = matches.len();
    matches.truncate(SEARCH_LIMIT);
    Ok(SearchResults { facilities: matches, total_found, filters_applied: query })
  }
}
