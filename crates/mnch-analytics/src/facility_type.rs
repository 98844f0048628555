//! Facility-type analysis: every facility of one type inside one county.

use mnch_core::{
  coverage::{CoverageResult, round1},
  entity::{County, CountyId, FacilityType, FacilityTypeId, TrainingType},
  insight::{Insight, facility_type_insights},
  metrics::{Intensity, classify_intensity},
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, FacilityQuery},
};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  breakdown::{FacilityCoverageRow, facility_rows},
  cache::{Cache, key},
  engine::{Engine, Metadata, group_rows},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityTypeSummary {
  #[serde(flatten)]
  pub raw:                    CoverageResult,
  pub intensity:              Intensity,
  pub average_coverage_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityTypeAnalysis {
  pub facility_type: FacilityType,
  pub county:        County,
  /// Highest coverage score first.
  pub facilities:    Vec<FacilityCoverageRow>,
  pub summary:       FacilityTypeSummary,
  pub insights:      Vec<Insight>,
  pub metadata:      Metadata,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn facility_type(
    &self,
    county_id: CountyId,
    facility_type_id: FacilityTypeId,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<FacilityTypeAnalysis> {
    let ttl = self.ttls.facility_type;
    let key = key::facility_type(county_id, facility_type_id, training_type, year);
    self
      .cached(key, ttl, async {
        self
          .compute_facility_type(county_id, facility_type_id, training_type, year, ttl)
          .await
      })
      .await
  }

  async fn compute_facility_type(
    &self,
    county_id: CountyId,
    facility_type_id: FacilityTypeId,
    training_type: TrainingType,
    year: YearFilter,
    ttl: u64,
  ) -> Result<FacilityTypeAnalysis> {
    let county = self.require_county(county_id).await?;
    let facility_type = self
      .store
      .get_facility_type(facility_type_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found("facility type", facility_type_id))?;

    let scope = Scope::FacilityType { county_id, facility_type_id };
    let facilities = self
      .store
      .facilities(&FacilityQuery::from(scope))
      .await
      .map_err(Error::store)?;
    let rows = if facilities.is_empty() {
      Vec::new()
    } else {
      self.participations(scope, training_type, year).await?
    };

    let raw = CoverageResult::tally(facilities.len() as u64, &rows);
    let by_facility = group_rows(&rows, |r| r.facility_id);
    let mut facilities = facility_rows(&facilities, &by_facility, &self.heuristics.score);
    facilities.sort_by(|a, b| {
      b.coverage_score.cmp(&a.coverage_score).then_with(|| a.name.cmp(&b.name))
    });

    let scores: Vec<u8> = facilities.iter().map(|f| f.coverage_score).collect();
    let average = if scores.is_empty() {
      0.0
    } else {
      round1(scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64)
    };

    let h = &self.heuristics;
    Ok(FacilityTypeAnalysis {
      insights: facility_type_insights(&raw, &scores, &facility_type.name, &h.insights),
      summary: FacilityTypeSummary {
        raw,
        intensity: classify_intensity(&raw, &h.intensity),
        average_coverage_score: average,
      },
      facility_type,
      county,
      facilities,
      metadata: Metadata::new("facility_type", training_type, year, ttl),
    })
  }
}
