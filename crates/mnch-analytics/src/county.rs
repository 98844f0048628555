//! County analysis: coverage with derived metrics, per-type, per-department,
//! per-cadre, and per-facility breakdowns, insights, and recommended actions.

use mnch_core::{
  coverage::{CoverageResult, FacilityTypeCoverage, StaffGroupCoverage, round1},
  entity::{County, CountyId, TrainingType},
  insight::{Insight, RecommendedAction, county_insights, recommended_actions},
  metrics::{
    Intensity, Priority, Trend, classify_intensity, classify_priority, intensity_score,
  },
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, FacilityQuery},
};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  breakdown::{
    FacilityCoverageRow, StaffGrouping, facility_rows, facility_type_breakdown,
    staff_groups, trained_users,
  },
  cache::{Cache, key},
  engine::{Engine, Metadata, group_rows},
};

/// A [`CoverageResult`] with the metrics derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeCoverage {
  #[serde(flatten)]
  pub raw:             CoverageResult,
  pub intensity:       Intensity,
  pub intensity_score: f64,
  pub trend:           Trend,
  pub priority:        Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyAnalysis {
  pub county:              County,
  pub coverage:            ScopeCoverage,
  pub facility_types:      Vec<FacilityTypeCoverage>,
  pub departments:         Vec<StaffGroupCoverage>,
  pub cadres:              Vec<StaffGroupCoverage>,
  pub facilities:          Vec<FacilityCoverageRow>,
  pub insights:            Vec<Insight>,
  pub recommended_actions: Vec<RecommendedAction>,
  pub metadata:            Metadata,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn county(
    &self,
    county_id: CountyId,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<CountyAnalysis> {
    let ttl = self.ttls.county;
    self
      .cached(key::county(county_id, training_type, year), ttl, async {
        self.compute_county(county_id, training_type, year, ttl).await
      })
      .await
  }

  pub(crate) async fn require_county(&self, id: CountyId) -> Result<County> {
    self
      .store
      .get_county(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found("county", id))
  }

  /// Derive intensity, trend, and priority for an already tallied scope.
  pub(crate) async fn derive(
    &self,
    scope: Scope,
    raw: CoverageResult,
    training_type: TrainingType,
    year: YearFilter,
  ) -> ScopeCoverage {
    let h = &self.heuristics;
    ScopeCoverage {
      intensity: classify_intensity(&raw, &h.intensity),
      intensity_score: round1(intensity_score(&raw, &h.intensity)),
      trend: self.trend(scope, training_type, year).await,
      priority: classify_priority(raw.total_facilities, raw.coverage_percentage, &h.priority),
      raw,
    }
  }

  async fn compute_county(
    &self,
    county_id: CountyId,
    training_type: TrainingType,
    year: YearFilter,
    ttl: u64,
  ) -> Result<CountyAnalysis> {
    let county = self.require_county(county_id).await?;
    let scope = Scope::County(county_id);

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
    let staff = self.store.staff(scope).await.map_err(Error::store)?;

    let raw = CoverageResult::tally(facilities.len() as u64, &rows);
    let coverage = self.derive(scope, raw, training_type, year).await;

    let facility_types = facility_type_breakdown(&facilities, &rows);
    let trained = trained_users(&rows);
    let departments = staff_groups(&staff, &trained, StaffGrouping::Department);
    let cadres = staff_groups(&staff, &trained, StaffGrouping::Cadre);
    let by_facility = group_rows(&rows, |r| r.facility_id);
    let facilities = facility_rows(&facilities, &by_facility, &self.heuristics.score);

    let h = &self.heuristics;
    Ok(CountyAnalysis {
      insights: county_insights(&facility_types, &departments, &h.insights),
      recommended_actions: recommended_actions(&facility_types, &departments, &h.actions),
      county,
      coverage,
      facility_types,
      departments,
      cadres,
      facilities,
      metadata: Metadata::new("county", training_type, year, ttl),
    })
  }
}
