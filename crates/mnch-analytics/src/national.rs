//! National overview: one summary row per county plus the national totals.

use std::collections::HashMap;

use chrono::Utc;
use mnch_core::{
  coverage::{CoverageResult, round1},
  entity::{CountyId, TrainingType},
  insight::{Insight, national_insights},
  metrics::{
    Intensity, Priority, Trend, classify_intensity, classify_priority, intensity_score,
  },
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, FacilityQuery, ParticipationRow},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
  Error, Result,
  cache::{Cache, key},
  engine::{Engine, Metadata, group_rows, trend_between},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountySummary {
  pub id:                   CountyId,
  pub name:                 String,
  pub total_facilities:     u64,
  pub covered_facilities:   u64,
  pub uncovered_facilities: u64,
  pub participant_count:    u64,
  pub program_count:        u64,
  pub coverage_percentage:  f64,
  pub intensity:            Intensity,
  pub intensity_score:      f64,
  pub trend:                Trend,
  pub priority:             Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalSummary {
  pub total_counties:          u64,
  pub counties_with_coverage:  u64,
  pub total_facilities:        u64,
  pub covered_facilities:      u64,
  pub total_participants:      u64,
  pub total_programs:          u64,
  pub coverage_percentage:     f64,
  pub average_county_coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalOverview {
  pub counties:         Vec<CountySummary>,
  pub national_summary: NationalSummary,
  pub insights:         Vec<Insight>,
  pub metadata:         Metadata,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn national(
    &self,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<NationalOverview> {
    let ttl = self.ttls.national;
    self
      .cached(key::national(training_type, year), ttl, async {
        self.compute_national(training_type, year, ttl).await
      })
      .await
  }

  async fn compute_national(
    &self,
    training_type: TrainingType,
    year: YearFilter,
    ttl: u64,
  ) -> Result<NationalOverview> {
    let h = &self.heuristics;
    let counties = self.store.counties().await.map_err(Error::store)?;
    let facilities = self
      .store
      .facilities(&FacilityQuery::default())
      .await
      .map_err(Error::store)?;
    let rows = self.participations(Scope::National, training_type, year).await?;

    let mut totals: HashMap<CountyId, u64> = HashMap::new();
    for f in &facilities {
      *totals.entry(f.county_id).or_default() += 1;
    }
    let by_county = group_rows(&rows, |r| r.county_id);
    let trends = self.county_trends(training_type, year, &totals).await;

    let summaries: Vec<CountySummary> = counties
      .iter()
      .map(|c| {
        let total = totals.get(&c.id).copied().unwrap_or(0);
        let own = by_county.get(&c.id).map(Vec::as_slice).unwrap_or_default();
        let coverage = CoverageResult::tally(total, own.iter().copied());
        CountySummary {
          id:                   c.id,
          name:                 c.name.clone(),
          total_facilities:     total,
          covered_facilities:   coverage.covered_facilities,
          uncovered_facilities: coverage.uncovered_facilities(),
          participant_count:    coverage.participant_count,
          program_count:        coverage.program_count,
          coverage_percentage:  coverage.coverage_percentage,
          intensity:            classify_intensity(&coverage, &h.intensity),
          intensity_score:      round1(intensity_score(&coverage, &h.intensity)),
          trend:                trends.get(&c.id).copied().unwrap_or(Trend::Unknown),
          priority:             classify_priority(
            total,
            coverage.coverage_percentage,
            &h.priority,
          ),
        }
      })
      .collect();

    let percentages: Vec<f64> = summaries.iter().map(|s| s.coverage_percentage).collect();
    let national = CoverageResult::tally(facilities.len() as u64, &rows);
    let average = if percentages.is_empty() {
      0.0
    } else {
      round1(percentages.iter().sum::<f64>() / percentages.len() as f64)
    };

    Ok(NationalOverview {
      national_summary: NationalSummary {
        total_counties:          summaries.len() as u64,
        counties_with_coverage:  summaries.iter().filter(|s| s.covered_facilities > 0).count()
          as u64,
        total_facilities:        national.total_facilities,
        covered_facilities:      national.covered_facilities,
        total_participants:      national.participant_count,
        total_programs:          national.program_count,
        coverage_percentage:     national.coverage_percentage,
        average_county_coverage: average,
      },
      insights: national_insights(&percentages, training_type, &h.insights),
      counties: summaries,
      metadata: Metadata::new("national", training_type, year, ttl),
    })
  }

  /// Trend for every county from two national queries (anchor year and the
  /// year before) instead of two per county. Failures leave every county
  /// `Unknown`.
  async fn county_trends(
    &self,
    training_type: TrainingType,
    year: YearFilter,
    totals: &HashMap<CountyId, u64>,
  ) -> HashMap<CountyId, Trend> {
    let anchor = year.anchor_year(Utc::now().date_naive());
    let loaded = async {
      let previous = self
        .participations(Scope::National, training_type, YearFilter::Year(anchor - 1))
        .await?;
      let current = self
        .participations(Scope::National, training_type, YearFilter::Year(anchor))
        .await?;
      Ok::<_, Error>((current, previous))
    }
    .await;

    let (current, previous) = match loaded {
      Ok(pair) => pair,
      Err(e) => {
        warn!(anchor, error = %e, "national trend calculation failed");
        return HashMap::new();
      }
    };

    let current = group_rows(&current, |r| r.county_id);
    let previous = group_rows(&previous, |r| r.county_id);
    totals
      .iter()
      .map(|(&county, &total)| {
        let tally = |groups: &HashMap<CountyId, Vec<&ParticipationRow>>| {
          let own = groups.get(&county).map(Vec::as_slice).unwrap_or_default();
          CoverageResult::tally(total, own.iter().copied())
        };
        let trend = trend_between(&tally(&current), &tally(&previous), &self.heuristics);
        (county, trend)
      })
      .collect()
  }
}
