//! Headline counts for the dashboard landing page.

use std::collections::HashSet;

use mnch_core::{
  coverage::{CoverageResult, completion_rate, pass_rate},
  entity::{CompletionStatus, TrainingType},
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, FacilityQuery},
};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  cache::{Cache, key},
  engine::{Engine, Metadata},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub total_trainings:        u64,
  pub ongoing_trainings:      u64,
  pub completed_trainings:    u64,
  pub total_participants:     u64,
  pub unique_participants:    u64,
  pub completed_participants: u64,
  pub completion_rate:        f64,
  pub pass_rate:              f64,
  pub total_facilities:       u64,
  pub covered_facilities:     u64,
  pub coverage_percentage:    f64,
  pub counties_with_coverage: u64,
  pub metadata:               Metadata,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn dashboard_stats(
    &self,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<DashboardStats> {
    let ttl = self.ttls.dashboard_stats;
    self
      .cached(key::stats(training_type, year), ttl, async {
        let trainings = self
          .store
          .training_counts(training_type, year)
          .await
          .map_err(Error::store)?;
        let total = self
          .store
          .count_facilities(&FacilityQuery::default())
          .await
          .map_err(Error::store)?;
        let rows = self.participations(Scope::National, training_type, year).await?;
        let coverage = CoverageResult::tally(total, &rows);

        Ok(DashboardStats {
          total_trainings:        trainings.total,
          ongoing_trainings:      trainings.ongoing,
          completed_trainings:    trainings.completed,
          total_participants:     rows.len() as u64,
          unique_participants:    rows.iter().map(|r| r.user_id).collect::<HashSet<_>>().len()
            as u64,
          completed_participants: rows
            .iter()
            .filter(|r| r.completion_status == CompletionStatus::Completed)
            .count() as u64,
          completion_rate:        completion_rate(&rows),
          pass_rate:              pass_rate(&rows),
          total_facilities:       coverage.total_facilities,
          covered_facilities:     coverage.covered_facilities,
          coverage_percentage:    coverage.coverage_percentage,
          counties_with_coverage: rows.iter().map(|r| r.county_id).collect::<HashSet<_>>().len()
            as u64,
          metadata:               Metadata::new("dashboard_stats", training_type, year, ttl),
        })
      })
      .await
  }
}
