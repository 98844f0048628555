//! Facility analysis: participants, training history, performance, and
//! staff breakdowns for a single facility.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use mnch_core::{
  coverage::{CoverageResult, StaffGroupCoverage, completion_rate, pass_rate, percentage},
  entity::{
    CompletionStatus, Facility, FacilityId, TrainingId, TrainingStatus, TrainingType,
    UserId,
  },
  insight::{Insight, facility_insights},
  metrics::facility_coverage_score,
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, ParticipationRow},
};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  breakdown::{StaffGrouping, staff_groups, trained_users},
  cache::{Cache, key},
  engine::{Engine, Metadata},
};

/// A staff member with at least one participation attributed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityParticipant {
  pub user_id:       UserId,
  pub name:          String,
  pub trainings:     u64,
  pub completed:     u64,
  pub last_training: NaiveDate,
  pub latest_status: CompletionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistoryEntry {
  pub training_id:  TrainingId,
  pub title:        String,
  pub status:       TrainingStatus,
  pub start_date:   NaiveDate,
  pub end_date:     Option<NaiveDate>,
  pub participants: u64,
  pub completed:    u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityPerformance {
  pub participant_count:         u64,
  pub program_count:             u64,
  pub completion_rate:           f64,
  pub pass_rate:                 f64,
  pub coverage_score:            u8,
  pub total_staff:               u64,
  pub trained_staff:             u64,
  pub staff_coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityAnalysis {
  pub facility:             Facility,
  pub participants:         Vec<FacilityParticipant>,
  /// Newest training first.
  pub training_history:     Vec<TrainingHistoryEntry>,
  pub performance:          FacilityPerformance,
  pub department_breakdown: Vec<StaffGroupCoverage>,
  pub cadre_breakdown:      Vec<StaffGroupCoverage>,
  pub insights:             Vec<Insight>,
  pub metadata:             Metadata,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn facility(
    &self,
    facility_id: FacilityId,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<FacilityAnalysis> {
    let ttl = self.ttls.facility;
    self
      .cached(key::facility(facility_id, training_type, year), ttl, async {
        self.compute_facility(facility_id, training_type, year, ttl).await
      })
      .await
  }

  async fn compute_facility(
    &self,
    facility_id: FacilityId,
    training_type: TrainingType,
    year: YearFilter,
    ttl: u64,
  ) -> Result<FacilityAnalysis> {
    let facility = self
      .store
      .get_facility(facility_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found("facility", facility_id))?;

    let scope = Scope::Facility(facility_id);
    let rows = self.participations(scope, training_type, year).await?;
    let staff = self.store.staff(scope).await.map_err(Error::store)?;

    let coverage = CoverageResult::tally(1, &rows);
    let completion = completion_rate(&rows);
    let score = facility_coverage_score(&coverage, completion, &self.heuristics.score);

    let trained = trained_users(&rows);
    let trained_staff = staff.iter().filter(|s| trained.contains(&s.id)).count() as u64;
    let total_staff = staff.len() as u64;

    Ok(FacilityAnalysis {
      participants: participants(&rows),
      training_history: training_history(&rows),
      performance: FacilityPerformance {
        participant_count: coverage.participant_count,
        program_count: coverage.program_count,
        completion_rate: completion,
        pass_rate: pass_rate(&rows),
        coverage_score: score,
        total_staff,
        trained_staff,
        staff_coverage_percentage: percentage(trained_staff, total_staff),
      },
      department_breakdown: staff_groups(&staff, &trained, StaffGrouping::Department),
      cadre_breakdown: staff_groups(&staff, &trained, StaffGrouping::Cadre),
      insights: facility_insights(&coverage, completion, score, &self.heuristics.insights),
      facility,
      metadata: Metadata::new("facility", training_type, year, ttl),
    })
  }
}

/// One line per staff member, ordered by name.
fn participants(rows: &[ParticipationRow]) -> Vec<FacilityParticipant> {
  let mut by_user: BTreeMap<UserId, FacilityParticipant> = BTreeMap::new();
  for row in rows {
    let entry = by_user.entry(row.user_id).or_insert_with(|| FacilityParticipant {
      user_id:       row.user_id,
      name:          row.user_name.clone(),
      trainings:     0,
      completed:     0,
      last_training: row.start_date,
      latest_status: row.completion_status,
    });
    entry.trainings += 1;
    if row.completion_status == CompletionStatus::Completed {
      entry.completed += 1;
    }
    if row.start_date > entry.last_training {
      entry.last_training = row.start_date;
      entry.latest_status = row.completion_status;
    }
  }

  let mut out: Vec<_> = by_user.into_values().collect();
  out.sort_by(|a, b| a.name.cmp(&b.name).then(a.user_id.cmp(&b.user_id)));
  out
}

fn training_history(rows: &[ParticipationRow]) -> Vec<TrainingHistoryEntry> {
  let mut by_training: BTreeMap<TrainingId, TrainingHistoryEntry> = BTreeMap::new();
  for row in rows {
    let entry = by_training
      .entry(row.training_id)
      .or_insert_with(|| TrainingHistoryEntry {
        training_id:  row.training_id,
        title:        row.training_title.clone(),
        status:       row.training_status,
        start_date:   row.start_date,
        end_date:     row.end_date,
        participants: 0,
        completed:    0,
      });
    entry.participants += 1;
    if row.completion_status == CompletionStatus::Completed {
      entry.completed += 1;
    }
  }

  let mut out: Vec<_> = by_training.into_values().collect();
  out.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.training_id.cmp(&b.training_id)));
  out
}
