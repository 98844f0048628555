//! Participant profile: one staff member's full training record.

use chrono::NaiveDate;
use mnch_core::{
  coverage::{completion_rate, pass_rate, percentage, round1},
  entity::{
    AssessmentResult, CompletionStatus, CountyId, FacilityId, Outcome, ParticipantId,
    StatusLog, TrainingId, TrainingStatus, TrainingType, UserId,
  },
  store::{AnalyticsStore, ParticipationQuery, ParticipationRow},
};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  cache::{Cache, key},
  engine::Engine,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
  pub id:            UserId,
  pub name:          String,
  pub phone:         Option<String>,
  pub facility_id:   FacilityId,
  pub facility_name: Option<String>,
  pub county_id:     Option<CountyId>,
  pub county_name:   Option<String>,
  pub department:    Option<String>,
  pub cadre:         Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantTraining {
  pub participant_id:    ParticipantId,
  pub training_id:       TrainingId,
  pub title:             String,
  pub training_type:     TrainingType,
  pub training_status:   TrainingStatus,
  pub start_date:        NaiveDate,
  pub end_date:          Option<NaiveDate>,
  /// Facility the participation counts towards.
  pub facility_id:       FacilityId,
  pub facility_name:     String,
  pub completion_status: CompletionStatus,
  pub registration_date: Option<NaiveDate>,
  pub completion_date:   Option<NaiveDate>,
  pub outcome:           Option<Outcome>,
}

impl From<&ParticipationRow> for ParticipantTraining {
  fn from(row: &ParticipationRow) -> Self {
    Self {
      participant_id:    row.participant_id,
      training_id:       row.training_id,
      title:             row.training_title.clone(),
      training_type:     row.training_type,
      training_status:   row.training_status,
      start_date:        row.start_date,
      end_date:          row.end_date,
      facility_id:       row.facility_id,
      facility_name:     row.facility_name.clone(),
      completion_status: row.completion_status,
      registration_date: row.registration_date,
      completion_date:   row.completion_date,
      outcome:           row.outcome,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSummary {
  pub total:         u64,
  pub passed:        u64,
  pub failed:        u64,
  pub average_score: f64,
  pub pass_rate:     f64,
}

impl AssessmentSummary {
  pub fn from_results(results: &[AssessmentResult]) -> Self {
    if results.is_empty() {
      return Self::default();
    }
    let total = results.len() as u64;
    let passed = results.iter().filter(|r| r.outcome == Outcome::Pass).count() as u64;
    let mean = results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;
    Self {
      total,
      passed,
      failed: total - passed,
      average_score: if mean.is_finite() { round1(mean) } else { 0.0 },
      pass_rate: percentage(passed, total),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
  pub total_trainings: u64,
  pub completed:       u64,
  pub dropped:         u64,
  pub in_progress:     u64,
  pub completion_rate: f64,
  pub pass_rate:       f64,
}

impl PerformanceMetrics {
  pub fn from_rows(rows: &[ParticipationRow]) -> Self {
    let count = |status: CompletionStatus| {
      rows.iter().filter(|r| r.completion_status == status).count() as u64
    };
    let completed = count(CompletionStatus::Completed);
    let dropped = count(CompletionStatus::Dropped);
    let total = rows.len() as u64;
    Self {
      total_trainings: total,
      completed,
      dropped,
      in_progress: total - completed - dropped,
      completion_rate: completion_rate(rows),
      pass_rate: pass_rate(rows),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProfile {
  pub participant:         ParticipantInfo,
  /// Both training types, newest first.
  pub training_history:    Vec<ParticipantTraining>,
  pub status_logs:         Vec<StatusLog>,
  pub assessment_summary:  AssessmentSummary,
  pub performance_metrics: PerformanceMetrics,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn participant(&self, user_id: UserId) -> Result<ParticipantProfile> {
    let ttl = self.ttls.participant;
    self
      .cached(key::participant(user_id), ttl, self.compute_participant(user_id))
      .await
  }

  async fn compute_participant(&self, user_id: UserId) -> Result<ParticipantProfile> {
    let staff = self
      .store
      .get_staff(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found("participant", user_id))?;
    let facility = self
      .store
      .get_facility(staff.facility_id)
      .await
      .map_err(Error::store)?;

    let rows = self
      .store
      .participations(&ParticipationQuery::for_user(user_id))
      .await
      .map_err(Error::store)?;
    let status_logs = self.store.status_logs(user_id).await.map_err(Error::store)?;
    let assessments = self.store.assessments(user_id).await.map_err(Error::store)?;

    Ok(ParticipantProfile {
      participant: ParticipantInfo {
        id:            staff.id,
        name:          staff.full_name(),
        phone:         staff.phone,
        facility_id:   staff.facility_id,
        facility_name: facility.as_ref().map(|f| f.name.clone()),
        county_id:     facility.as_ref().map(|f| f.county_id),
        county_name:   facility.map(|f| f.county_name),
        department:    staff.department_name,
        cadre:         staff.cadre_name,
      },
      training_history: rows.iter().map(ParticipantTraining::from).collect(),
      status_logs,
      assessment_summary: AssessmentSummary::from_results(&assessments),
      performance_metrics: PerformanceMetrics::from_rows(&rows),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn result(score: f64, outcome: Outcome) -> AssessmentResult {
    AssessmentResult {
      id: 1,
      participant_id: 1,
      training_id: 1,
      category: "Post-test".into(),
      score,
      outcome,
      assessed_at: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    }
  }

  #[test]
  fn assessment_summary_of_nothing_is_zero() {
    assert_eq!(AssessmentSummary::from_results(&[]), AssessmentSummary::default());
  }

  #[test]
  fn assessment_summary_averages_scores() {
    let s = AssessmentSummary::from_results(&[
      result(80.0, Outcome::Pass),
      result(45.0, Outcome::Fail),
      result(92.5, Outcome::Pass),
    ]);
    assert_eq!(s.total, 3);
    assert_eq!(s.passed, 2);
    assert_eq!(s.failed, 1);
    assert_eq!(s.average_score, 72.5);
    assert_eq!(s.pass_rate, 66.7);
  }
}
