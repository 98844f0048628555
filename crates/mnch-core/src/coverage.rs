//! Raw coverage figures and the breakdown rows derived from them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
  entity::{CompletionStatus, FacilityTypeId, Outcome},
  store::ParticipationRow,
};

/// Round to one decimal place. Every percentage leaves the engine this way.
pub fn round1(value: f64) -> f64 { (value * 10.0).round() / 10.0 }

/// `part / whole × 100`, rounded to one decimal and clamped to `[0, 100]`.
/// A zero `whole` yields `0.0`.
pub fn percentage(part: u64, whole: u64) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  round1((part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0))
}

// ─── CoverageResult ──────────────────────────────────────────────────────────

/// Coverage of one scope for one training type and year window. Never
/// persisted; computed per query and cached transiently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
  pub coverage_percentage: f64,
  /// Number of participation records (not distinct people).
  pub participant_count:   u64,
  pub covered_facilities:  u64,
  pub total_facilities:    u64,
  /// Distinct trainings with at least one participation in scope.
  pub program_count:       u64,
}

impl CoverageResult {
  /// Tally `rows` against a scope holding `total_facilities` facilities.
  ///
  /// The caller guarantees every row is attributed to a facility inside the
  /// scope; covered facilities are the distinct attributed facility ids.
  pub fn tally<'a, I>(total_facilities: u64, rows: I) -> Self
  where
    I: IntoIterator<Item = &'a ParticipationRow>,
  {
    if total_facilities == 0 {
      return Self::default();
    }

    let mut facilities = HashSet::new();
    let mut programs = HashSet::new();
    let mut participants = 0u64;
    for row in rows {
      facilities.insert(row.facility_id);
      programs.insert(row.training_id);
      participants += 1;
    }

    let covered = (facilities.len() as u64).min(total_facilities);
    Self {
      coverage_percentage: percentage(covered, total_facilities),
      participant_count:   participants,
      covered_facilities:  covered,
      total_facilities,
      program_count:       programs.len() as u64,
    }
  }

  pub fn uncovered_facilities(&self) -> u64 {
    self.total_facilities.saturating_sub(self.covered_facilities)
  }

  pub fn is_covered(&self) -> bool { self.covered_facilities > 0 }
}

/// Completed participations over all participations, as a percentage.
pub fn completion_rate<'a, I>(rows: I) -> f64
where
  I: IntoIterator<Item = &'a ParticipationRow>,
{
  let (mut done, mut total) = (0u64, 0u64);
  for row in rows {
    total += 1;
    if row.completion_status == CompletionStatus::Completed {
      done += 1;
    }
  }
  percentage(done, total)
}

/// Passed outcomes over participations that have an outcome recorded.
pub fn pass_rate<'a, I>(rows: I) -> f64
where
  I: IntoIterator<Item = &'a ParticipationRow>,
{
  let (mut passed, mut assessed) = (0u64, 0u64);
  for outcome in rows.into_iter().filter_map(|r| r.outcome) {
    assessed += 1;
    if outcome == Outcome::Pass {
      passed += 1;
    }
  }
  percentage(passed, assessed)
}

// ─── Breakdown rows ──────────────────────────────────────────────────────────

/// Coverage of one facility type inside a county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityTypeCoverage {
  pub id:                   FacilityTypeId,
  pub name:                 String,
  pub total_facilities:     u64,
  pub covered_facilities:   u64,
  pub uncovered_facilities: u64,
  pub participant_count:    u64,
  pub program_count:        u64,
  pub coverage_percentage:  f64,
}

impl FacilityTypeCoverage {
  pub fn new(id: FacilityTypeId, name: String, coverage: &CoverageResult) -> Self {
    Self {
      id,
      name,
      total_facilities: coverage.total_facilities,
      covered_facilities: coverage.covered_facilities,
      uncovered_facilities: coverage.uncovered_facilities(),
      participant_count: coverage.participant_count,
      program_count: coverage.program_count,
      coverage_percentage: coverage.coverage_percentage,
    }
  }
}

/// Share of a staff group (department or cadre) with at least one
/// participation in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffGroupCoverage {
  /// `None` collects staff with no department / cadre on record.
  pub id:                  Option<i64>,
  pub name:                String,
  pub total_staff:         u64,
  pub trained_staff:       u64,
  pub untrained_staff:     u64,
  pub coverage_percentage: f64,
}

impl StaffGroupCoverage {
  pub fn new(id: Option<i64>, name: String, total: u64, trained: u64) -> Self {
    let trained = trained.min(total);
    Self {
      id,
      name,
      total_staff: total,
      trained_staff: trained,
      untrained_staff: total - trained,
      coverage_percentage: percentage(trained, total),
    }
  }
}
