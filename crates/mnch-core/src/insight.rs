//! Rule-based narrative for the drill-down dashboard.
//!
//! Rules at each level are evaluated independently; every rule that matches
//! contributes one [`Insight`], in declaration order. Rules never fail: empty
//! inputs simply match nothing.

use serde::{Deserialize, Serialize};

use crate::{
  coverage::{CoverageResult, FacilityTypeCoverage, StaffGroupCoverage},
  entity::TrainingType,
  metrics::{ActionEstimates, InsightThresholds},
};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
  Success,
  Warning,
  Alert,
  Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
  #[serde(rename = "type")]
  pub kind:    InsightKind,
  pub title:   String,
  pub message: String,
  pub action:  String,
}

impl Insight {
  fn new(
    kind: InsightKind,
    title: impl Into<String>,
    message: impl Into<String>,
    action: impl Into<String>,
  ) -> Self {
    Self {
      kind,
      title: title.into(),
      message: message.into(),
      action: action.into(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPriority {
  High,
  Medium,
  Low,
}

/// A sized intervention proposed for a county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
  pub priority:               ActionPriority,
  pub title:                  String,
  pub description:            String,
  /// The facility type or department the action addresses.
  pub target:                 String,
  pub estimated_participants: u64,
  pub timeline:               String,
}

fn plural(n: usize, one: &str, many: &str) -> String {
  if n == 1 { format!("{n} {one}") } else { format!("{n} {many}") }
}

// ─── National ────────────────────────────────────────────────────────────────

/// `county_coverage` holds one coverage percentage per county.
pub fn national_insights(
  county_coverage: &[f64],
  training_type: TrainingType,
  t: &InsightThresholds,
) -> Vec<Insight> {
  let mut out = Vec::new();
  let label = training_type.label();

  let zero = county_coverage.iter().filter(|c| **c <= 0.0).count();
  if zero > 0 {
    out.push(Insight::new(
      InsightKind::Alert,
      "Counties without coverage",
      format!(
        "{} no facility reached by {label}",
        plural(zero, "county has", "counties have")
      ),
      "Prioritise programme roll-out in uncovered counties",
    ));
  }

  let high = county_coverage
    .iter()
    .filter(|c| **c >= t.high_performer_coverage)
    .count();
  if high > 0 {
    out.push(Insight::new(
      InsightKind::Success,
      "High-performing counties",
      format!(
        "{} at or above {}% facility coverage",
        plural(high, "county is", "counties are"),
        t.high_performer_coverage
      ),
      "Document and share practices from leading counties",
    ));
  }

  if !county_coverage.is_empty() {
    let covered = county_coverage.len() - zero;
    let ratio = covered as f64 / county_coverage.len() as f64 * 100.0;
    if ratio < t.covered_county_ratio {
      out.push(Insight::new(
        InsightKind::Warning,
        "Limited national reach",
        format!(
          "Only {covered} of {} counties have any {label} coverage",
          county_coverage.len()
        ),
        "Expand programme reach to additional counties",
      ));
    }
  }

  out
}

// ─── County ──────────────────────────────────────────────────────────────────

pub fn county_insights(
  facility_types: &[FacilityTypeCoverage],
  departments: &[StaffGroupCoverage],
  t: &InsightThresholds,
) -> Vec<Insight> {
  let mut out = Vec::new();

  let uncovered: Vec<&str> = facility_types
    .iter()
    .filter(|ft| ft.total_facilities > 0 && ft.coverage_percentage <= 0.0)
    .map(|ft| ft.name.as_str())
    .collect();
  if !uncovered.is_empty() {
    out.push(Insight::new(
      InsightKind::Alert,
      "Facility types without coverage",
      format!("No training coverage in: {}", uncovered.join(", ")),
      "Schedule training for uncovered facility types",
    ));
  }

  let weak: Vec<&str> = departments
    .iter()
    .filter(|d| d.total_staff > 0 && d.coverage_percentage < t.department_warning)
    .map(|d| d.name.as_str())
    .collect();
  if !weak.is_empty() {
    out.push(Insight::new(
      InsightKind::Warning,
      "Departments with low coverage",
      format!(
        "Below {}% of staff trained in: {}",
        t.department_warning,
        weak.join(", ")
      ),
      "Target department-specific training",
    ));
  }

  let best = facility_types
    .iter()
    .filter(|ft| ft.total_facilities > 0)
    .max_by(|a, b| a.coverage_percentage.total_cmp(&b.coverage_percentage));
  if let Some(best) = best
    && best.coverage_percentage > t.best_type_success
  {
    out.push(Insight::new(
      InsightKind::Success,
      "Strong facility type coverage",
      format!(
        "{} facilities lead with {}% coverage",
        best.name, best.coverage_percentage
      ),
      "Use as a model for other facility types",
    ));
  }

  out
}

/// Sized actions for a county, highest priority first.
pub fn recommended_actions(
  facility_types: &[FacilityTypeCoverage],
  departments: &[StaffGroupCoverage],
  est: &ActionEstimates,
) -> Vec<RecommendedAction> {
  let mut out = Vec::new();

  let mut uncovered: Vec<&FacilityTypeCoverage> = facility_types
    .iter()
    .filter(|ft| ft.total_facilities > 0 && ft.coverage_percentage <= 0.0)
    .collect();
  uncovered.sort_by(|a, b| b.total_facilities.cmp(&a.total_facilities));
  for ft in uncovered.into_iter().take(est.max_uncovered_types) {
    out.push(RecommendedAction {
      priority:               ActionPriority::High,
      title:                  format!("Initiate training for {}", ft.name),
      description:            format!(
        "{} without trained staff",
        plural(ft.total_facilities as usize, "facility", "facilities")
      ),
      target:                 ft.name.clone(),
      estimated_participants: ft.total_facilities * est.uncovered_type_multiplier,
      timeline:               "3–6 months".to_owned(),
    });
  }

  let mut weak: Vec<&StaffGroupCoverage> = departments
    .iter()
    .filter(|d| d.total_staff > 0 && d.coverage_percentage < est.department_coverage)
    .collect();
  weak.sort_by(|a, b| b.untrained_staff.cmp(&a.untrained_staff));
  for d in weak.into_iter().take(est.max_departments) {
    out.push(RecommendedAction {
      priority:               ActionPriority::Medium,
      title:                  format!("Strengthen {} department training", d.name),
      description:            format!(
        "{} of {} staff are untrained",
        d.untrained_staff, d.total_staff
      ),
      target:                 d.name.clone(),
      estimated_participants: d.untrained_staff,
      timeline:               "6–12 months".to_owned(),
    });
  }

  let mut partial: Vec<&FacilityTypeCoverage> = facility_types
    .iter()
    .filter(|ft| {
      ft.coverage_percentage > 0.0
        && ft.coverage_percentage < est.partial_type_ceiling
    })
    .collect();
  partial.sort_by(|a, b| b.uncovered_facilities.cmp(&a.uncovered_facilities));
  for ft in partial.into_iter().take(est.max_partial_types) {
    out.push(RecommendedAction {
      priority:               ActionPriority::Low,
      title:                  format!("Extend coverage across {}", ft.name),
      description:            format!(
        "{} of {} facilities remain untrained",
        ft.uncovered_facilities, ft.total_facilities
      ),
      target:                 ft.name.clone(),
      estimated_participants: ft.uncovered_facilities * est.partial_type_multiplier,
      timeline:               "6–9 months".to_owned(),
    });
  }

  out
}

// ─── Facility type ───────────────────────────────────────────────────────────

/// `facility_scores` holds the coverage score of every facility of the type.
pub fn facility_type_insights(
  summary: &CoverageResult,
  facility_scores: &[u8],
  type_name: &str,
  t: &InsightThresholds,
) -> Vec<Insight> {
  let mut out = Vec::new();

  if summary.total_facilities > 0 && summary.covered_facilities == 0 {
    out.push(Insight::new(
      InsightKind::Alert,
      "No facilities covered",
      format!(
        "None of the {} {type_name} facilities has trained staff",
        summary.total_facilities
      ),
      "Plan an initial training cohort for this facility type",
    ));
  }

  let strong = facility_scores
    .iter()
    .filter(|s| **s >= t.facility_score_success)
    .count();
  if strong > 0 {
    out.push(Insight::new(
      InsightKind::Success,
      "High-scoring facilities",
      format!(
        "{} a coverage score of {} or more",
        plural(strong, "facility has", "facilities have"),
        t.facility_score_success
      ),
      "Engage these facilities as mentorship hubs",
    ));
  }

  let pct = summary.coverage_percentage;
  if pct > 0.0 && pct < t.partial_coverage {
    out.push(Insight::new(
      InsightKind::Warning,
      "Partial coverage",
      format!(
        "{} of {} facilities covered ({pct}%)",
        summary.covered_facilities, summary.total_facilities
      ),
      "Extend training to the remaining facilities",
    ));
  }

  out
}

// ─── Facility ────────────────────────────────────────────────────────────────

pub fn facility_insights(
  coverage: &CoverageResult,
  completion_rate: f64,
  score: u8,
  t: &InsightThresholds,
) -> Vec<Insight> {
  let mut out = Vec::new();

  if coverage.participant_count == 0 {
    out.push(Insight::new(
      InsightKind::Alert,
      "No trained staff",
      "No staff from this facility have participated in training",
      "Nominate staff for the next available cohort",
    ));
  } else if completion_rate < t.low_completion {
    out.push(Insight::new(
      InsightKind::Warning,
      "Low completion rate",
      format!("Only {completion_rate}% of participations were completed"),
      "Follow up with participants who have not completed",
    ));
  }

  if score >= t.facility_score_success {
    out.push(Insight::new(
      InsightKind::Success,
      "Strong training coverage",
      format!("Coverage score of {score}"),
      "Consider this facility as a mentorship site",
    ));
  }

  out
}
