//! Derived metrics: intensity, trend, priority, and facility coverage score.
//!
//! Every threshold lives in [`Heuristics`]. The defaults reproduce the
//! dashboard's historic behaviour; none of them has a documented derivation,
//! so they are configuration rather than constants.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::coverage::CoverageResult;

// ─── Heuristics ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
  pub intensity: IntensityBands,
  pub trend:     TrendRules,
  pub priority:  PriorityRules,
  pub score:     ScoreWeights,
  pub insights:  InsightThresholds,
  pub actions:   ActionEstimates,
}

/// `score = participant_weight × participants/facility +
/// program_weight × programs/facility`, banded at `low`, `medium`, `high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityBands {
  pub participant_weight: f64,
  pub program_weight:     f64,
  pub low:                f64,
  pub medium:             f64,
  pub high:               f64,
}

impl Default for IntensityBands {
  fn default() -> Self {
    Self {
      participant_weight: 0.7,
      program_weight:     0.3,
      low:                1.0,
      medium:             5.0,
      high:               10.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendRules {
  /// Percentage-point change beyond which a trend is no longer "stable".
  pub significant_delta: f64,
}

impl Default for TrendRules {
  fn default() -> Self { Self { significant_delta: 10.0 } }
}

/// High: `facilities ≥ critical_facilities && coverage < critical_coverage`,
/// or `facilities > large_facilities && coverage < large_coverage`.
/// Medium: `facilities ≥ medium_facilities && coverage < medium_coverage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityRules {
  pub critical_facilities: u64,
  pub critical_coverage:   f64,
  pub large_facilities:    u64,
  pub large_coverage:      f64,
  pub medium_facilities:   u64,
  pub medium_coverage:     f64,
}

impl Default for PriorityRules {
  fn default() -> Self {
    Self {
      critical_facilities: 20,
      critical_coverage:   30.0,
      large_facilities:    10,
      large_coverage:      50.0,
      medium_facilities:   5,
      medium_coverage:     70.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
  /// Participation count at which the participant component saturates.
  pub participant_cap:    u64,
  /// Program count at which the program component saturates.
  pub program_cap:        u64,
  pub participant_weight: f64,
  pub program_weight:     f64,
  pub completion_weight:  f64,
}

impl Default for ScoreWeights {
  fn default() -> Self {
    Self {
      participant_cap:    10,
      program_cap:        3,
      participant_weight: 40.0,
      program_weight:     30.0,
      completion_weight:  30.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
  /// County coverage at or above which a county is a high performer.
  pub high_performer_coverage: f64,
  /// Share of counties with any coverage below which a warning fires.
  pub covered_county_ratio:    f64,
  pub department_warning:      f64,
  pub best_type_success:       f64,
  pub facility_score_success:  u8,
  pub facility_score_low:      u8,
  pub partial_coverage:        f64,
  pub low_completion:          f64,
}

impl Default for InsightThresholds {
  fn default() -> Self {
    Self {
      high_performer_coverage: 80.0,
      covered_county_ratio:    60.0,
      department_warning:      30.0,
      best_type_success:       70.0,
      facility_score_success:  80,
      facility_score_low:      40,
      partial_coverage:        50.0,
      low_completion:          50.0,
    }
  }
}

/// Sizing rules for county-level recommended actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionEstimates {
  /// Participants per facility when a facility type has no coverage.
  pub uncovered_type_multiplier: u64,
  /// Participants per uncovered facility of a partially covered type.
  pub partial_type_multiplier:   u64,
  pub department_coverage:       f64,
  pub partial_type_ceiling:      f64,
  pub max_uncovered_types:       usize,
  pub max_departments:           usize,
  pub max_partial_types:         usize,
}

impl Default for ActionEstimates {
  fn default() -> Self {
    Self {
      uncovered_type_multiplier: 5,
      partial_type_multiplier:   3,
      department_coverage:       50.0,
      partial_type_ceiling:      80.0,
      max_uncovered_types:       3,
      max_departments:           2,
      max_partial_types:         2,
    }
  }
}

// ─── Intensity ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
  Display, AsRefStr,
)]
pub enum Intensity {
  Minimal,
  Low,
  Medium,
  High,
}

/// Weighted training density per facility; zero when the scope is empty.
pub fn intensity_score(coverage: &CoverageResult, bands: &IntensityBands) -> f64 {
  if coverage.total_facilities == 0 {
    return 0.0;
  }
  let facilities = coverage.total_facilities as f64;
  bands.participant_weight * (coverage.participant_count as f64 / facilities)
    + bands.program_weight * (coverage.program_count as f64 / facilities)
}

pub fn classify_intensity(
  coverage: &CoverageResult,
  bands: &IntensityBands,
) -> Intensity {
  let score = intensity_score(coverage, bands);
  if score >= bands.high {
    Intensity::High
  } else if score >= bands.medium {
    Intensity::Medium
  } else if score >= bands.low {
    Intensity::Low
  } else {
    Intensity::Minimal
  }
}

// ─── Trend ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum Trend {
  Improving,
  Declining,
  #[serde(rename = "Stable Growth")]
  #[strum(serialize = "Stable Growth")]
  StableGrowth,
  #[serde(rename = "Stable Decline")]
  #[strum(serialize = "Stable Decline")]
  StableDecline,
  Stable,
  Unknown,
}

/// Compare coverage percentages of consecutive years.
pub fn classify_trend(current: f64, previous: f64, rules: &TrendRules) -> Trend {
  let delta = current - previous;
  if !delta.is_finite() {
    Trend::Unknown
  } else if delta > rules.significant_delta {
    Trend::Improving
  } else if delta < -rules.significant_delta {
    Trend::Declining
  } else if delta > 0.0 {
    Trend::StableGrowth
  } else if delta < 0.0 {
    Trend::StableDecline
  } else {
    Trend::Stable
  }
}

// ─── Priority ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
  Display, AsRefStr,
)]
pub enum Priority {
  Low,
  Medium,
  High,
}

/// Rank a scope for intervention. Larger under-served populations outrank
/// smaller ones at the same coverage.
pub fn classify_priority(
  total_facilities: u64,
  coverage_percentage: f64,
  rules: &PriorityRules,
) -> Priority {
  let critical = total_facilities >= rules.critical_facilities
    && coverage_percentage < rules.critical_coverage;
  let large = total_facilities > rules.large_facilities
    && coverage_percentage < rules.large_coverage;
  if critical || large {
    Priority::High
  } else if total_facilities >= rules.medium_facilities
    && coverage_percentage < rules.medium_coverage
  {
    Priority::Medium
  } else {
    Priority::Low
  }
}

// ─── Facility coverage score ─────────────────────────────────────────────────

/// Blend of participation volume, programme breadth, and completion rate,
/// as an integer in `0..=100`.
pub fn facility_coverage_score(
  coverage: &CoverageResult,
  completion_rate: f64,
  weights: &ScoreWeights,
) -> u8 {
  let component = |count: u64, cap: u64| -> f64 {
    if cap == 0 {
      return 100.0;
    }
    (count as f64 / cap as f64).min(1.0) * 100.0
  };
  let participants = component(coverage.participant_count, weights.participant_cap);
  let programs = component(coverage.program_count, weights.program_cap);
  let completion = if completion_rate.is_finite() {
    completion_rate.clamp(0.0, 100.0)
  } else {
    0.0
  };

  let total = weights.participant_weight
    + weights.program_weight
    + weights.completion_weight;
  if total <= 0.0 {
    return 0;
  }
  let weighted = participants * weights.participant_weight
    + programs * weights.program_weight
    + completion * weights.completion_weight;
  (weighted / total).round().clamp(0.0, 100.0) as u8
}
