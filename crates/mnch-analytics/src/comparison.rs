//! Side-by-side coverage for up to five counties with a benchmark.

use mnch_core::{
  coverage::round1,
  entity::{CountyId, TrainingType},
  metrics::{Intensity, Priority, Trend},
  scope::{Scope, YearFilter},
  store::AnalyticsStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  cache::Cache,
  engine::{Engine, Metadata},
};

/// Upper bound on counties in one comparison.
pub const MAX_COMPARED_COUNTIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
  pub county_id:           CountyId,
  pub county_name:         String,
  pub total_facilities:    u64,
  pub covered_facilities:  u64,
  pub participant_count:   u64,
  pub program_count:       u64,
  pub coverage_percentage: f64,
  pub intensity:           Intensity,
  pub intensity_score:     f64,
  pub trend:               Trend,
  pub priority:            Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
  pub county_id:           CountyId,
  pub county_name:         String,
  pub coverage_percentage: f64,
}

impl From<&ComparisonEntry> for Performer {
  fn from(e: &ComparisonEntry) -> Self {
    Self {
      county_id:           e.county_id,
      county_name:         e.county_name.clone(),
      coverage_percentage: e.coverage_percentage,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
  pub best_performer:          Option<Performer>,
  pub worst_performer:         Option<Performer>,
  pub average_coverage:        f64,
  pub average_intensity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyComparison {
  pub comparison: Vec<ComparisonEntry>,
  pub benchmark:  Benchmark,
  pub metadata:   Metadata,
}

/// Reject empty or oversized id lists, then drop duplicates keeping order.
///
/// The size limit applies to the ids as given, repeats included.
pub fn validate_county_ids(ids: &[CountyId]) -> Result<Vec<CountyId>> {
  if ids.is_empty() {
    return Err(Error::Validation("at least one county id is required".to_owned()));
  }
  if ids.len() > MAX_COMPARED_COUNTIES {
    return Err(Error::Validation(format!(
      "at most {MAX_COMPARED_COUNTIES} counties can be compared, got {}",
      ids.len()
    )));
  }
  let mut unique: Vec<CountyId> = Vec::with_capacity(ids.len());
  for &id in ids {
    if !unique.contains(&id) {
      unique.push(id);
    }
  }
  Ok(unique)
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  /// Validation happens before any store access.
  pub async fn compare_counties(
    &self,
    county_ids: &[CountyId],
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<CountyComparison> {
    let ids = validate_county_ids(county_ids)?;

    let mut comparison = Vec::with_capacity(ids.len());
    for id in ids {
      let county = self.require_county(id).await?;
      let scope = Scope::County(id);
      let raw = self.compute_coverage(scope, training_type, year).await?;
      let derived = self.derive(scope, raw, training_type, year).await;
      comparison.push(ComparisonEntry {
        county_id:           county.id,
        county_name:         county.name,
        total_facilities:    raw.total_facilities,
        covered_facilities:  raw.covered_facilities,
        participant_count:   raw.participant_count,
        program_count:       raw.program_count,
        coverage_percentage: raw.coverage_percentage,
        intensity:           derived.intensity,
        intensity_score:     derived.intensity_score,
        trend:               derived.trend,
        priority:            derived.priority,
      });
    }

    Ok(CountyComparison {
      benchmark: benchmark(&comparison),
      comparison,
      metadata: Metadata::new("comparison", training_type, year, 0),
    })
  }
}

fn benchmark(entries: &[ComparisonEntry]) -> Benchmark {
  let by_coverage = |a: &&ComparisonEntry, b: &&ComparisonEntry| {
    a.coverage_percentage.total_cmp(&b.coverage_percentage)
  };
  let mean = |f: fn(&ComparisonEntry) -> f64| {
    if entries.is_empty() {
      0.0
    } else {
      round1(entries.iter().map(f).sum::<f64>() / entries.len() as f64)
    }
  };

  Benchmark {
    // Ties go to the county listed first.
    best_performer:          entries
      .iter()
      .rev()
      .max_by(by_coverage)
      .map(Performer::from),
    worst_performer:         entries.iter().min_by(by_coverage).map(Performer::from),
    average_coverage:        mean(|e| e.coverage_percentage),
    average_intensity_score: mean(|e| e.intensity_score),
  }
}
