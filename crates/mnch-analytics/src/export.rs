//! Tabular views of the national and county aggregates, ready for a CSV or
//! PDF writer. Built from the cached level payloads.

use mnch_core::{
  entity::{CountyId, TrainingType},
  scope::YearFilter,
  store::AnalyticsStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  Result,
  cache::Cache,
  engine::{Engine, Metadata},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTable {
  pub title:    String,
  pub columns:  Vec<String>,
  pub rows:     Vec<Vec<Value>>,
  pub metadata: Metadata,
}

fn columns(names: &[&str]) -> Vec<String> { names.iter().map(|&n| n.to_owned()).collect() }

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub async fn export_national(
    &self,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<ExportTable> {
    let overview = self.national(training_type, year).await?;
    let rows = overview
      .counties
      .iter()
      .map(|c| {
        vec![
          json!(c.name),
          json!(c.total_facilities),
          json!(c.covered_facilities),
          json!(c.coverage_percentage),
          json!(c.participant_count),
          json!(c.program_count),
          json!(c.intensity.as_ref()),
          json!(c.trend.as_ref()),
          json!(c.priority.as_ref()),
        ]
      })
      .collect();

    Ok(ExportTable {
      title: format!("National {} coverage ({year})", training_type.label()),
      columns: columns(&[
        "County",
        "Total Facilities",
        "Covered Facilities",
        "Coverage %",
        "Participants",
        "Programs",
        "Intensity",
        "Trend",
        "Priority",
      ]),
      rows,
      metadata: overview.metadata,
    })
  }

  pub async fn export_county(
    &self,
    county_id: CountyId,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<ExportTable> {
    let analysis = self.county(county_id, training_type, year).await?;
    let rows = analysis
      .facilities
      .iter()
      .map(|f| {
        vec![
          json!(f.name),
          json!(f.mfl_code),
          json!(f.facility_type),
          json!(f.subcounty),
          json!(f.participant_count),
          json!(f.program_count),
          json!(f.completion_rate),
          json!(f.coverage_score),
          json!(if f.is_covered { "Yes" } else { "No" }),
        ]
      })
      .collect();

    Ok(ExportTable {
      title: format!(
        "{} County {} coverage ({year})",
        analysis.county.name,
        training_type.label()
      ),
      columns: columns(&[
        "Facility",
        "MFL Code",
        "Facility Type",
        "Subcounty",
        "Participants",
        "Programs",
        "Completion Rate %",
        "Coverage Score",
        "Covered",
      ]),
      rows,
      metadata: analysis.metadata,
    })
  }
}
