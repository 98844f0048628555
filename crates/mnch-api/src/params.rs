//! Query-string parameters shared by the drill-down endpoints.
//!
//! `type` defaults to `global_training` and `year` to `all`; anything else
//! that fails to parse is a 400.

use mnch_core::{entity::TrainingType, scope::YearFilter};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct FilterParams {
  #[serde(rename = "type")]
  pub training_type: Option<String>,
  pub year:          Option<String>,
}

impl FilterParams {
  pub fn resolve(&self) -> Result<(TrainingType, YearFilter), ApiError> {
    let training_type = match self.training_type.as_deref().map(str::trim) {
      None | Some("") => TrainingType::default(),
      Some(t) => TrainingType::parse(t)?,
    };
    let year = match self.year.as_deref() {
      None => YearFilter::All,
      Some(y) => YearFilter::parse(y)?,
    };
    Ok((training_type, year))
  }
}

/// County ids from a raw query string. Accepts repeated `county_ids[]=`
/// pairs (raw or percent-encoded brackets) and comma-separated
/// `county_ids=` values.
pub fn county_ids(raw_query: Option<&str>) -> Result<Vec<i64>, ApiError> {
  let mut ids = Vec::new();
  for pair in raw_query.unwrap_or_default().split('&') {
    let Some((name, value)) = pair.split_once('=') else {
      continue;
    };
    let is_ids = matches!(
      name,
      "county_ids" | "county_ids[]" | "county_ids%5B%5D" | "county_ids%5b%5d"
    );
    if !is_ids {
      continue;
    }
    for part in value.split([',']).flat_map(|v| v.split("%2C")) {
      let part = part.trim();
      if part.is_empty() {
        continue;
      }
      let id = part
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid county id {part:?}")))?;
      ids.push(id);
    }
  }
  Ok(ids)
}
