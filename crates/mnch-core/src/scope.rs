//! Query scope and time-window filters.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entity::{CountyId, FacilityId, FacilityTypeId},
};

// ─── Year filter ─────────────────────────────────────────────────────────────

/// Restricts trainings by the calendar year of their `start_date`.
///
/// Serialised as `"all"` or the decimal year (e.g. `"2024"`), which is also
/// the form used in cache keys.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum YearFilter {
  #[default]
  All,
  Year(i32),
}

impl YearFilter {
  pub fn parse(s: &str) -> Result<Self> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("all") {
      return Ok(Self::All);
    }
    match s.parse::<i32>() {
      Ok(y) if s.len() == 4 && (1900..=9999).contains(&y) => Ok(Self::Year(y)),
      _ => Err(Error::InvalidYear(s.to_owned())),
    }
  }

  pub fn matches(self, date: NaiveDate) -> bool {
    match self {
      Self::All => true,
      Self::Year(y) => date.year() == y,
    }
  }

  /// The year a trend is measured at: the filtered year, or `today`'s year
  /// when no year is selected.
  pub fn anchor_year(self, today: NaiveDate) -> i32 {
    match self {
      Self::All => today.year(),
      Self::Year(y) => y,
    }
  }
}

impl fmt::Display for YearFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::All => f.write_str("all"),
      Self::Year(y) => write!(f, "{y}"),
    }
  }
}

impl TryFrom<String> for YearFilter {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<YearFilter> for String {
  fn from(value: YearFilter) -> Self { value.to_string() }
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The geographic or organisational unit a coverage query ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum Scope {
  National,
  County(CountyId),
  FacilityType {
    county_id:        CountyId,
    facility_type_id: FacilityTypeId,
  },
  Facility(FacilityId),
}

impl Scope {
  pub fn county_id(self) -> Option<CountyId> {
    match self {
      Self::County(id) | Self::FacilityType { county_id: id, .. } => Some(id),
      Self::National | Self::Facility(_) => None,
    }
  }

  pub fn facility_type_id(self) -> Option<FacilityTypeId> {
    match self {
      Self::FacilityType { facility_type_id, .. } => Some(facility_type_id),
      _ => None,
    }
  }

  pub fn facility_id(self) -> Option<FacilityId> {
    match self {
      Self::Facility(id) => Some(id),
      _ => None,
    }
  }
}
