//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as ISO 8601 (`YYYY-MM-DD`), timestamps as RFC 3339
//! strings, enums as their snake_case discriminants.

use chrono::{DateTime, NaiveDate, Utc};
use mnch_core::{
  entity::{
    AssessmentResult, CompletionStatus, Facility, FacilityAttribution, Outcome,
    Staff, StatusLog, TrainingStatus, TrainingType,
  },
  scope::YearFilter,
  store::ParticipationRow,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  // Tolerate a trailing time component written by the admin application.
  let day = s.get(..10).unwrap_or(s);
  NaiveDate::parse_from_str(day, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// `strftime('%Y', …)` comparison value for a year filter.
pub fn encode_year(year: YearFilter) -> Option<String> {
  match year {
    YearFilter::All => None,
    YearFilter::Year(y) => Some(format!("{y:04}")),
  }
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Count(n))
}

// ─── Facility attribution ────────────────────────────────────────────────────

fn attribution_column(a: FacilityAttribution) -> &'static str {
  match a {
    FacilityAttribution::ParticipantHome => "u.facility_id",
    FacilityAttribution::TrainingVenue => "t.facility_id",
  }
}

/// SQL expression yielding the facility a participation row counts towards,
/// given `u` (users) and `t` (trainings) in scope.
///
/// With a type filter the join column is fixed; without one each row is
/// attributed through its own training's type.
pub fn attributed_facility_sql(training_type: Option<TrainingType>) -> String {
  match training_type {
    Some(t) => attribution_column(t.attribution()).to_owned(),
    None => {
      let arms: String = TrainingType::ALL
        .iter()
        .map(|t| {
          format!(
            " WHEN '{}' THEN {}",
            t.as_ref(),
            attribution_column(t.attribution())
          )
        })
        .collect();
      format!("CASE t.type{arms} END")
    }
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub struct RawFacility {
  pub id:                 i64,
  pub name:               String,
  pub mfl_code:           Option<String>,
  pub subcounty_id:       i64,
  pub subcounty_name:     String,
  pub county_id:          i64,
  pub county_name:        String,
  pub facility_type_id:   i64,
  pub facility_type_name: String,
  pub latitude:           Option<f64>,
  pub longitude:          Option<f64>,
}

impl RawFacility {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      name:               row.get(1)?,
      mfl_code:           row.get(2)?,
      subcounty_id:       row.get(3)?,
      subcounty_name:     row.get(4)?,
      county_id:          row.get(5)?,
      county_name:        row.get(6)?,
      facility_type_id:   row.get(7)?,
      facility_type_name: row.get(8)?,
      latitude:           row.get(9)?,
      longitude:          row.get(10)?,
    })
  }

  pub fn into_facility(self) -> Facility {
    Facility {
      id:                 self.id,
      name:               self.name,
      mfl_code:           self.mfl_code,
      subcounty_id:       self.subcounty_id,
      subcounty_name:     self.subcounty_name,
      county_id:          self.county_id,
      county_name:        self.county_name,
      facility_type_id:   self.facility_type_id,
      facility_type_name: self.facility_type_name,
      latitude:           self.latitude,
      longitude:          self.longitude,
    }
  }
}

pub struct RawStaff {
  pub id:              i64,
  pub first_name:      String,
  pub last_name:       String,
  pub phone:           Option<String>,
  pub facility_id:     i64,
  pub department_id:   Option<i64>,
  pub department_name: Option<String>,
  pub cadre_id:        Option<i64>,
  pub cadre_name:      Option<String>,
}

impl RawStaff {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      first_name:      row.get(1)?,
      last_name:       row.get(2)?,
      phone:           row.get(3)?,
      facility_id:     row.get(4)?,
      department_id:   row.get(5)?,
      department_name: row.get(6)?,
      cadre_id:        row.get(7)?,
      cadre_name:      row.get(8)?,
    })
  }

  pub fn into_staff(self) -> Staff {
    Staff {
      id:              self.id,
      first_name:      self.first_name,
      last_name:       self.last_name,
      phone:           self.phone,
      facility_id:     self.facility_id,
      department_id:   self.department_id,
      department_name: self.department_name,
      cadre_id:        self.cadre_id,
      cadre_name:      self.cadre_name,
    }
  }
}

pub struct RawParticipation {
  pub participant_id:    i64,
  pub user_id:           i64,
  pub user_name:         String,
  pub department_id:     Option<i64>,
  pub cadre_id:          Option<i64>,
  pub training_id:       i64,
  pub training_title:    String,
  pub training_type:     String,
  pub training_status:   String,
  pub start_date:        String,
  pub end_date:          Option<String>,
  pub facility_id:       i64,
  pub facility_name:     String,
  pub facility_type_id:  i64,
  pub county_id:         i64,
  pub completion_status: String,
  pub registration_date: Option<String>,
  pub completion_date:   Option<String>,
  pub outcome:           Option<String>,
}

impl RawParticipation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      participant_id:    row.get(0)?,
      user_id:           row.get(1)?,
      user_name:         row.get(2)?,
      department_id:     row.get(3)?,
      cadre_id:          row.get(4)?,
      training_id:       row.get(5)?,
      training_title:    row.get(6)?,
      training_type:     row.get(7)?,
      training_status:   row.get(8)?,
      start_date:        row.get(9)?,
      end_date:          row.get(10)?,
      facility_id:       row.get(11)?,
      facility_name:     row.get(12)?,
      facility_type_id:  row.get(13)?,
      county_id:         row.get(14)?,
      completion_status: row.get(15)?,
      registration_date: row.get(16)?,
      completion_date:   row.get(17)?,
      outcome:           row.get(18)?,
    })
  }

  pub fn into_row(self) -> Result<ParticipationRow> {
    Ok(ParticipationRow {
      participant_id:    self.participant_id,
      user_id:           self.user_id,
      user_name:         self.user_name,
      department_id:     self.department_id,
      cadre_id:          self.cadre_id,
      training_id:       self.training_id,
      training_title:    self.training_title,
      training_type:     TrainingType::parse(&self.training_type)?,
      training_status:   TrainingStatus::parse(&self.training_status)?,
      start_date:        decode_date(&self.start_date)?,
      end_date:          decode_opt_date(self.end_date)?,
      facility_id:       self.facility_id,
      facility_name:     self.facility_name,
      facility_type_id:  self.facility_type_id,
      county_id:         self.county_id,
      completion_status: CompletionStatus::parse(&self.completion_status)?,
      registration_date: decode_opt_date(self.registration_date)?,
      completion_date:   decode_opt_date(self.completion_date)?,
      outcome:           self.outcome.as_deref().map(Outcome::parse).transpose()?,
    })
  }
}

pub struct RawStatusLog {
  pub id:             i64,
  pub participant_id: i64,
  pub training_id:    i64,
  pub status:         String,
  pub notes:          Option<String>,
  pub changed_at:     String,
}

impl RawStatusLog {
  pub fn into_log(self) -> Result<StatusLog> {
    Ok(StatusLog {
      id:             self.id,
      participant_id: self.participant_id,
      training_id:    self.training_id,
      status:         CompletionStatus::parse(&self.status)?,
      notes:          self.notes,
      changed_at:     decode_dt(&self.changed_at)?,
    })
  }
}

pub struct RawAssessment {
  pub id:             i64,
  pub participant_id: i64,
  pub training_id:    i64,
  pub category:       String,
  pub score:          f64,
  pub outcome:        String,
  pub assessed_at:    String,
}

impl RawAssessment {
  pub fn into_assessment(self) -> Result<AssessmentResult> {
    Ok(AssessmentResult {
      id:             self.id,
      participant_id: self.participant_id,
      training_id:    self.training_id,
      category:       self.category,
      score:          self.score,
      outcome:        Outcome::parse(&self.outcome)?,
      assessed_at:    decode_date(&self.assessed_at)?,
    })
  }
}
