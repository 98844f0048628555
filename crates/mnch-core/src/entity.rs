//! Entity types owned by the surrounding administrative application.
//!
//! The analytics engine only reads these. Identifiers are the integer primary
//! keys of the relational store.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

pub type CountyId = i64;
pub type SubcountyId = i64;
pub type FacilityId = i64;
pub type FacilityTypeId = i64;
pub type DepartmentId = i64;
pub type CadreId = i64;
pub type UserId = i64;
pub type TrainingId = i64;
pub type ParticipantId = i64;

// ─── Training delivery model ─────────────────────────────────────────────────

/// Where a participation is attributed when counting facility coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilityAttribution {
  /// The participant's own (home) facility.
  ParticipantHome,
  /// The facility that hosted the training.
  TrainingVenue,
}

/// The two training delivery models. The variant decides how a participant is
/// linked to a facility, so it is resolved once per request and handed down
/// to the store as a [`FacilityAttribution`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrainingType {
  /// Centrally organised programme; staff travel from their home facility.
  #[default]
  GlobalTraining,
  /// On-site mentorship hosted by a specific facility.
  FacilityMentorship,
}

impl TrainingType {
  pub const ALL: [TrainingType; 2] =
    [TrainingType::GlobalTraining, TrainingType::FacilityMentorship];

  pub fn attribution(self) -> FacilityAttribution {
    match self {
      Self::GlobalTraining => FacilityAttribution::ParticipantHome,
      Self::FacilityMentorship => FacilityAttribution::TrainingVenue,
    }
  }

  /// Human-readable label used in insight messages.
  pub fn label(self) -> &'static str {
    match self {
      Self::GlobalTraining => "global training",
      Self::FacilityMentorship => "facility mentorship",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownTrainingType(s.to_owned()))
  }
}

// ─── Status enums ────────────────────────────────────────────────────────────

/// Progress of one staff member through one training.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompletionStatus {
  Registered,
  Attending,
  Completed,
  Dropped,
}

impl CompletionStatus {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownCompletionStatus(s.to_owned()))
  }
}

/// Assessment outcome recorded against a participation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
  Pass,
  Fail,
}

impl Outcome {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownOutcome(s.to_owned()))
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrainingStatus {
  Planned,
  Ongoing,
  Completed,
  Cancelled,
}

impl TrainingStatus {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownTrainingStatus(s.to_owned()))
  }
}

// ─── Geography and organisation ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct County {
  pub id:   CountyId,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityType {
  pub id:   FacilityTypeId,
  pub name: String,
}

/// A facility joined with its subcounty, county, and type names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
  pub id:                 FacilityId,
  pub name:               String,
  /// Master Facility List code.
  pub mfl_code:           Option<String>,
  pub subcounty_id:       SubcountyId,
  pub subcounty_name:     String,
  pub county_id:          CountyId,
  pub county_name:        String,
  pub facility_type_id:   FacilityTypeId,
  pub facility_type_name: String,
  pub latitude:           Option<f64>,
  pub longitude:          Option<f64>,
}

/// A staff member joined with department and cadre names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
  pub id:              UserId,
  pub first_name:      String,
  pub last_name:       String,
  pub phone:           Option<String>,
  pub facility_id:     FacilityId,
  pub department_id:   Option<DepartmentId>,
  pub department_name: Option<String>,
  pub cadre_id:        Option<CadreId>,
  pub cadre_name:      Option<String>,
}

impl Staff {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

// ─── Training records ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
  pub id:            TrainingId,
  pub title:         String,
  pub training_type: TrainingType,
  /// Hosting facility; only meaningful for mentorships.
  pub facility_id:   Option<FacilityId>,
  pub start_date:    NaiveDate,
  pub end_date:      Option<NaiveDate>,
  pub status:        TrainingStatus,
}

/// A status transition recorded for a participation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLog {
  pub id:             i64,
  pub participant_id: ParticipantId,
  pub training_id:    TrainingId,
  pub status:         CompletionStatus,
  pub notes:          Option<String>,
  pub changed_at:     DateTime<Utc>,
}

/// A scored assessment taken by a participant during a training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
  pub id:             i64,
  pub participant_id: ParticipantId,
  pub training_id:    TrainingId,
  pub category:       String,
  pub score:          f64,
  pub outcome:        Outcome,
  pub assessed_at:    NaiveDate,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────
//
// Write-side inputs used by the administrative application (and by tests) to
// populate a store. The analytics engine itself never writes.

#[derive(Debug, Clone)]
pub struct NewFacility {
  pub name:             String,
  pub mfl_code:         Option<String>,
  pub subcounty_id:     SubcountyId,
  pub facility_type_id: FacilityTypeId,
  pub latitude:         Option<f64>,
  pub longitude:        Option<f64>,
}

impl NewFacility {
  pub fn new(
    name: impl Into<String>,
    subcounty_id: SubcountyId,
    facility_type_id: FacilityTypeId,
  ) -> Self {
    Self {
      name: name.into(),
      mfl_code: None,
      subcounty_id,
      facility_type_id,
      latitude: None,
      longitude: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewStaff {
  pub first_name:    String,
  pub last_name:     String,
  pub phone:         Option<String>,
  pub facility_id:   FacilityId,
  pub department_id: Option<DepartmentId>,
  pub cadre_id:      Option<CadreId>,
}

impl NewStaff {
  pub fn new(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    facility_id: FacilityId,
  ) -> Self {
    Self {
      first_name: first_name.into(),
      last_name: last_name.into(),
      phone: None,
      facility_id,
      department_id: None,
      cadre_id: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewTraining {
  pub title:         String,
  pub training_type: TrainingType,
  pub facility_id:   Option<FacilityId>,
  pub start_date:    NaiveDate,
  pub end_date:      Option<NaiveDate>,
  pub status:        TrainingStatus,
}

impl NewTraining {
  pub fn new(
    title: impl Into<String>,
    training_type: TrainingType,
    start_date: NaiveDate,
  ) -> Self {
    Self {
      title: title.into(),
      training_type,
      facility_id: None,
      start_date,
      end_date: None,
      status: TrainingStatus::Completed,
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewParticipation {
  pub training_id:       TrainingId,
  pub user_id:           UserId,
  pub completion_status: CompletionStatus,
  pub registration_date: Option<NaiveDate>,
  pub completion_date:   Option<NaiveDate>,
  pub outcome:           Option<Outcome>,
}

impl NewParticipation {
  pub fn new(training_id: TrainingId, user_id: UserId) -> Self {
    Self {
      training_id,
      user_id,
      completion_status: CompletionStatus::Registered,
      registration_date: None,
      completion_date: None,
      outcome: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn training_type_discriminants() {
    assert_eq!(TrainingType::GlobalTraining.as_ref(), "global_training");
    assert_eq!(
      TrainingType::parse("facility_mentorship").unwrap(),
      TrainingType::FacilityMentorship
    );
    assert!(matches!(
      TrainingType::parse("webinar"),
      Err(Error::UnknownTrainingType(s)) if s == "webinar"
    ));
  }

  #[test]
  fn attribution_differs_by_delivery_model() {
    assert_eq!(
      TrainingType::GlobalTraining.attribution(),
      FacilityAttribution::ParticipantHome
    );
    assert_eq!(
      TrainingType::FacilityMentorship.attribution(),
      FacilityAttribution::TrainingVenue
    );
  }

  #[test]
  fn training_type_serde_matches_strum() {
    for t in TrainingType::ALL {
      let json = serde_json::to_value(t).unwrap();
      assert_eq!(json.as_str(), Some(t.as_ref()));
    }
  }
}
