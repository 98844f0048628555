//! Insert helpers for the administrative application and for tests.
//!
//! The analytics engine never calls these; they return the new row id.

use chrono::{DateTime, NaiveDate, Utc};
use mnch_core::entity::{
  CompletionStatus, CountyId, NewFacility, NewParticipation, NewStaff,
  NewTraining, Outcome, ParticipantId,
};

use rusqlite::types::Value;

use crate::{
  Result, SqliteStore,
  encode::{encode_date, encode_dt},
};

impl SqliteStore {
  async fn insert(&self, sql: &'static str, params: Vec<Value>) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(sql, rusqlite::params_from_iter(params))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  pub async fn insert_county(&self, name: &str) -> Result<CountyId> {
    self
      .insert("INSERT INTO counties (name) VALUES (?1)", vec![Value::from(name.to_owned())])
      .await
  }

  pub async fn insert_subcounty(&self, county_id: CountyId, name: &str) -> Result<i64> {
    self
      .insert(
        "INSERT INTO subcounties (county_id, name) VALUES (?1, ?2)",
        vec![Value::from(county_id), Value::from(name.to_owned())],
      )
      .await
  }

  pub async fn insert_facility_type(&self, name: &str) -> Result<i64> {
    self
      .insert("INSERT INTO facility_types (name) VALUES (?1)", vec![Value::from(name.to_owned())])
      .await
  }

  pub async fn insert_department(&self, name: &str) -> Result<i64> {
    self
      .insert("INSERT INTO departments (name) VALUES (?1)", vec![Value::from(name.to_owned())])
      .await
  }

  pub async fn insert_cadre(&self, name: &str) -> Result<i64> {
    self
      .insert("INSERT INTO cadres (name) VALUES (?1)", vec![Value::from(name.to_owned())])
      .await
  }

  pub async fn insert_facility(&self, input: NewFacility) -> Result<i64> {
    self
      .insert(
        "INSERT INTO facilities (name, mfl_code, subcounty_id, facility_type_id, lat, lng)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          Value::from(input.name),
          Value::from(input.mfl_code),
          Value::from(input.subcounty_id),
          Value::from(input.facility_type_id),
          Value::from(input.latitude),
          Value::from(input.longitude),
        ],
      )
      .await
  }

  pub async fn insert_staff(&self, input: NewStaff) -> Result<i64> {
    self
      .insert(
        "INSERT INTO users (first_name, last_name, phone, facility_id, department_id, cadre_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          Value::from(input.first_name),
          Value::from(input.last_name),
          Value::from(input.phone),
          Value::from(input.facility_id),
          Value::from(input.department_id),
          Value::from(input.cadre_id),
        ],
      )
      .await
  }

  pub async fn insert_training(&self, input: NewTraining) -> Result<i64> {
    self
      .insert(
        "INSERT INTO trainings (title, type, facility_id, start_date, end_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          Value::from(input.title),
          Value::from(input.training_type.as_ref().to_owned()),
          Value::from(input.facility_id),
          Value::from(encode_date(input.start_date)),
          Value::from(input.end_date.map(encode_date)),
          Value::from(input.status.as_ref().to_owned()),
        ],
      )
      .await
  }

  pub async fn insert_participation(&self, input: NewParticipation) -> Result<ParticipantId> {
    self
      .insert(
        "INSERT INTO training_participants
           (training_id, user_id, completion_status, registration_date, completion_date, outcome)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          Value::from(input.training_id),
          Value::from(input.user_id),
          Value::from(input.completion_status.as_ref().to_owned()),
          Value::from(input.registration_date.map(encode_date)),
          Value::from(input.completion_date.map(encode_date)),
          Value::from(input.outcome.map(|o| o.as_ref().to_owned())),
        ],
      )
      .await
  }

  pub async fn insert_status_log(
    &self,
    participant_id: ParticipantId,
    status: CompletionStatus,
    notes: Option<String>,
    changed_at: DateTime<Utc>,
  ) -> Result<i64> {
    self
      .insert(
        "INSERT INTO participant_status_logs (participant_id, status, notes, changed_at)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          Value::from(participant_id),
          Value::from(status.as_ref().to_owned()),
          Value::from(notes),
          Value::from(encode_dt(changed_at)),
        ],
      )
      .await
  }

  pub async fn insert_assessment(
    &self,
    participant_id: ParticipantId,
    category: &str,
    score: f64,
    outcome: Outcome,
    assessed_at: NaiveDate,
  ) -> Result<i64> {
    self
      .insert(
        "INSERT INTO participant_assessments
           (participant_id, category, score, outcome, assessed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          Value::from(participant_id),
          Value::from(category.to_owned()),
          Value::from(score),
          Value::from(outcome.as_ref().to_owned()),
          Value::from(encode_date(assessed_at)),
        ],
      )
      .await
  }
}
