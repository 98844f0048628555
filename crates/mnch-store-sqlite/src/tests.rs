//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, TimeZone, Utc};
use mnch_core::{
  entity::{
    CompletionStatus, NewFacility, NewParticipation, NewStaff, NewTraining,
    Outcome, TrainingStatus, TrainingType,
  },
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, FacilityQuery, ParticipationQuery},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Two counties; Nairobi holds a hospital and a dispensary, Kisumu one
/// dispensary. A nurse from the Nairobi dispensary attends a 2024 global
/// training and a 2023 mentorship hosted by the Nairobi hospital.
struct Fixture {
  nairobi:         i64,
  kisumu:          i64,
  hospital:        i64,
  dispensary:      i64,
  dispensary_type: i64,
  kisumu_disp:     i64,
  nurse:           i64,
  global:          i64,
  mentorship:      i64,
  global_part:     i64,
}

async fn seed(s: &SqliteStore) -> Fixture {
  let nairobi = s.insert_county("Nairobi").await.unwrap();
  let kisumu = s.insert_county("Kisumu").await.unwrap();
  let westlands = s.insert_subcounty(nairobi, "Westlands").await.unwrap();
  let kisumu_east = s.insert_subcounty(kisumu, "Kisumu East").await.unwrap();

  let hospital_type = s.insert_facility_type("Hospital").await.unwrap();
  let dispensary_type = s.insert_facility_type("Dispensary").await.unwrap();

  let mut h = NewFacility::new("Westlands Hospital", westlands, hospital_type);
  h.mfl_code = Some("13001".into());
  let hospital = s.insert_facility(h).await.unwrap();
  let dispensary = s
    .insert_facility(NewFacility::new("Kangemi Dispensary", westlands, dispensary_type))
    .await
    .unwrap();
  let kisumu_disp = s
    .insert_facility(NewFacility::new("Nyalenda Dispensary", kisumu_east, dispensary_type))
    .await
    .unwrap();

  let maternity = s.insert_department("Maternity").await.unwrap();
  let nursing = s.insert_cadre("Nurse").await.unwrap();

  let mut nurse = NewStaff::new("Achieng", "Otieno", dispensary);
  nurse.department_id = Some(maternity);
  nurse.cadre_id = Some(nursing);
  let nurse = s.insert_staff(nurse).await.unwrap();
  s.insert_staff(NewStaff::new("Brian", "Kamau", hospital))
    .await
    .unwrap();
  s.insert_staff(NewStaff::new("Wanjiru", "Mwangi", kisumu_disp))
    .await
    .unwrap();

  let global = s
    .insert_training(NewTraining::new(
      "Emergency Obstetric Care",
      TrainingType::GlobalTraining,
      date(2024, 2, 12),
    ))
    .await
    .unwrap();

  let mut m = NewTraining::new(
    "Newborn Resuscitation Mentorship",
    TrainingType::FacilityMentorship,
    date(2023, 9, 4),
  );
  m.facility_id = Some(hospital);
  m.status = TrainingStatus::Ongoing;
  let mentorship = s.insert_training(m).await.unwrap();

  let mut p = NewParticipation::new(global, nurse);
  p.completion_status = CompletionStatus::Completed;
  p.outcome = Some(Outcome::Pass);
  p.completion_date = Some(date(2024, 2, 16));
  let global_part = s.insert_participation(p).await.unwrap();
  s.insert_participation(NewParticipation::new(mentorship, nurse))
    .await
    .unwrap();

  Fixture {
    nairobi,
    kisumu,
    hospital,
    dispensary,
    dispensary_type,
    kisumu_disp,
    nurse,
    global,
    mentorship,
    global_part,
  }
}

// ─── Geography ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn counties_sorted_by_name() {
  let s = store().await;
  let f = seed(&s).await;

  let counties = s.counties().await.unwrap();
  let names: Vec<_> = counties.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, vec!["Kisumu", "Nairobi"]);

  assert_eq!(s.get_county(f.nairobi).await.unwrap().unwrap().name, "Nairobi");
  assert!(s.get_county(9_999).await.unwrap().is_none());
}

#[tokio::test]
async fn facility_type_lookup() {
  let s = store().await;
  let f = seed(&s).await;
  let ft = s.get_facility_type(f.dispensary_type).await.unwrap().unwrap();
  assert_eq!(ft.name, "Dispensary");
  assert!(s.get_facility_type(9_999).await.unwrap().is_none());
}

// ─── Facilities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn facilities_filtered_by_scope() {
  let s = store().await;
  let f = seed(&s).await;

  let all = FacilityQuery::from(Scope::National);
  assert_eq!(s.count_facilities(&all).await.unwrap(), 3);

  let nairobi = FacilityQuery::from(Scope::County(f.nairobi));
  assert_eq!(s.count_facilities(&nairobi).await.unwrap(), 2);

  let dispensaries = FacilityQuery::from(Scope::FacilityType {
    county_id:        f.kisumu,
    facility_type_id: f.dispensary_type,
  });
  let found = s.facilities(&dispensaries).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, f.kisumu_disp);
  assert_eq!(found[0].county_name, "Kisumu");
  assert_eq!(found[0].facility_type_name, "Dispensary");
}

#[tokio::test]
async fn facilities_text_matches_name_or_mfl_code() {
  let s = store().await;
  let f = seed(&s).await;

  let by_code = FacilityQuery { text: Some("13001".into()), ..Default::default() };
  let found = s.facilities(&by_code).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, f.hospital);

  let by_name = FacilityQuery { text: Some("dispensary".into()), ..Default::default() };
  assert_eq!(s.facilities(&by_name).await.unwrap().len(), 2);

  let limited = FacilityQuery {
    text: Some("dispensary".into()),
    limit: Some(1),
    ..Default::default()
  };
  assert_eq!(s.facilities(&limited).await.unwrap().len(), 1);
  assert_eq!(s.count_facilities(&limited).await.unwrap(), 2);
}

#[tokio::test]
async fn facilities_text_wildcards_are_literal() {
  let s = store().await;
  let county = s.insert_county("Kilifi").await.unwrap();
  let malindi = s.insert_subcounty(county, "Malindi").await.unwrap();
  let clinic = s.insert_facility_type("Clinic").await.unwrap();
  let baby_friendly = s
    .insert_facility(NewFacility::new("100% Baby Friendly Clinic", malindi, clinic))
    .await
    .unwrap();
  let mama_toto = s
    .insert_facility(NewFacility::new("Mama_Toto Clinic", malindi, clinic))
    .await
    .unwrap();
  s.insert_facility(NewFacility::new("MamaYaToto Clinic", malindi, clinic))
    .await
    .unwrap();

  let by_text = |text: &str| FacilityQuery { text: Some(text.into()), ..Default::default() };
  let found = s.facilities(&by_text("%")).await.unwrap();
  assert_eq!(found.iter().map(|f| f.id).collect::<Vec<_>>(), vec![baby_friendly]);
  assert_eq!(s.count_facilities(&by_text("%")).await.unwrap(), 1);

  let found = s.facilities(&by_text("_")).await.unwrap();
  assert_eq!(found.iter().map(|f| f.id).collect::<Vec<_>>(), vec![mama_toto]);
  assert_eq!(s.count_facilities(&by_text("Mama_Toto")).await.unwrap(), 1);
  assert_eq!(s.count_facilities(&by_text("\\")).await.unwrap(), 0);
}

#[tokio::test]
async fn get_facility_joins_names() {
  let s = store().await;
  let f = seed(&s).await;
  let fac = s.get_facility(f.dispensary).await.unwrap().unwrap();
  assert_eq!(fac.subcounty_name, "Westlands");
  assert_eq!(fac.county_id, f.nairobi);
  assert!(s.get_facility(9_999).await.unwrap().is_none());
}

// ─── Staff ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn staff_by_scope_and_id() {
  let s = store().await;
  let f = seed(&s).await;

  assert_eq!(s.staff(Scope::National).await.unwrap().len(), 3);
  assert_eq!(s.staff(Scope::County(f.nairobi)).await.unwrap().len(), 2);
  assert_eq!(s.staff(Scope::Facility(f.dispensary)).await.unwrap().len(), 1);

  let nurse = s.get_staff(f.nurse).await.unwrap().unwrap();
  assert_eq!(nurse.full_name(), "Achieng Otieno");
  assert_eq!(nurse.department_name.as_deref(), Some("Maternity"));
  assert_eq!(nurse.cadre_name.as_deref(), Some("Nurse"));
}

// ─── Participation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn global_training_attributed_to_home_facility() {
  let s = store().await;
  let f = seed(&s).await;

  let q = ParticipationQuery::new(
    Scope::National,
    TrainingType::GlobalTraining,
    YearFilter::All,
  );
  let rows = s.participations(&q).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].facility_id, f.dispensary);
  assert_eq!(rows[0].training_id, f.global);
  assert_eq!(rows[0].completion_status, CompletionStatus::Completed);
  assert_eq!(rows[0].outcome, Some(Outcome::Pass));
  assert_eq!(rows[0].user_name, "Achieng Otieno");
}

#[tokio::test]
async fn mentorship_attributed_to_training_facility() {
  let s = store().await;
  let f = seed(&s).await;

  let q = ParticipationQuery::new(
    Scope::Facility(f.hospital),
    TrainingType::FacilityMentorship,
    YearFilter::All,
  );
  let rows = s.participations(&q).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].facility_id, f.hospital);
  assert_eq!(rows[0].user_id, f.nurse);
  assert_eq!(rows[0].training_id, f.mentorship);

  // The same nurse does not count towards her home facility for mentorship.
  let q = ParticipationQuery::new(
    Scope::Facility(f.dispensary),
    TrainingType::FacilityMentorship,
    YearFilter::All,
  );
  assert!(s.participations(&q).await.unwrap().is_empty());
}

#[tokio::test]
async fn year_filter_uses_start_date() {
  let s = store().await;
  seed(&s).await;

  let q = |year| {
    ParticipationQuery::new(Scope::National, TrainingType::GlobalTraining, year)
  };
  assert_eq!(s.participations(&q(YearFilter::Year(2024))).await.unwrap().len(), 1);
  assert!(s.participations(&q(YearFilter::Year(2023))).await.unwrap().is_empty());
}

#[tokio::test]
async fn county_scope_excludes_other_counties() {
  let s = store().await;
  let f = seed(&s).await;

  let q = ParticipationQuery::new(
    Scope::County(f.kisumu),
    TrainingType::GlobalTraining,
    YearFilter::All,
  );
  assert!(s.participations(&q).await.unwrap().is_empty());
}

#[tokio::test]
async fn user_history_spans_both_types() {
  let s = store().await;
  let f = seed(&s).await;

  let rows = s
    .participations(&ParticipationQuery::for_user(f.nurse))
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);
  // Newest first.
  assert_eq!(rows[0].training_type, TrainingType::GlobalTraining);
  assert_eq!(rows[0].facility_id, f.dispensary);
  assert_eq!(rows[1].training_type, TrainingType::FacilityMentorship);
  assert_eq!(rows[1].facility_id, f.hospital);
}

#[tokio::test]
async fn training_counts_by_type_and_year() {
  let s = store().await;
  seed(&s).await;

  let c = s
    .training_counts(TrainingType::FacilityMentorship, YearFilter::All)
    .await
    .unwrap();
  assert_eq!((c.total, c.ongoing, c.completed), (1, 1, 0));

  let c = s
    .training_counts(TrainingType::GlobalTraining, YearFilter::Year(2023))
    .await
    .unwrap();
  assert_eq!(c.total, 0);
}

#[tokio::test]
async fn status_logs_and_assessments_newest_first() {
  let s = store().await;
  let f = seed(&s).await;

  let t0 = Utc.with_ymd_and_hms(2024, 2, 12, 8, 0, 0).unwrap();
  let t1 = Utc.with_ymd_and_hms(2024, 2, 16, 17, 0, 0).unwrap();
  s.insert_status_log(f.global_part, CompletionStatus::Attending, None, t0)
    .await
    .unwrap();
  s.insert_status_log(
    f.global_part,
    CompletionStatus::Completed,
    Some("All modules signed off".into()),
    t1,
  )
  .await
  .unwrap();
  s.insert_assessment(f.global_part, "Pre-test", 55.0, Outcome::Fail, date(2024, 2, 12))
    .await
    .unwrap();
  s.insert_assessment(f.global_part, "Post-test", 85.0, Outcome::Pass, date(2024, 2, 16))
    .await
    .unwrap();

  let logs = s.status_logs(f.nurse).await.unwrap();
  assert_eq!(logs.len(), 2);
  assert_eq!(logs[0].status, CompletionStatus::Completed);
  assert_eq!(logs[0].changed_at, t1);
  assert_eq!(logs[0].training_id, f.global);

  let results = s.assessments(f.nurse).await.unwrap();
  assert_eq!(results.len(), 2);
  assert_eq!(results[0].category, "Post-test");
  assert_eq!(results[1].outcome, Outcome::Fail);
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_and_entity_counts() {
  let s = store().await;
  s.ping().await.unwrap();
  assert_eq!(s.entity_counts().await.unwrap().facilities, 0);

  seed(&s).await;
  let counts = s.entity_counts().await.unwrap();
  assert_eq!(counts.counties, 2);
  assert_eq!(counts.facilities, 3);
  assert_eq!(counts.users, 3);
  assert_eq!(counts.trainings, 2);
  assert_eq!(counts.participants, 2);
}
