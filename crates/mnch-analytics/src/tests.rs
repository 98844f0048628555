//! Engine tests against an in-memory SQLite store wrapped in a call counter.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{NaiveDate, TimeZone, Utc};
use mnch_core::{
  entity::{
    AssessmentResult, CompletionStatus, County, CountyId, Facility, FacilityId,
    FacilityType, FacilityTypeId, NewFacility, NewParticipation, NewStaff, NewTraining,
    Outcome, Staff, StatusLog, TrainingType, UserId,
  },
  insight::{ActionPriority, InsightKind},
  metrics::{Priority, Trend},
  scope::{Scope, YearFilter},
  store::{
    AnalyticsStore, EntityCounts, FacilityQuery, ParticipationQuery, ParticipationRow,
    TrainingCounts,
  },
};
use mnch_store_sqlite::SqliteStore;

use crate::{
  Cache, Engine, Error, Invalidation, MemoryCache,
  cache::key,
  health::{CheckStatus, OverallStatus},
  search::{CoverageFilter, SearchQuery},
};

// ─── Counting store ──────────────────────────────────────────────────────────

/// Delegates to SQLite and counts every call. `failing` turns participation,
/// ping and entity-count queries into errors; `stalled` makes participation
/// queries hang.
struct CountingStore {
  inner:          SqliteStore,
  calls:          AtomicUsize,
  participations: AtomicUsize,
  failing:        AtomicBool,
  stalled:        AtomicBool,
}

impl CountingStore {
  fn tick(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }

  fn set_failing(&self, on: bool) { self.failing.store(on, Ordering::SeqCst); }

  fn set_stalled(&self, on: bool) { self.stalled.store(on, Ordering::SeqCst); }

  fn check(&self) -> StoreResult<()> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(tokio_rusqlite::Error::ConnectionClosed.into());
    }
    Ok(())
  }

  fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  fn participation_calls(&self) -> usize { self.participations.load(Ordering::SeqCst) }
}

type StoreResult<T> = Result<T, mnch_store_sqlite::Error>;

impl AnalyticsStore for CountingStore {
  type Error = mnch_store_sqlite::Error;

  async fn counties(&self) -> StoreResult<Vec<County>> {
    self.tick();
    self.inner.counties().await
  }

  async fn get_county(&self, id: CountyId) -> StoreResult<Option<County>> {
    self.tick();
    self.inner.get_county(id).await
  }

  async fn get_facility_type(&self, id: FacilityTypeId) -> StoreResult<Option<FacilityType>> {
    self.tick();
    self.inner.get_facility_type(id).await
  }

  async fn facilities(&self, query: &FacilityQuery) -> StoreResult<Vec<Facility>> {
    self.tick();
    self.inner.facilities(query).await
  }

  async fn count_facilities(&self, query: &FacilityQuery) -> StoreResult<u64> {
    self.tick();
    self.inner.count_facilities(query).await
  }

  async fn get_facility(&self, id: FacilityId) -> StoreResult<Option<Facility>> {
    self.tick();
    self.inner.get_facility(id).await
  }

  async fn staff(&self, scope: Scope) -> StoreResult<Vec<Staff>> {
    self.tick();
    self.inner.staff(scope).await
  }

  async fn get_staff(&self, id: UserId) -> StoreResult<Option<Staff>> {
    self.tick();
    self.inner.get_staff(id).await
  }

  async fn participations(
    &self,
    query: &ParticipationQuery,
  ) -> StoreResult<Vec<ParticipationRow>> {
    self.tick();
    self.participations.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    if self.stalled.load(Ordering::SeqCst) {
      std::future::pending::<()>().await;
    }
    self.inner.participations(query).await
  }

  async fn training_counts(
    &self,
    training_type: TrainingType,
    year: YearFilter,
  ) -> StoreResult<TrainingCounts> {
    self.tick();
    self.inner.training_counts(training_type, year).await
  }

  async fn status_logs(&self, user_id: UserId) -> StoreResult<Vec<StatusLog>> {
    self.tick();
    self.inner.status_logs(user_id).await
  }

  async fn assessments(&self, user_id: UserId) -> StoreResult<Vec<AssessmentResult>> {
    self.tick();
    self.inner.assessments(user_id).await
  }

  async fn ping(&self) -> StoreResult<()> {
    self.tick();
    self.check()?;
    self.inner.ping().await
  }

  async fn entity_counts(&self) -> StoreResult<EntityCounts> {
    self.tick();
    self.check()?;
    self.inner.entity_counts().await
  }
}

// ─── Fixture ─────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Nakuru: 10 facilities (4 hospitals, 6 dispensaries), one staff member
/// each; staff 0, 1 and 4 attended a 2024 global training. Turkana: two
/// uncovered dispensaries, one staff member who attended a 2024 mentorship
/// hosted by Nakuru facility 9. Lamu: no facilities.
struct World {
  engine:     Engine<CountingStore>,
  nakuru:     CountyId,
  turkana:    CountyId,
  lamu:       CountyId,
  hospitals:  FacilityTypeId,
  facilities: Vec<FacilityId>,
  staff:      Vec<UserId>,
  emonc:      i64,
}

impl World {
  fn store(&self) -> &CountingStore { self.engine.store() }

  fn sqlite(&self) -> &SqliteStore { &self.engine.store().inner }
}

async fn world() -> World {
  let s = SqliteStore::open_in_memory().await.expect("in-memory store");

  let nakuru = s.insert_county("Nakuru").await.unwrap();
  let turkana = s.insert_county("Turkana").await.unwrap();
  let lamu = s.insert_county("Lamu").await.unwrap();
  let nakuru_east = s.insert_subcounty(nakuru, "Nakuru East").await.unwrap();
  let loima = s.insert_subcounty(turkana, "Loima").await.unwrap();
  s.insert_subcounty(lamu, "Lamu West").await.unwrap();

  let hospitals = s.insert_facility_type("Hospital").await.unwrap();
  let dispensaries = s.insert_facility_type("Dispensary").await.unwrap();
  let maternity = s.insert_department("Maternity").await.unwrap();
  let outpatient = s.insert_department("Outpatient").await.unwrap();

  let mut facilities = Vec::new();
  let mut staff = Vec::new();
  for i in 0..10 {
    let kind = if i < 4 { hospitals } else { dispensaries };
    let mut f = NewFacility::new(format!("Nakuru Facility {i:02}"), nakuru_east, kind);
    f.mfl_code = Some(format!("NK{i:03}"));
    let fid = s.insert_facility(f).await.unwrap();
    facilities.push(fid);

    let mut member = NewStaff::new("Staff", format!("{i:02}"), fid);
    member.department_id = Some(if i < 5 { maternity } else { outpatient });
    staff.push(s.insert_staff(member).await.unwrap());
  }

  let mut turkana_facilities = Vec::new();
  for i in 0..2 {
    let f = NewFacility::new(format!("Loima Dispensary {i}"), loima, dispensaries);
    turkana_facilities.push(s.insert_facility(f).await.unwrap());
  }
  let visitor = s
    .insert_staff(NewStaff::new("Ekai", "Lokwang", turkana_facilities[0]))
    .await
    .unwrap();

  let emonc = s
    .insert_training(NewTraining::new(
      "Emergency Obstetric and Newborn Care",
      TrainingType::GlobalTraining,
      date(2024, 3, 4),
    ))
    .await
    .unwrap();
  for (i, status) in [
    (0, CompletionStatus::Completed),
    (1, CompletionStatus::Completed),
    (4, CompletionStatus::Dropped),
  ] {
    let mut p = NewParticipation::new(emonc, staff[i]);
    p.completion_status = status;
    if i == 0 {
      p.outcome = Some(Outcome::Pass);
    }
    s.insert_participation(p).await.unwrap();
  }

  let mut mentorship = NewTraining::new(
    "Helping Babies Breathe mentorship",
    TrainingType::FacilityMentorship,
    date(2024, 8, 19),
  );
  mentorship.facility_id = Some(facilities[9]);
  let mentorship = s.insert_training(mentorship).await.unwrap();
  s.insert_participation(NewParticipation::new(mentorship, visitor))
    .await
    .unwrap();

  let store = CountingStore {
    inner:          s,
    calls:          AtomicUsize::new(0),
    participations: AtomicUsize::new(0),
    failing:        AtomicBool::new(false),
    stalled:        AtomicBool::new(false),
  };
  World {
    engine: Engine::new(Arc::new(store), MemoryCache::new()),
    nakuru,
    turkana,
    lamu,
    hospitals,
    facilities,
    staff,
    emonc,
  }
}

const GLOBAL: TrainingType = TrainingType::GlobalTraining;
const MENTORSHIP: TrainingType = TrainingType::FacilityMentorship;
const Y2024: YearFilter = YearFilter::Year(2024);

// ─── Coverage calculator ─────────────────────────────────────────────────────

#[tokio::test]
async fn county_with_three_of_ten_covered() {
  let w = world().await;
  let c = w
    .engine
    .compute_coverage(Scope::County(w.nakuru), GLOBAL, YearFilter::All)
    .await
    .unwrap();
  assert_eq!(c.total_facilities, 10);
  assert_eq!(c.covered_facilities, 3);
  assert_eq!(c.coverage_percentage, 30.0);
  assert_eq!(c.participant_count, 3);
  assert_eq!(c.program_count, 1);

  let analysis = w.engine.county(w.nakuru, GLOBAL, YearFilter::All).await.unwrap();
  assert_eq!(analysis.coverage.raw.coverage_percentage, 30.0);
  assert_eq!(analysis.coverage.priority, Priority::Medium);
}

#[tokio::test]
async fn empty_scope_short_circuits() {
  let w = world().await;
  let c = w
    .engine
    .compute_coverage(Scope::County(w.lamu), GLOBAL, YearFilter::All)
    .await
    .unwrap();
  assert_eq!(c.coverage_percentage, 0.0);
  assert_eq!(c.total_facilities, 0);
  assert_eq!(w.store().participation_calls(), 0);
}

#[tokio::test]
async fn mentorship_counts_towards_hosting_facility() {
  let w = world().await;

  let nakuru = w
    .engine
    .compute_coverage(Scope::County(w.nakuru), MENTORSHIP, Y2024)
    .await
    .unwrap();
  assert_eq!(nakuru.covered_facilities, 1);
  assert_eq!(nakuru.coverage_percentage, 10.0);

  let turkana = w
    .engine
    .compute_coverage(Scope::County(w.turkana), MENTORSHIP, Y2024)
    .await
    .unwrap();
  assert_eq!(turkana.covered_facilities, 0);
}

#[tokio::test]
async fn year_filter_excludes_other_years() {
  let w = world().await;
  let c = w
    .engine
    .compute_coverage(Scope::County(w.nakuru), GLOBAL, YearFilter::Year(2023))
    .await
    .unwrap();
  assert_eq!(c.covered_facilities, 0);
  assert_eq!(c.total_facilities, 10);
}

// ─── Trend ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trend_without_prior_year_is_unknown() {
  let w = world().await;
  let trend = w.engine.trend(Scope::County(w.nakuru), GLOBAL, Y2024).await;
  assert_eq!(trend, Trend::Unknown);
}

#[tokio::test]
async fn trend_compares_with_prior_year() {
  let w = world().await;
  let earlier = w
    .sqlite()
    .insert_training(NewTraining::new("Refresher", GLOBAL, date(2023, 5, 2)))
    .await
    .unwrap();
  w.sqlite()
    .insert_participation(NewParticipation::new(earlier, w.staff[0]))
    .await
    .unwrap();

  // 30% in 2024 against 10% in 2023.
  let trend = w.engine.trend(Scope::County(w.nakuru), GLOBAL, Y2024).await;
  assert_eq!(trend, Trend::Improving);

  let national = w.engine.national(GLOBAL, Y2024).await.unwrap();
  let nakuru = national.counties.iter().find(|c| c.id == w.nakuru).unwrap();
  assert_eq!(nakuru.trend, Trend::Improving);
  let turkana = national.counties.iter().find(|c| c.id == w.turkana).unwrap();
  assert_eq!(turkana.trend, Trend::Unknown);
}

#[tokio::test]
async fn trend_is_unknown_when_the_store_fails() {
  let w = world().await;
  let earlier = w
    .sqlite()
    .insert_training(NewTraining::new("Refresher", GLOBAL, date(2023, 5, 2)))
    .await
    .unwrap();
  w.sqlite()
    .insert_participation(NewParticipation::new(earlier, w.staff[0]))
    .await
    .unwrap();
  let scope = Scope::County(w.nakuru);
  assert_eq!(w.engine.trend(scope, GLOBAL, Y2024).await, Trend::Improving);

  w.store().set_failing(true);
  assert_eq!(w.engine.trend(scope, GLOBAL, Y2024).await, Trend::Unknown);
}

// ─── Cache orchestration ─────────────────────────────────────────────────────

#[tokio::test]
async fn cache_hit_skips_the_store() {
  let w = world().await;

  let first = w.engine.county(w.nakuru, GLOBAL, YearFilter::All).await.unwrap();
  let calls = w.store().calls();
  let second = w.engine.county(w.nakuru, GLOBAL, YearFilter::All).await.unwrap();

  assert_eq!(w.store().calls(), calls);
  assert_eq!(first, second);
  assert_eq!(
    serde_json::to_string(&first).unwrap(),
    serde_json::to_string(&second).unwrap()
  );
}

#[tokio::test]
async fn distinct_filters_are_cached_separately() {
  let w = world().await;
  w.engine.national(GLOBAL, YearFilter::All).await.unwrap();
  let calls = w.store().calls();
  w.engine.national(GLOBAL, Y2024).await.unwrap();
  assert!(w.store().calls() > calls);
  assert_eq!(w.engine.cache().len(), 2);
}

#[tokio::test]
async fn concurrent_misses_compute_once() {
  let w = world().await;

  let (a, b) = tokio::join!(
    w.engine.facility(w.facilities[0], GLOBAL, YearFilter::All),
    w.engine.facility(w.facilities[0], GLOBAL, YearFilter::All),
  );
  assert_eq!(a.unwrap(), b.unwrap());
  let joined = w.store().calls();

  w.engine.invalidate(Invalidation::All).await.unwrap();
  let before = w.store().calls();
  w.engine.facility(w.facilities[0], GLOBAL, YearFilter::All).await.unwrap();
  assert_eq!(w.store().calls() - before, joined);
}

#[tokio::test]
async fn errors_are_not_cached() {
  let w = world().await;
  let err = w.engine.county(9_999, GLOBAL, YearFilter::All).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { entity: "county", id: 9_999 }));
  assert!(w.engine.cache().is_empty());
}

#[tokio::test]
async fn cancelled_compute_leaves_no_entry_behind() {
  let w = world().await;
  let id = w.facilities[0];

  w.store().set_stalled(true);
  let compute = w.engine.facility(id, GLOBAL, YearFilter::All);
  let timed_out = tokio::time::timeout(Duration::from_millis(50), compute).await;
  assert!(timed_out.is_err());
  assert!(w.engine.cache().is_empty());

  w.store().set_stalled(false);
  let (a, b) = tokio::time::timeout(Duration::from_secs(5), async {
    tokio::join!(
      w.engine.facility(id, GLOBAL, YearFilter::All),
      w.engine.facility(id, GLOBAL, YearFilter::All),
    )
  })
  .await
  .expect("key is not left locked by the cancelled compute");
  assert_eq!(a.unwrap(), b.unwrap());
  assert_eq!(w.engine.cache().len(), 1);
}

#[tokio::test]
async fn county_invalidation_is_scoped() {
  let w = world().await;
  w.engine.county(w.nakuru, GLOBAL, YearFilter::All).await.unwrap();
  w.engine.county(w.turkana, GLOBAL, YearFilter::All).await.unwrap();
  w.engine.national(GLOBAL, YearFilter::All).await.unwrap();
  w.engine
    .facility_type(w.nakuru, w.hospitals, GLOBAL, YearFilter::All)
    .await
    .unwrap();

  let cleared = w.engine.invalidate(Invalidation::County(w.nakuru)).await.unwrap();
  assert_eq!(cleared.entries_removed, 3);
  assert!(cleared.patterns.contains(&format!("county:{}:*", w.nakuru)));

  let cache = w.engine.cache();
  assert_eq!(cache.len(), 1);
  assert!(
    cache
      .get(&key::county(w.turkana, GLOBAL, YearFilter::All))
      .await
      .is_some()
  );
}

#[tokio::test]
async fn facility_invalidation_reaches_its_county() {
  let w = world().await;
  w.engine.facility(w.facilities[0], GLOBAL, YearFilter::All).await.unwrap();
  w.engine.facility(w.facilities[1], GLOBAL, YearFilter::All).await.unwrap();
  w.engine.county(w.nakuru, GLOBAL, YearFilter::All).await.unwrap();

  let cleared = w
    .engine
    .invalidate(Invalidation::Facility(w.facilities[0]))
    .await
    .unwrap();
  assert_eq!(cleared.entries_removed, 2);
  assert!(
    w.engine
      .cache()
      .get(&key::facility(w.facilities[1], GLOBAL, YearFilter::All))
      .await
      .is_some()
  );
}

#[tokio::test]
async fn flush_all_clears_everything() {
  let w = world().await;
  w.engine.national(GLOBAL, YearFilter::All).await.unwrap();
  w.engine.participant(w.staff[0]).await.unwrap();
  let cleared = w.engine.invalidate(Invalidation::All).await.unwrap();
  assert_eq!(cleared.patterns, vec!["*".to_owned()]);
  assert_eq!(cleared.entries_removed, 2);
  assert!(w.engine.cache().is_empty());
}

// ─── Levels ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn national_overview() {
  let w = world().await;
  let n = w.engine.national(GLOBAL, YearFilter::All).await.unwrap();

  assert_eq!(n.counties.len(), 3);
  assert_eq!(n.national_summary.total_facilities, 12);
  assert_eq!(n.national_summary.covered_facilities, 3);
  assert_eq!(n.national_summary.coverage_percentage, 25.0);
  assert_eq!(n.national_summary.counties_with_coverage, 1);
  assert_eq!(n.national_summary.average_county_coverage, 10.0);

  let lamu = n.counties.iter().find(|c| c.id == w.lamu).unwrap();
  assert_eq!(lamu.total_facilities, 0);
  assert_eq!(lamu.coverage_percentage, 0.0);

  let alerts: Vec<_> = n.insights.iter().filter(|i| i.kind == InsightKind::Alert).collect();
  assert_eq!(alerts.len(), 1);
  assert!(alerts[0].message.contains("2 counties"));
  assert_eq!(n.metadata.level, "national");
  assert_eq!(n.metadata.cache_ttl_seconds, 1800);
}

#[tokio::test]
async fn county_breakdowns_and_actions() {
  let w = world().await;
  let a = w.engine.county(w.nakuru, GLOBAL, YearFilter::All).await.unwrap();

  let names: Vec<_> = a.facility_types.iter().map(|t| t.name.as_str()).collect();
  assert_eq!(names, vec!["Dispensary", "Hospital"]);
  assert_eq!(a.facility_types[0].coverage_percentage, 16.7);
  assert_eq!(a.facility_types[1].coverage_percentage, 50.0);

  let maternity = a.departments.iter().find(|d| d.name == "Maternity").unwrap();
  assert_eq!((maternity.total_staff, maternity.trained_staff), (5, 3));
  let outpatient = a.departments.iter().find(|d| d.name == "Outpatient").unwrap();
  assert_eq!(outpatient.coverage_percentage, 0.0);
  assert_eq!(a.cadres.len(), 1);
  assert_eq!(a.cadres[0].name, "Unassigned");

  assert_eq!(a.facilities.len(), 10);
  assert_eq!(a.facilities.iter().filter(|f| f.is_covered).count(), 3);

  assert!(a.insights.iter().any(|i| i.kind == InsightKind::Warning));
  assert!(a.insights.iter().all(|i| i.kind != InsightKind::Alert));

  let priorities: Vec<_> = a.recommended_actions.iter().map(|r| r.priority).collect();
  assert_eq!(
    priorities,
    vec![ActionPriority::Medium, ActionPriority::Low, ActionPriority::Low]
  );
  assert_eq!(a.recommended_actions[0].target, "Outpatient");
  assert_eq!(a.recommended_actions[0].estimated_participants, 5);
  assert_eq!(a.recommended_actions[1].target, "Dispensary");
  assert_eq!(a.recommended_actions[1].estimated_participants, 15);
}

#[tokio::test]
async fn facility_type_level() {
  let w = world().await;
  let a = w
    .engine
    .facility_type(w.nakuru, w.hospitals, GLOBAL, YearFilter::All)
    .await
    .unwrap();

  assert_eq!(a.facility_type.name, "Hospital");
  assert_eq!(a.county.name, "Nakuru");
  assert_eq!(a.summary.raw.total_facilities, 4);
  assert_eq!(a.summary.raw.coverage_percentage, 50.0);
  assert_eq!(a.facilities.len(), 4);
  assert!(a.facilities[0].coverage_score >= a.facilities[3].coverage_score);
  assert!(a.insights.iter().all(|i| i.kind != InsightKind::Alert));

  let missing = w.engine.facility_type(w.nakuru, 9_999, GLOBAL, YearFilter::All).await;
  assert!(matches!(missing, Err(Error::NotFound { entity: "facility type", .. })));
}

#[tokio::test]
async fn facility_level() {
  let w = world().await;
  let a = w.engine.facility(w.facilities[0], GLOBAL, YearFilter::All).await.unwrap();

  assert_eq!(a.participants.len(), 1);
  assert_eq!(a.participants[0].user_id, w.staff[0]);
  assert_eq!(a.training_history.len(), 1);
  assert_eq!(a.training_history[0].training_id, w.emonc);
  assert_eq!(a.performance.completion_rate, 100.0);
  assert_eq!(a.performance.pass_rate, 100.0);
  // 1 of 10 participants, 1 of 3 programmes, full completion.
  assert_eq!(a.performance.coverage_score, 44);
  assert_eq!(a.performance.staff_coverage_percentage, 100.0);
  assert_eq!(a.department_breakdown[0].name, "Maternity");

  let idle = w.engine.facility(w.facilities[2], GLOBAL, YearFilter::All).await.unwrap();
  assert_eq!(idle.insights[0].kind, InsightKind::Alert);

  let dropped = w.engine.facility(w.facilities[4], GLOBAL, YearFilter::All).await.unwrap();
  assert_eq!(dropped.performance.completion_rate, 0.0);
  assert_eq!(dropped.insights[0].kind, InsightKind::Warning);
}

#[tokio::test]
async fn participant_profile() {
  let w = world().await;
  let history = w
    .sqlite()
    .participations(&ParticipationQuery::for_user(w.staff[0]))
    .await
    .unwrap();
  let participation = history[0].participant_id;
  w.sqlite()
    .insert_status_log(
      participation,
      CompletionStatus::Completed,
      Some("Certified".into()),
      Utc.with_ymd_and_hms(2024, 3, 8, 16, 0, 0).unwrap(),
    )
    .await
    .unwrap();
  w.sqlite()
    .insert_assessment(participation, "Skills drill", 88.0, Outcome::Pass, date(2024, 3, 8))
    .await
    .unwrap();

  let p = w.engine.participant(w.staff[0]).await.unwrap();
  assert_eq!(p.participant.name, "Staff 00");
  assert_eq!(p.participant.county_name.as_deref(), Some("Nakuru"));
  assert_eq!(p.participant.department.as_deref(), Some("Maternity"));
  assert_eq!(p.training_history.len(), 1);
  assert_eq!(p.status_logs.len(), 1);
  assert_eq!(p.assessment_summary.average_score, 88.0);
  assert_eq!(p.performance_metrics.completed, 1);
  assert_eq!(p.performance_metrics.completion_rate, 100.0);

  let missing = w.engine.participant(9_999).await;
  assert!(matches!(missing, Err(Error::NotFound { entity: "participant", .. })));
}

// ─── Search, comparison, stats, export, health ───────────────────────────────

#[tokio::test]
async fn search_filters_by_coverage() {
  let w = world().await;
  let query = SearchQuery {
    text: Some("nk00".into()),
    county_id: Some(w.nakuru),
    coverage_filter: Some(CoverageFilter::Covered),
    ..SearchQuery::default()
  };
  let r = w.engine.search_facilities(query).await.unwrap();
  let names: Vec<_> = r.facilities.iter().map(|f| f.name.as_str()).collect();
  assert_eq!(
    names,
    vec!["Nakuru Facility 00", "Nakuru Facility 01", "Nakuru Facility 04"]
  );
  assert_eq!(r.total_found, 3);
  assert_eq!(r.filters_applied.coverage_filter, Some(CoverageFilter::Covered));

  let uncovered = SearchQuery {
    coverage_filter: Some(CoverageFilter::Uncovered),
    ..SearchQuery::default()
  };
  let r = w.engine.search_facilities(uncovered).await.unwrap();
  assert_eq!(r.total_found, 9);
}

#[tokio::test]
async fn comparison_rejects_more_than_five_without_store_access() {
  let w = world().await;
  let err = w
    .engine
    .compare_counties(&[1, 2, 3, 4, 5, 6], GLOBAL, YearFilter::All)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert_eq!(w.store().calls(), 0);
}

#[tokio::test]
async fn comparison_counts_repeated_ids_against_the_limit() {
  let w = world().await;
  let ids = [w.nakuru, w.nakuru, w.turkana, w.turkana, w.lamu, w.lamu];
  let err = w
    .engine
    .compare_counties(&ids, GLOBAL, YearFilter::All)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert_eq!(w.store().calls(), 0);

  let c = w
    .engine
    .compare_counties(&[w.nakuru, w.nakuru, w.turkana], GLOBAL, YearFilter::All)
    .await
    .unwrap();
  assert_eq!(c.comparison.len(), 2);
}

#[tokio::test]
async fn comparison_benchmarks_counties() {
  let w = world().await;
  let c = w
    .engine
    .compare_counties(&[w.turkana, w.nakuru], GLOBAL, YearFilter::All)
    .await
    .unwrap();
  assert_eq!(c.comparison.len(), 2);
  assert_eq!(c.comparison[0].county_name, "Turkana");
  assert_eq!(c.benchmark.best_performer.unwrap().county_id, w.nakuru);
  assert_eq!(c.benchmark.worst_performer.unwrap().county_id, w.turkana);
  assert_eq!(c.benchmark.average_coverage, 15.0);

  let unknown = w.engine.compare_counties(&[w.nakuru, 9_999], GLOBAL, YearFilter::All).await;
  assert!(matches!(unknown, Err(Error::NotFound { entity: "county", id: 9_999 })));
}

#[tokio::test]
async fn dashboard_stats_totals() {
  let w = world().await;
  let s = w.engine.dashboard_stats(GLOBAL, YearFilter::All).await.unwrap();
  assert_eq!(s.total_trainings, 1);
  assert_eq!(s.completed_trainings, 1);
  assert_eq!(s.total_participants, 3);
  assert_eq!(s.completed_participants, 2);
  assert_eq!(s.completion_rate, 66.7);
  assert_eq!(s.total_facilities, 12);
  assert_eq!(s.coverage_percentage, 25.0);
  assert_eq!(s.counties_with_coverage, 1);
}

#[tokio::test]
async fn exports_flatten_levels() {
  let w = world().await;
  let national = w.engine.export_national(GLOBAL, YearFilter::All).await.unwrap();
  assert_eq!(national.columns.len(), 9);
  assert_eq!(national.rows.len(), 3);
  assert!(national.rows.iter().all(|r| r.len() == national.columns.len()));

  let county = w.engine.export_county(w.nakuru, GLOBAL, YearFilter::All).await.unwrap();
  assert_eq!(county.rows.len(), 10);
  assert_eq!(county.rows[0][0], serde_json::json!("Nakuru Facility 00"));
  assert_eq!(county.rows[0][1], serde_json::json!("NK000"));
  assert!(county.title.starts_with("Nakuru County"));
}

#[tokio::test]
async fn health_reports_each_dependency() {
  let w = world().await;
  let report = w.engine.health().await;
  assert_eq!(report.overall_status, OverallStatus::Healthy);
  assert_eq!(report.checks.database.status, CheckStatus::Healthy);
  assert!(report.checks.database.response_time_ms.is_some());
  assert_eq!(report.checks.cache.status, CheckStatus::Healthy);
  assert_eq!(report.checks.models.counts.unwrap().facilities, 12);
  assert!(w.engine.cache().is_empty());
}

#[tokio::test]
async fn health_degrades_when_the_store_fails() {
  let w = world().await;
  w.store().set_failing(true);
  let report = w.engine.health().await;
  assert_eq!(report.overall_status, OverallStatus::Degraded);
  assert_eq!(report.checks.database.status, CheckStatus::Unhealthy);
  assert!(report.checks.database.response_time_ms.is_none());
  assert_eq!(report.checks.models.status, CheckStatus::Unhealthy);
  assert!(report.checks.models.counts.is_none());
  assert_eq!(report.checks.cache.status, CheckStatus::Healthy);
}
