//! The `AnalyticsStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `mnch-store-sqlite`).
//! The analytics engine depends on this abstraction, never on a concrete
//! backend. Every method is a read; entities are owned by the administrative
//! application.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    AssessmentResult, CadreId, CompletionStatus, County, CountyId,
    DepartmentId, Facility, FacilityId, FacilityType, FacilityTypeId, Outcome,
    ParticipantId, Staff, StatusLog, TrainingId, TrainingStatus, TrainingType,
    UserId,
  },
  scope::{Scope, YearFilter},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`AnalyticsStore::facilities`] and
/// [`AnalyticsStore::count_facilities`].
#[derive(Debug, Clone, Default)]
pub struct FacilityQuery {
  pub county_id:        Option<CountyId>,
  pub facility_type_id: Option<FacilityTypeId>,
  pub facility_id:      Option<FacilityId>,
  /// Case-insensitive substring match on name or MFL code.
  pub text:             Option<String>,
  pub limit:            Option<usize>,
}

impl From<Scope> for FacilityQuery {
  fn from(scope: Scope) -> Self {
    Self {
      county_id: scope.county_id(),
      facility_type_id: scope.facility_type_id(),
      facility_id: scope.facility_id(),
      ..Self::default()
    }
  }
}

/// Parameters for [`AnalyticsStore::participations`].
///
/// When `training_type` is set, every row is attributed to a facility through
/// that type's [`FacilityAttribution`](crate::entity::FacilityAttribution).
/// When unset, each row is attributed through its own training's type.
#[derive(Debug, Clone)]
pub struct ParticipationQuery {
  pub training_type: Option<TrainingType>,
  pub year:          YearFilter,
  /// Restricts rows to those attributed to a facility inside the scope.
  pub scope:         Scope,
  pub user_id:       Option<UserId>,
}

impl ParticipationQuery {
  pub fn new(scope: Scope, training_type: TrainingType, year: YearFilter) -> Self {
    Self { training_type: Some(training_type), year, scope, user_id: None }
  }

  /// Every participation of one staff member, across both training types.
  pub fn for_user(user_id: UserId) -> Self {
    Self {
      training_type: None,
      year:          YearFilter::All,
      scope:         Scope::National,
      user_id:       Some(user_id),
    }
  }
}

// ─── Result rows ─────────────────────────────────────────────────────────────

/// One `TrainingParticipant` joined with its user, training, and the facility
/// it is attributed to. This flat row is the unit all aggregation works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationRow {
  pub participant_id:    ParticipantId,
  pub user_id:           UserId,
  pub user_name:         String,
  pub department_id:     Option<DepartmentId>,
  pub cadre_id:          Option<CadreId>,
  pub training_id:       TrainingId,
  pub training_title:    String,
  pub training_type:     TrainingType,
  pub training_status:   TrainingStatus,
  pub start_date:        NaiveDate,
  pub end_date:          Option<NaiveDate>,
  /// The facility this participation counts towards.
  pub facility_id:       FacilityId,
  pub facility_name:     String,
  pub facility_type_id:  FacilityTypeId,
  pub county_id:         CountyId,
  pub completion_status: CompletionStatus,
  pub registration_date: Option<NaiveDate>,
  pub completion_date:   Option<NaiveDate>,
  pub outcome:           Option<Outcome>,
}

/// Row totals per entity table, used by the health check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
  pub counties:     u64,
  pub facilities:   u64,
  pub users:        u64,
  pub trainings:    u64,
  pub participants: u64,
}

/// Training totals for a type/year window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingCounts {
  pub total:     u64,
  pub ongoing:   u64,
  pub completed: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read-only query interface over the training entity graph.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AnalyticsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Geography ─────────────────────────────────────────────────────────

  /// All counties, ordered by name.
  fn counties(
    &self,
  ) -> impl Future<Output = Result<Vec<County>, Self::Error>> + Send + '_;

  fn get_county(
    &self,
    id: CountyId,
  ) -> impl Future<Output = Result<Option<County>, Self::Error>> + Send + '_;

  fn get_facility_type(
    &self,
    id: FacilityTypeId,
  ) -> impl Future<Output = Result<Option<FacilityType>, Self::Error>> + Send + '_;

  // ── Facilities ────────────────────────────────────────────────────────

  /// Facilities matching `query`, ordered by name.
  fn facilities<'a>(
    &'a self,
    query: &'a FacilityQuery,
  ) -> impl Future<Output = Result<Vec<Facility>, Self::Error>> + Send + 'a;

  /// Number of facilities matching `query`; `limit` is ignored.
  fn count_facilities<'a>(
    &'a self,
    query: &'a FacilityQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn get_facility(
    &self,
    id: FacilityId,
  ) -> impl Future<Output = Result<Option<Facility>, Self::Error>> + Send + '_;

  // ── Staff ─────────────────────────────────────────────────────────────

  /// Staff whose home facility lies inside `scope`.
  fn staff(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<Staff>, Self::Error>> + Send + '_;

  fn get_staff(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<Staff>, Self::Error>> + Send + '_;

  // ── Participation ─────────────────────────────────────────────────────

  /// Attributed participation rows matching `query` in a single batched
  /// query. Rows with no attributable facility are omitted.
  fn participations<'a>(
    &'a self,
    query: &'a ParticipationQuery,
  ) -> impl Future<Output = Result<Vec<ParticipationRow>, Self::Error>> + Send + 'a;

  fn training_counts(
    &self,
    training_type: TrainingType,
    year: YearFilter,
  ) -> impl Future<Output = Result<TrainingCounts, Self::Error>> + Send + '_;

  /// Status transitions for every participation of `user_id`, newest first.
  fn status_logs(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<StatusLog>, Self::Error>> + Send + '_;

  /// Assessment results for every participation of `user_id`.
  fn assessments(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<AssessmentResult>, Self::Error>> + Send + '_;

  // ── Health ────────────────────────────────────────────────────────────

  /// Round-trip a trivial query to prove connectivity.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn entity_counts(
    &self,
  ) -> impl Future<Output = Result<EntityCounts, Self::Error>> + Send + '_;
}
