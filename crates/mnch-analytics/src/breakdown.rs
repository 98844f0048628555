//! In-memory grouping of one batched participation result into the
//! per-facility, per-type, and per-staff-group rows the levels report.

use std::collections::{BTreeMap, HashMap, HashSet};

use mnch_core::{
  coverage::{CoverageResult, FacilityTypeCoverage, StaffGroupCoverage, completion_rate},
  entity::{Facility, FacilityId, FacilityTypeId, Staff, UserId},
  metrics::{ScoreWeights, facility_coverage_score},
  store::ParticipationRow,
};
use serde::{Deserialize, Serialize};

const UNASSIGNED: &str = "Unassigned";

/// One facility's line in a county or facility-type listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityCoverageRow {
  pub id:                FacilityId,
  pub name:              String,
  pub mfl_code:          Option<String>,
  pub subcounty:         String,
  pub facility_type_id:  FacilityTypeId,
  pub facility_type:     String,
  pub participant_count: u64,
  pub program_count:     u64,
  pub completion_rate:   f64,
  pub coverage_score:    u8,
  pub is_covered:        bool,
}

/// Score every facility in `facilities` against its attributed rows.
pub(crate) fn facility_rows(
  facilities: &[Facility],
  rows: &HashMap<FacilityId, Vec<&ParticipationRow>>,
  weights: &ScoreWeights,
) -> Vec<FacilityCoverageRow> {
  facilities
    .iter()
    .map(|f| {
      let own = rows.get(&f.id).map(Vec::as_slice).unwrap_or_default();
      let coverage = CoverageResult::tally(1, own.iter().copied());
      let completion = completion_rate(own.iter().copied());
      FacilityCoverageRow {
        id:                f.id,
        name:              f.name.clone(),
        mfl_code:          f.mfl_code.clone(),
        subcounty:         f.subcounty_name.clone(),
        facility_type_id:  f.facility_type_id,
        facility_type:     f.facility_type_name.clone(),
        participant_count: coverage.participant_count,
        program_count:     coverage.program_count,
        completion_rate:   completion,
        coverage_score:    facility_coverage_score(&coverage, completion, weights),
        is_covered:        coverage.is_covered(),
      }
    })
    .collect()
}

/// Coverage per facility type present in `facilities`, ordered by name.
pub(crate) fn facility_type_breakdown(
  facilities: &[Facility],
  rows: &[ParticipationRow],
) -> Vec<FacilityTypeCoverage> {
  let mut types: BTreeMap<(&str, FacilityTypeId), u64> = BTreeMap::new();
  for f in facilities {
    *types.entry((f.facility_type_name.as_str(), f.facility_type_id)).or_default() += 1;
  }

  types
    .into_iter()
    .map(|((name, id), total)| {
      let coverage = CoverageResult::tally(
        total,
        rows.iter().filter(|r| r.facility_type_id == id),
      );
      FacilityTypeCoverage::new(id, name.to_owned(), &coverage)
    })
    .collect()
}

/// Which staff attribute to group by.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StaffGrouping {
  Department,
  Cadre,
}

/// Trained share of `staff` per department or cadre, ordered by name with
/// staff lacking the attribute collected under "Unassigned".
pub(crate) fn staff_groups(
  staff: &[Staff],
  trained: &HashSet<UserId>,
  grouping: StaffGrouping,
) -> Vec<StaffGroupCoverage> {
  let mut groups: BTreeMap<(String, Option<i64>), (u64, u64)> = BTreeMap::new();
  for s in staff {
    let (id, name) = match grouping {
      StaffGrouping::Department => (s.department_id, s.department_name.as_deref()),
      StaffGrouping::Cadre => (s.cadre_id, s.cadre_name.as_deref()),
    };
    let name = name.unwrap_or(UNASSIGNED).to_owned();
    let counts = groups.entry((name, id)).or_default();
    counts.0 += 1;
    if trained.contains(&s.id) {
      counts.1 += 1;
    }
  }

  groups
    .into_iter()
    .map(|((name, id), (total, trained))| StaffGroupCoverage::new(id, name, total, trained))
    .collect()
}

pub(crate) fn trained_users(rows: &[ParticipationRow]) -> HashSet<UserId> {
  rows.iter().map(|r| r.user_id).collect()
}
