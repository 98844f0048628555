//! [`SqliteStore`]: the SQLite implementation of [`AnalyticsStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use mnch_core::{
  entity::{
    AssessmentResult, County, CountyId, Facility, FacilityId, FacilityType,
    FacilityTypeId, Staff, StatusLog, TrainingType, UserId,
  },
  scope::{Scope, YearFilter},
  store::{
    AnalyticsStore, EntityCounts, FacilityQuery, ParticipationQuery,
    ParticipationRow, TrainingCounts,
  },
};

use crate::{
  Result,
  encode::{
    RawAssessment, RawFacility, RawParticipation, RawStaff, RawStatusLog,
    attributed_facility_sql, decode_count, encode_year,
  },
  schema::SCHEMA,
};

const FACILITY_SELECT: &str = "
  SELECT f.id, f.name, f.mfl_code, f.subcounty_id, s.name, s.county_id,
         c.name, f.facility_type_id, ft.name, f.lat, f.lng
  FROM facilities f
  JOIN subcounties s     ON s.id  = f.subcounty_id
  JOIN counties c        ON c.id  = s.county_id
  JOIN facility_types ft ON ft.id = f.facility_type_id
  WHERE (?1 IS NULL OR s.county_id = ?1)
    AND (?2 IS NULL OR f.facility_type_id = ?2)
    AND (?3 IS NULL OR f.id = ?3)
    AND (?4 IS NULL OR f.name LIKE ?4 ESCAPE '\\' OR f.mfl_code LIKE ?4 ESCAPE '\\')";

const STAFF_SELECT: &str = "
  SELECT u.id, u.first_name, u.last_name, u.phone, u.facility_id,
         u.department_id, d.name, u.cadre_id, cd.name
  FROM users u
  JOIN facilities f       ON f.id  = u.facility_id
  JOIN subcounties s      ON s.id  = f.subcounty_id
  LEFT JOIN departments d ON d.id  = u.department_id
  LEFT JOIN cadres cd     ON cd.id = u.cadre_id
  WHERE (?1 IS NULL OR s.county_id = ?1)
    AND (?2 IS NULL OR f.facility_type_id = ?2)
    AND (?3 IS NULL OR f.id = ?3)
    AND (?4 IS NULL OR u.id = ?4)
  ORDER BY u.last_name, u.first_name, u.id";

/// A `LIKE` pattern matching `text` anywhere, with its wildcards taken
/// literally under `ESCAPE '\'`.
fn contains_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.trim().chars() {
    if matches!(c, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An analytics store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_facilities(&self, query: &FacilityQuery) -> Result<Vec<Facility>> {
    let county_id = query.county_id;
    let type_id = query.facility_type_id;
    let facility_id = query.facility_id;
    let pattern = query.text.as_deref().map(contains_pattern);
    let limit = query.limit.map(|l| l as i64).unwrap_or(-1);

    let raws: Vec<RawFacility> = self
      .conn
      .call(move |conn| {
        let sql = format!("{FACILITY_SELECT} ORDER BY f.name, f.id LIMIT ?5");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![county_id, type_id, facility_id, pattern, limit],
            RawFacility::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawFacility::into_facility).collect())
  }

  async fn query_staff(&self, scope: Scope, user_id: Option<UserId>) -> Result<Vec<Staff>> {
    let county_id = scope.county_id();
    let type_id = scope.facility_type_id();
    let facility_id = scope.facility_id();

    let raws: Vec<RawStaff> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(STAFF_SELECT)?;
        let rows = stmt
          .query_map(
            rusqlite::params![county_id, type_id, facility_id, user_id],
            RawStaff::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawStaff::into_staff).collect())
  }
}

// ─── AnalyticsStore impl ─────────────────────────────────────────────────────

impl AnalyticsStore for SqliteStore {
  type Error = crate::Error;

  // ── Geography ─────────────────────────────────────────────────────────────

  async fn counties(&self) -> Result<Vec<County>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, name FROM counties ORDER BY name, id")?;
        let rows = stmt
          .query_map([], |row| Ok(County { id: row.get(0)?, name: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn get_county(&self, id: CountyId) -> Result<Option<County>> {
    let county = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, name FROM counties WHERE id = ?1",
            rusqlite::params![id],
            |row| Ok(County { id: row.get(0)?, name: row.get(1)? }),
          )
          .optional()?)
      })
      .await?;
    Ok(county)
  }

  async fn get_facility_type(&self, id: FacilityTypeId) -> Result<Option<FacilityType>> {
    let facility_type = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, name FROM facility_types WHERE id = ?1",
            rusqlite::params![id],
            |row| Ok(FacilityType { id: row.get(0)?, name: row.get(1)? }),
          )
          .optional()?)
      })
      .await?;
    Ok(facility_type)
  }

  // ── Facilities ────────────────────────────────────────────────────────────

  async fn facilities(&self, query: &FacilityQuery) -> Result<Vec<Facility>> {
    self.query_facilities(query).await
  }

  async fn count_facilities(&self, query: &FacilityQuery) -> Result<u64> {
    let county_id = query.county_id;
    let type_id = query.facility_type_id;
    let facility_id = query.facility_id;
    let pattern = query.text.as_deref().map(contains_pattern);

    let n: i64 = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT COUNT(*) FROM ({FACILITY_SELECT})");
        Ok(conn.query_row(
          &sql,
          rusqlite::params![county_id, type_id, facility_id, pattern],
          |row| row.get(0),
        )?)
      })
      .await?;
    decode_count(n)
  }

  async fn get_facility(&self, id: FacilityId) -> Result<Option<Facility>> {
    let query = FacilityQuery { facility_id: Some(id), ..FacilityQuery::default() };
    Ok(self.query_facilities(&query).await?.into_iter().next())
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  async fn staff(&self, scope: Scope) -> Result<Vec<Staff>> {
    self.query_staff(scope, None).await
  }

  async fn get_staff(&self, id: UserId) -> Result<Option<Staff>> {
    Ok(self.query_staff(Scope::National, Some(id)).await?.into_iter().next())
  }

  // ── Participation ─────────────────────────────────────────────────────────

  async fn participations(
    &self,
    query: &ParticipationQuery,
  ) -> Result<Vec<ParticipationRow>> {
    let facility_expr = attributed_facility_sql(query.training_type);
    let type_str = query.training_type.map(|t| t.as_ref().to_owned());
    let year_str = encode_year(query.year);
    let county_id = query.scope.county_id();
    let type_id = query.scope.facility_type_id();
    let facility_id = query.scope.facility_id();
    let user_id = query.user_id;

    let raws: Vec<RawParticipation> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT tp.id, u.id, u.first_name || ' ' || u.last_name,
                  u.department_id, u.cadre_id,
                  t.id, t.title, t.type, t.status, t.start_date, t.end_date,
                  f.id, f.name, f.facility_type_id, s.county_id,
                  tp.completion_status, tp.registration_date,
                  tp.completion_date, tp.outcome
           FROM training_participants tp
           JOIN users u       ON u.id = tp.user_id
           JOIN trainings t   ON t.id = tp.training_id
           JOIN facilities f  ON f.id = {facility_expr}
           JOIN subcounties s ON s.id = f.subcounty_id
           WHERE (?1 IS NULL OR t.type = ?1)
             AND (?2 IS NULL OR strftime('%Y', t.start_date) = ?2)
             AND (?3 IS NULL OR s.county_id = ?3)
             AND (?4 IS NULL OR f.facility_type_id = ?4)
             AND (?5 IS NULL OR f.id = ?5)
             AND (?6 IS NULL OR tp.user_id = ?6)
           ORDER BY t.start_date DESC, tp.id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              type_str,
              year_str,
              county_id,
              type_id,
              facility_id,
              user_id
            ],
            RawParticipation::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(
      rows = raws.len(),
      training_type = ?query.training_type,
      year = %query.year,
      scope = ?query.scope,
      "participations loaded"
    );
    raws.into_iter().map(RawParticipation::into_row).collect()
  }

  async fn training_counts(
    &self,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<TrainingCounts> {
    let type_str = training_type.as_ref().to_owned();
    let year_str = encode_year(year);

    let (total, ongoing, completed): (i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(status = 'ongoing'), 0),
                  COALESCE(SUM(status = 'completed'), 0)
           FROM trainings
           WHERE type = ?1
             AND (?2 IS NULL OR strftime('%Y', start_date) = ?2)",
          rusqlite::params![type_str, year_str],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?)
      })
      .await?;

    Ok(TrainingCounts {
      total:     decode_count(total)?,
      ongoing:   decode_count(ongoing)?,
      completed: decode_count(completed)?,
    })
  }

  async fn status_logs(&self, user_id: UserId) -> Result<Vec<StatusLog>> {
    let raws: Vec<RawStatusLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT l.id, l.participant_id, tp.training_id, l.status, l.notes,
                  l.changed_at
           FROM participant_status_logs l
           JOIN training_participants tp ON tp.id = l.participant_id
           WHERE tp.user_id = ?1
           ORDER BY l.changed_at DESC, l.id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok(RawStatusLog {
              id:             row.get(0)?,
              participant_id: row.get(1)?,
              training_id:    row.get(2)?,
              status:         row.get(3)?,
              notes:          row.get(4)?,
              changed_at:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatusLog::into_log).collect()
  }

  async fn assessments(&self, user_id: UserId) -> Result<Vec<AssessmentResult>> {
    let raws: Vec<RawAssessment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.id, a.participant_id, tp.training_id, a.category, a.score,
                  a.outcome, a.assessed_at
           FROM participant_assessments a
           JOIN training_participants tp ON tp.id = a.participant_id
           WHERE tp.user_id = ?1
           ORDER BY a.assessed_at DESC, a.id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok(RawAssessment {
              id:             row.get(0)?,
              participant_id: row.get(1)?,
              training_id:    row.get(2)?,
              category:       row.get(3)?,
              score:          row.get(4)?,
              outcome:        row.get(5)?,
              assessed_at:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssessment::into_assessment).collect()
  }

  // ── Health ────────────────────────────────────────────────────────────────

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn entity_counts(&self) -> Result<EntityCounts> {
    let counts: [i64; 5] = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM counties),
                  (SELECT COUNT(*) FROM facilities),
                  (SELECT COUNT(*) FROM users),
                  (SELECT COUNT(*) FROM trainings),
                  (SELECT COUNT(*) FROM training_participants)",
          [],
          |row| Ok([row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?]),
        )?)
      })
      .await?;

    Ok(EntityCounts {
      counties:     decode_count(counts[0])?,
      facilities:   decode_count(counts[1])?,
      users:        decode_count(counts[2])?,
      trainings:    decode_count(counts[3])?,
      participants: decode_count(counts[4])?,
    })
  }
}
