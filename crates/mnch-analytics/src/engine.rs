//! [`Engine`]: the cache-backed orchestrator every level composer runs on.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use mnch_core::{
  coverage::CoverageResult,
  entity::{CountyId, FacilityId, TrainingType, UserId},
  metrics::{Heuristics, Trend, classify_trend},
  scope::{Scope, YearFilter},
  store::{AnalyticsStore, FacilityQuery, ParticipationQuery, ParticipationRow},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  cache::{Cache, CacheTtls, MemoryCache, key},
};

/// Response envelope fields shared by every level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
  pub level:             String,
  pub training_type:     TrainingType,
  pub year:              YearFilter,
  pub generated_at:      DateTime<Utc>,
  pub cache_ttl_seconds: u64,
}

impl Metadata {
  pub(crate) fn new(
    level: &str,
    training_type: TrainingType,
    year: YearFilter,
    ttl: u64,
  ) -> Self {
    Self {
      level: level.to_owned(),
      training_type,
      year,
      generated_at: Utc::now(),
      cache_ttl_seconds: ttl,
    }
  }
}

/// What `POST /clear-cache` asks to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
  All,
  County(CountyId),
  Facility(FacilityId),
  Participant(UserId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearedCache {
  /// Key patterns that were flushed, `*` meaning everything.
  pub patterns:        Vec<String>,
  pub entries_removed: usize,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The aggregation engine over a store `S` and a cache `C`.
///
/// Holds the injected [`Cache`], its TTLs, and the tunable [`Heuristics`].
/// Concurrent misses on the same key are computed once.
pub struct Engine<S, C = MemoryCache> {
  pub(crate) store:      Arc<S>,
  pub(crate) cache:      C,
  pub(crate) ttls:       CacheTtls,
  pub(crate) heuristics: Heuristics,
}

impl<S: AnalyticsStore, C: Cache> Engine<S, C> {
  pub fn new(store: Arc<S>, cache: C) -> Self {
    Self {
      store,
      cache,
      ttls: CacheTtls::default(),
      heuristics: Heuristics::default(),
    }
  }

  pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
    self.ttls = ttls;
    self
  }

  pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
    self.heuristics = heuristics;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn cache(&self) -> &C { &self.cache }

  pub fn heuristics(&self) -> &Heuristics { &self.heuristics }

  // ── Orchestration ─────────────────────────────────────────────────────

  /// Serve `key` from the cache, or run `compute` and store its result for
  /// `ttl_secs`. Failed computations are not stored.
  pub(crate) async fn cached<T, F>(&self, key: String, ttl_secs: u64, compute: F) -> Result<T>
  where
    T: Serialize + DeserializeOwned,
    F: Future<Output = Result<T>> + Send,
  {
    let init = async {
      debug!(%key, "cache miss");
      let value = compute.await?;
      Ok(serde_json::to_value(&value)?)
    };
    let value = self
      .cache
      .get_or_try_insert(key.clone(), Duration::from_secs(ttl_secs), init)
      .await
      .map_err(Error::from_shared)?;
    Ok(serde_json::from_value(value)?)
  }

  // ── Coverage calculator ───────────────────────────────────────────────

  /// Raw coverage of `scope` for one training type and year window.
  ///
  /// A scope without facilities short-circuits to zero before any
  /// participation query.
  pub async fn compute_coverage(
    &self,
    scope: Scope,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<CoverageResult> {
    let total = self
      .store
      .count_facilities(&FacilityQuery::from(scope))
      .await
      .map_err(Error::store)?;
    if total == 0 {
      return Ok(CoverageResult::default());
    }
    let rows = self.participations(scope, training_type, year).await?;
    Ok(CoverageResult::tally(total, &rows))
  }

  pub(crate) async fn participations(
    &self,
    scope: Scope,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Result<Vec<ParticipationRow>> {
    self
      .store
      .participations(&ParticipationQuery::new(scope, training_type, year))
      .await
      .map_err(Error::store)
  }

  // ── Trend ─────────────────────────────────────────────────────────────

  /// Coverage direction of `scope` between the anchor year of `year` and
  /// the year before. Never fails: errors and an empty prior year both
  /// yield [`Trend::Unknown`].
  pub async fn trend(
    &self,
    scope: Scope,
    training_type: TrainingType,
    year: YearFilter,
  ) -> Trend {
    let anchor = year.anchor_year(Utc::now().date_naive());
    match self.try_trend(scope, training_type, anchor).await {
      Ok(trend) => trend,
      Err(e) => {
        warn!(?scope, anchor, error = %e, "trend calculation failed");
        Trend::Unknown
      }
    }
  }

  async fn try_trend(
    &self,
    scope: Scope,
    training_type: TrainingType,
    anchor: i32,
  ) -> Result<Trend> {
    let previous = self
      .compute_coverage(scope, training_type, YearFilter::Year(anchor - 1))
      .await?;
    if previous.participant_count == 0 {
      return Ok(Trend::Unknown);
    }
    let current = self
      .compute_coverage(scope, training_type, YearFilter::Year(anchor))
      .await?;
    Ok(trend_between(&current, &previous, &self.heuristics))
  }

  // ── Invalidation ──────────────────────────────────────────────────────

  /// Drop the aggregates affected by a change to `target`.
  ///
  /// A participant invalidates their home facility; a facility invalidates
  /// its county; a county invalidates the national and stats aggregates.
  pub async fn invalidate(&self, target: Invalidation) -> Result<ClearedCache> {
    let patterns = match target {
      Invalidation::All => {
        let removed = self.cache.flush().await;
        info!(removed, "cache flushed");
        return Ok(ClearedCache { patterns: vec!["*".to_owned()], entries_removed: removed });
      }
      Invalidation::County(id) => county_patterns(id),
      Invalidation::Facility(id) => self.facility_patterns(id).await?,
      Invalidation::Participant(id) => {
        let mut patterns = vec![key::participant(id)];
        let staff = self.store.get_staff(id).await.map_err(Error::store)?;
        if let Some(staff) = staff {
          patterns.extend(self.facility_patterns(staff.facility_id).await?);
        }
        patterns
      }
    };

    let mut removed = 0;
    for pattern in &patterns {
      removed += self.cache.flush_prefix(pattern).await;
    }
    info!(?target, removed, "cache invalidated");
    Ok(ClearedCache {
      patterns: patterns.into_iter().map(|p| format!("{p}*")).collect(),
      entries_removed: removed,
    })
  }

  async fn facility_patterns(&self, id: FacilityId) -> Result<Vec<String>> {
    let mut patterns = vec![key::facility_prefix(id)];
    let facility = self.store.get_facility(id).await.map_err(Error::store)?;
    match facility {
      Some(f) => patterns.extend(county_patterns(f.county_id)),
      None => {
        patterns.push(key::NATIONAL_PREFIX.to_owned());
        patterns.push(key::STATS_PREFIX.to_owned());
      }
    }
    Ok(patterns)
  }
}

fn county_patterns(id: CountyId) -> Vec<String> {
  vec![
    key::county_prefix(id),
    key::NATIONAL_PREFIX.to_owned(),
    key::STATS_PREFIX.to_owned(),
  ]
}

/// Trend from two precomputed coverages; an empty prior year is unknown.
pub(crate) fn trend_between(
  current: &CoverageResult,
  previous: &CoverageResult,
  heuristics: &Heuristics,
) -> Trend {
  if previous.participant_count == 0 {
    return Trend::Unknown;
  }
  classify_trend(
    current.coverage_percentage,
    previous.coverage_percentage,
    &heuristics.trend,
  )
}

/// Group borrowed rows by `key`.
pub(crate) fn group_rows<K, F>(
  rows: &[ParticipationRow],
  key: F,
) -> HashMap<K, Vec<&ParticipationRow>>
where
  K: std::hash::Hash + Eq,
  F: Fn(&ParticipationRow) -> K,
{
  let mut groups: HashMap<K, Vec<&ParticipationRow>> = HashMap::new();
  for row in rows {
    groups.entry(key(row)).or_default().push(row);
  }
  groups
}
