//! The aggregate cache: a small key/value abstraction injected into the
//! [`Engine`](crate::Engine), its in-process implementation, TTL settings,
//! and the hierarchical key scheme used for prefix invalidation.
//!
//! Keys are colon-separated from the broadest segment to the narrowest, so
//! every aggregate below a county shares the `county:{id}:` prefix.

use std::{
  future::Future,
  sync::Arc,
  time::{Duration, Instant},
};

use mnch_core::{
  entity::{CountyId, FacilityId, FacilityTypeId, TrainingType, UserId},
  scope::YearFilter,
};
use moka::{Expiry, future::Cache as MokaCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Time-boxed storage for computed aggregates.
///
/// Implementations must be safe to share across request tasks. Values are
/// opaque JSON documents; typing happens in the engine.
pub trait Cache: Send + Sync + 'static {
  /// The live value under `key`, if any.
  fn get(&self, key: &str) -> impl Future<Output = Option<Value>> + Send;

  /// The live value under `key`, or the output of `init` stored for `ttl`.
  ///
  /// Concurrent callers for one key share a single `init`. An `Err` is
  /// handed to every waiter and never stored.
  fn get_or_try_insert<F>(
    &self,
    key: String,
    ttl: Duration,
    init: F,
  ) -> impl Future<Output = Result<Value, Arc<Error>>> + Send
  where
    F: Future<Output = Result<Value>> + Send;

  fn put(&self, key: String, value: Value, ttl: Duration) -> impl Future<Output = ()> + Send;

  /// Returns whether a live entry was removed.
  fn remove(&self, key: &str) -> impl Future<Output = bool> + Send;

  /// Drop every entry. Returns the number removed.
  fn flush(&self) -> impl Future<Output = usize> + Send;

  /// Drop every entry whose key starts with `prefix`.
  fn flush_prefix(&self, prefix: &str) -> impl Future<Output = usize> + Send;

  /// Number of live entries.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── MemoryCache ─────────────────────────────────────────────────────────────

/// Upper bound on entries held by [`MemoryCache::new`].
pub const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
  value: Value,
  ttl:   Duration,
}

/// Each entry lives for the TTL it was stored with, including on overwrite.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
  fn expire_after_create(
    &self,
    _key: &String,
    entry: &Entry,
    _created_at: Instant,
  ) -> Option<Duration> {
    Some(entry.ttl)
  }

  fn expire_after_update(
    &self,
    _key: &String,
    entry: &Entry,
    _updated_at: Instant,
    _remaining: Option<Duration>,
  ) -> Option<Duration> {
    Some(entry.ttl)
  }
}

/// A process-local [`Cache`] on a bounded `moka` cache with per-entry TTLs.
/// Clones share the same entries.
#[derive(Clone)]
pub struct MemoryCache {
  inner: MokaCache<String, Entry>,
}

impl Default for MemoryCache {
  fn default() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }

  pub fn with_capacity(max_entries: u64) -> Self {
    let inner = MokaCache::builder()
      .max_capacity(max_entries)
      .expire_after(EntryTtl)
      .build();
    Self { inner }
  }
}

impl Cache for MemoryCache {
  async fn get(&self, key: &str) -> Option<Value> {
    self.inner.get(key).await.map(|e| e.value)
  }

  async fn get_or_try_insert<F>(
    &self,
    key: String,
    ttl: Duration,
    init: F,
  ) -> Result<Value, Arc<Error>>
  where
    F: Future<Output = Result<Value>> + Send,
  {
    let entry = self
      .inner
      .try_get_with(key, async move {
        let value = init.await?;
        Ok::<_, Error>(Entry { value, ttl })
      })
      .await?;
    Ok(entry.value)
  }

  async fn put(&self, key: String, value: Value, ttl: Duration) {
    if ttl.is_zero() {
      return;
    }
    self.inner.insert(key, Entry { value, ttl }).await;
  }

  async fn remove(&self, key: &str) -> bool { self.inner.remove(key).await.is_some() }

  async fn flush(&self) -> usize {
    let removed = self.len();
    self.inner.invalidate_all();
    self.inner.run_pending_tasks().await;
    removed
  }

  async fn flush_prefix(&self, prefix: &str) -> usize {
    let keys: Vec<Arc<String>> = self
      .inner
      .iter()
      .filter(|(k, _)| k.starts_with(prefix))
      .map(|(k, _)| k)
      .collect();
    for key in &keys {
      self.inner.invalidate(key.as_str()).await;
    }
    keys.len()
  }

  fn len(&self) -> usize { self.inner.iter().count() }
}

// ─── TTLs ────────────────────────────────────────────────────────────────────

/// Time-to-live per aggregate level, in seconds. Deeper levels expire sooner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtls {
  pub national:        u64,
  pub county:          u64,
  pub facility_type:   u64,
  pub facility:        u64,
  pub participant:     u64,
  pub dashboard_stats: u64,
}

impl Default for CacheTtls {
  fn default() -> Self {
    Self {
      national:        1800,
      county:          1200,
      facility_type:   900,
      facility:        600,
      participant:     600,
      dashboard_stats: 900,
    }
  }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

pub mod key {
  use super::*;

  pub const NATIONAL_PREFIX: &str = "national:";
  pub const STATS_PREFIX: &str = "stats:";

  pub fn national(t: TrainingType, year: YearFilter) -> String {
    format!("national:{t}:{year}")
  }

  pub fn stats(t: TrainingType, year: YearFilter) -> String {
    format!("stats:{t}:{year}")
  }

  pub fn county(id: CountyId, t: TrainingType, year: YearFilter) -> String {
    format!("county:{id}:{t}:{year}")
  }

  pub fn facility_type(
    county_id: CountyId,
    type_id: FacilityTypeId,
    t: TrainingType,
    year: YearFilter,
  ) -> String {
    format!("county:{county_id}:facility_type:{type_id}:{t}:{year}")
  }

  pub fn facility(id: FacilityId, t: TrainingType, year: YearFilter) -> String {
    format!("facility:{id}:{t}:{year}")
  }

  pub fn participant(id: UserId) -> String { format!("participant:{id}") }

  /// Prefix matching every aggregate under one county.
  pub fn county_prefix(id: CountyId) -> String { format!("county:{id}:") }

  pub fn facility_prefix(id: FacilityId) -> String { format!("facility:{id}:") }
}
