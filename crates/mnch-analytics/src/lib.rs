//! The progressive analytics engine.
//!
//! [`Engine`] answers drill-down coverage queries at five levels (national,
//! county, facility type, facility, participant) over any
//! [`mnch_core::store::AnalyticsStore`], caching each composed payload in an
//! injected [`cache::Cache`]. Each level issues one batched participation
//! query and groups the rows in memory.
//!
//! ```rust,ignore
//! let engine = Engine::new(store, MemoryCache::new())
//!   .with_ttls(config.cache)
//!   .with_heuristics(config.heuristics);
//! let overview = engine.national(TrainingType::GlobalTraining, YearFilter::All).await?;
//! ```

pub mod breakdown;
pub mod cache;
pub mod comparison;
pub mod county;
pub mod engine;
pub mod error;
pub mod export;
pub mod facility;
pub mod facility_type;
pub mod health;
pub mod national;
pub mod participant;
pub mod search;
pub mod stats;

pub use cache::{Cache, CacheTtls, MemoryCache};
pub use engine::{ClearedCache, Engine, Invalidation, Metadata};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
