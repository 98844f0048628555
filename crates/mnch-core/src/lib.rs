//! Core types and trait definitions for the MNCH training analytics engine.
//!
//! No HTTP or database dependencies live here. The crate owns
//! the entity graph (county → subcounty → facility → staff → participation →
//! training), the [`store::AnalyticsStore`] query trait, and the pure
//! derived-metric and insight rules that sit on top of raw coverage counts.

// Store impls write plain `async fn`; the trait declares the `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod coverage;
pub mod entity;
pub mod error;
pub mod insight;
pub mod metrics;
pub mod scope;
pub mod store;

pub use error::{Error, Result};
