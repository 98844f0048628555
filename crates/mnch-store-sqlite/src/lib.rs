//! SQLite backend for the MNCH analytics engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The schema mirrors the tables written
//! by the administrative application; the insert helpers in [`SqliteStore`]
//! exist for that application and for tests.

mod encode;
mod schema;
mod store;
mod write;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
