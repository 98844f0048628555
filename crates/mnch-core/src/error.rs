//! Error types for `mnch-core`.

use thiserror::Error;

/// Parse failures for domain discriminants and filters.
#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown training type discriminant: {0:?}")]
  UnknownTrainingType(String),

  #[error("unknown completion status: {0:?}")]
  UnknownCompletionStatus(String),

  #[error("unknown training status: {0:?}")]
  UnknownTrainingStatus(String),

  #[error("unknown outcome: {0:?}")]
  UnknownOutcome(String),

  #[error("invalid year filter: {0:?} (expected \"all\" or a 4-digit year)")]
  InvalidYear(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
