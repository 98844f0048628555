//! Error types for `mnch-analytics`.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: i64 },

  #[error("{0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
    Self::NotFound { entity, id }
  }

  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Recover an owned error from one shared between waiters on a cache key.
  pub(crate) fn from_shared(shared: Arc<Error>) -> Self {
    Arc::try_unwrap(shared).unwrap_or_else(|shared| match &*shared {
      Self::NotFound { entity, id } => Self::NotFound { entity: *entity, id: *id },
      Self::Validation(m) => Self::Validation(m.clone()),
      Self::Store(e) => Self::Store(e.to_string().into()),
      Self::Serialization(e) => Self::Store(e.to_string().into()),
    })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
