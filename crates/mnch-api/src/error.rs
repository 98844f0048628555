//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<mnch_analytics::Error> for ApiError {
  fn from(e: mnch_analytics::Error) -> Self {
    use mnch_analytics::Error as E;
    match e {
      E::NotFound { .. } => ApiError::NotFound(e.to_string()),
      E::Validation(m) => ApiError::BadRequest(m),
      E::Store(inner) => ApiError::Store(inner),
      E::Serialization(inner) => ApiError::Internal(inner.to_string()),
    }
  }
}

impl From<mnch_core::Error> for ApiError {
  fn from(e: mnch_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal failure");
        (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
