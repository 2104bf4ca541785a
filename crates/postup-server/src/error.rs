//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": message}`. Validation failures also
//! carry a `fields` map so the client can show each message next to its
//! input.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use postup_core::validation::ValidationErrors;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// A feature the server was started without.
  #[error("not configured: {0}")]
  Unconfigured(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

impl From<postup_core::Error> for ApiError {
  fn from(err: postup_core::Error) -> Self {
    use postup_core::Error as E;
    match err {
      E::Validation(errors) => Self::Validation(errors),
      E::PostNotFound(id) => Self::NotFound(format!("post {id} not found")),
      E::Forbidden(_) => Self::Forbidden("only the session that created a post can delete it".into()),
      E::Storage(e) => Self::Store(e),
    }
  }
}

/// A body that is not a JSON object of the expected shape.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": "validation failed", "fields": fields }),
      ),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "error": m })),
      ApiError::Unconfigured(m) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": m })),
      ApiError::Store(e) => {
        // Storage details stay in the log.
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal server error" }))
      }
    };
    (status, Json(body)).into_response()
  }
}
