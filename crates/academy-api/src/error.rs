//! API error type and [`axum::response::IntoResponse`] implementation.

use academy_core::ErrorKind;
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
  #[error("authentication required")]
  Unauthenticated,

  #[error(transparent)]
  Onboarding(#[from] academy_core::Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
      ApiError::Onboarding(e) => match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Expired => StatusCode::GONE,
        ErrorKind::AlreadyConsumed | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::DependencyFailure => StatusCode::SERVICE_UNAVAILABLE,
      },
    }
  }

  fn code(&self) -> &'static str {
    match self {
      ApiError::Unauthenticated => "unauthenticated",
      ApiError::Onboarding(e) => e.kind().into(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Onboarding(e) if e.is_retryable() => {
        tracing::error!(error = %e, "store failure");
        "service temporarily unavailable, retry later".to_owned()
      }
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message, "code": self.code() }))).into_response()
  }
}
