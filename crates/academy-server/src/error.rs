//! Error types and axum `IntoResponse` implementation.

use academy_api::ApiError;
use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error(transparent)]
  Api(#[from] ApiError),
}

impl From<academy_core::Error> for Error {
  fn from(e: academy_core::Error) -> Self { Error::Api(e.into()) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"academy-admin\""),
        );
        res
      }
      Error::Api(e) => e.into_response(),
    }
  }
}
