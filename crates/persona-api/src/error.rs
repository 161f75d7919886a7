//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

/// An error returned by an API handler.
///
/// The response body is the plain-text error message.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error(transparent)]
  Domain(#[from] persona_core::Error),

  #[error("method not allowed")]
  MethodNotAllowed,
}

impl ApiError {
  /// Convert a backend error through the shared domain taxonomy.
  pub fn store<E: Into<persona_core::Error>>(err: E) -> Self {
    ApiError::Domain(err.into())
  }

  pub fn status(&self) -> StatusCode {
    use persona_core::Error as D;
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
      ApiError::Domain(D::InvalidCurp(..) | D::InvalidQuery) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::Domain(D::NotFound) => StatusCode::NOT_FOUND,
      // Duplicates are reported as a server error, not a 409.
      ApiError::Domain(D::DuplicateCurp(_) | D::StoreUnavailable(_)) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(%status, error = %self, "request failed");
    }
    (status, self.to_string()).into_response()
  }
}
