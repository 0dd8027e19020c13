//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use pact_core::{ErrorKind, store::DomainError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or malformed x-user-id header")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Domain(#[from] pact_core::Error),

  /// A backend failure, classified by the domain error it wraps (if any).
  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a backend error, keeping the classification of the domain error
  /// inside it.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    let kind = e.domain().map_or(ErrorKind::Internal, pact_core::Error::kind);
    ApiError::Store { kind, source: Box::new(e) }
  }

  pub fn kind(&self) -> Option<ErrorKind> {
    match self {
      ApiError::Unauthorized => None,
      ApiError::BadRequest(_) => Some(ErrorKind::Validation),
      ApiError::Domain(e) => Some(e.kind()),
      ApiError::Store { kind, .. } => Some(*kind),
    }
  }

  /// The stable machine-readable code sent to clients.
  pub fn code(&self) -> &'static str {
    match self.kind() {
      None => "unauthorized",
      Some(ErrorKind::Validation) => "validation_error",
      Some(ErrorKind::NotFound) => "not_found",
      Some(ErrorKind::Forbidden) => "forbidden",
      Some(ErrorKind::InvalidTransition) => "invalid_transition",
      Some(ErrorKind::AlreadySigned) => "already_signed",
      Some(ErrorKind::Internal) => "internal_error",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self.kind() {
      None => StatusCode::UNAUTHORIZED,
      Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
      Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
      Some(ErrorKind::Forbidden) => StatusCode::FORBIDDEN,
      Some(ErrorKind::InvalidTransition | ErrorKind::AlreadySigned) => {
        StatusCode::CONFLICT
      }
      Some(ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
      "internal error".to_owned()
    } else {
      self.to_string()
    };
    (status, Json(json!({ "error": message, "code": self.code() })))
      .into_response()
  }
}
