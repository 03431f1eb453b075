//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Error bodies are `{"error_kind": ..., "message": ...}` so clients (the
//! remote store backend included) can react to the kind without parsing the
//! human-readable message.

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
  /// Typed tenancy or merge failure from the domain layer.
  #[error(transparent)]
  Core(#[from] clipvault_core::Error),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

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

fn core_status(err: &clipvault_core::Error) -> (StatusCode, &'static str) {
  use clipvault_core::Error as E;
  match err {
    E::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "invalid_identifier"),
    E::UnknownSource(_) => (StatusCode::NOT_FOUND, "unknown_source"),
    E::AmbiguousSource => (StatusCode::BAD_REQUEST, "ambiguous_source"),
    E::ProfileSourceMismatch { .. } => {
      (StatusCode::BAD_REQUEST, "profile_source_mismatch")
    }
    E::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
    E::DirtyTargetProtected { .. } => {
      (StatusCode::CONFLICT, "dirty_target_protected")
    }
    E::MalformedRow { .. } => (StatusCode::BAD_REQUEST, "malformed_row"),
    E::Serialization(_) => (StatusCode::BAD_REQUEST, "bad_request"),
  }
}

/// Walk a backend error's source chain looking for the domain error so that
/// a conflict surfaced through a store still maps to 409 instead of 500.
fn classify(err: &(dyn std::error::Error + 'static)) -> (StatusCode, &'static str) {
  let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
  while let Some(e) = current {
    if let Some(core) = e.downcast_ref::<clipvault_core::Error>() {
      return core_status(core);
    }
    current = e.source();
  }
  (StatusCode::INTERNAL_SERVER_ERROR, "store")
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind, message) = match &self {
      ApiError::Core(core) => {
        let (status, kind) = core_status(core);
        (status, kind, core.to_string())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, "bad_request", m.clone())
      }
      ApiError::Store(e) => {
        let (status, kind) = classify(e.as_ref());
        (status, kind, e.to_string())
      }
    };
    (status, Json(json!({ "error_kind": kind, "message": message })))
      .into_response()
  }
}
