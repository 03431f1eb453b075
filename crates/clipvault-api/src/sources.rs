//! Handlers for `/sources` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sources` | Full registry, default first |
//! | `POST`   | `/sources` | Body: `{"source_id":"...","label":"..."}` |
//! | `GET`    | `/sources/:id` | 404 if not registered |
//! | `POST`   | `/sources/:id/default` | Atomic default switch |
//! | `DELETE` | `/sources/:id` | 409 while default or non-empty |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use clipvault_core::{ident::SourceId, source::Source, store::RecordStore};

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sources`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Source>>, ApiError>
where
  S: RecordStore,
{
  let sources = state.store.list_sources().await.map_err(ApiError::store)?;
  Ok(Json(sources))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub source_id: String,
  pub label:     String,
}

/// `POST /sources` — idempotent; re-registering updates the label.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let source_id = SourceId::parse(&body.source_id)?;
  let source = state
    .store
    .register_source(source_id, body.label)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(source)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /sources/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Source>, ApiError>
where
  S: RecordStore,
{
  let source_id = SourceId::parse(&id)?;
  let source = state
    .store
    .get_source(&source_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("source {source_id} not registered")))?;
  Ok(Json(source))
}

// ─── Set default ──────────────────────────────────────────────────────────────

/// `POST /sources/:id/default`
pub async fn set_default<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  let source_id = SourceId::parse(&id)?;
  state
    .store
    .set_default_source(&source_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /sources/:id`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  let source_id = SourceId::parse(&id)?;
  state
    .store
    .remove_source(&source_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
