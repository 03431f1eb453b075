//! Handlers for record endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/records/:id` | 404 if absent in the resolved partition |
//! | `PUT`    | `/records/:id` | Body: `{"fields":{...},"fingerprint":"..."}` |
//! | `PUT`    | `/records/:id/overlay` | Body: an overlay patch |
//! | `DELETE` | `/records/:id` | Returns `{"deleted": 0|1}` |
//! | `POST`   | `/records/query` | Body: a record query; returns a page |
//! | `GET`    | `/ids` | All external ids, sorted |
//! | `GET`    | `/count` | `{"count": n}` |
//!
//! All are tenant-scoped via `?source=` and the profile header.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::HeaderMap,
};
use serde::Deserialize;
use serde_json::json;

use clipvault_core::{
  record::{Overlay, OverlayPatch, Record, SourceFields},
  store::{Page, RecordQuery, RecordStore},
};

use crate::{
  AppState,
  error::ApiError,
  scope::{ScopeParams, resolve_scope},
};

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /records/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let record = state
    .store
    .get_record(&source, &id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("record {id} not found in {source}"))
    })?;
  Ok(Json(record))
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub fields:      SourceFields,
  pub fingerprint: String,
}

/// `PUT /records/:id` — source-owned fields only; never touches the overlay.
pub async fn upsert<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
  Json(body): Json<UpsertBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let outcome = state
    .store
    .upsert_record(&source, &id, body.fields, body.fingerprint)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "outcome": outcome })))
}

// ─── Overlay ──────────────────────────────────────────────────────────────────

/// `PUT /records/:id/overlay`
pub async fn overlay<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
  Json(patch): Json<OverlayPatch>,
) -> Result<Json<Overlay>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  // Probe first so a missing record is a clean 404 rather than a
  // backend-specific error.
  state
    .store
    .get_record(&source, &id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("record {id} not found in {source}"))
    })?;
  let overlay = state
    .store
    .update_overlay(&source, &id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(overlay))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /records/:id`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let deleted = state
    .store
    .delete_record(&source, &id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "deleted": usize::from(deleted) })))
}

// ─── Query ────────────────────────────────────────────────────────────────────

/// `POST /records/query` — filters arrive as a JSON body because tag lists do
/// not round-trip through query strings.
pub async fn query<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
  Json(query): Json<RecordQuery>,
) -> Result<Json<Page<Record>>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let page = state
    .store
    .query_records(&source, &query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Ids / count ──────────────────────────────────────────────────────────────

/// `GET /ids`
pub async fn ids<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let ids = state
    .store
    .list_ids(&source)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ids))
}

/// `GET /count`
pub async fn count<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let count = state
    .store
    .count_records(&source)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "count": count })))
}
