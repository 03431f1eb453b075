//! Handlers for destructive and maintenance endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/truncate` | Body: `{"confirm":true}`; refused otherwise |
//! | `POST` | `/rebuild-search` | Repopulates the search index |

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_json::json;

use clipvault_core::store::RecordStore;

use crate::{
  AppState,
  error::ApiError,
  scope::{ScopeParams, resolve_scope},
};

#[derive(Debug, Deserialize)]
pub struct TruncateBody {
  #[serde(default)]
  pub confirm: bool,
}

/// `POST /truncate` — fail-closed; the backend rejects unconfirmed calls.
pub async fn truncate<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
  Json(body): Json<TruncateBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let deleted = state
    .store
    .truncate(&source, body.confirm)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "deleted": deleted })))
}

/// `POST /rebuild-search`
pub async fn rebuild_search<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  state
    .store
    .rebuild_search_index(&source)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
