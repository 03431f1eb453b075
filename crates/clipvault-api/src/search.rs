//! Handler for `GET /search`.
//!
//! Tenant-scoped text search over caption and author fields. Pagination
//! follows the same envelope as `/records/query`.

use axum::{
  Json,
  extract::{Query, State},
  http::HeaderMap,
};
use serde::Deserialize;

use clipvault_core::{
  record::Record,
  store::{Page, RecordStore},
};

use crate::{AppState, error::ApiError, scope::resolve_scope};

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub q:      String,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
  pub source: Option<String>,
}

/// `GET /search?q=<text>[&limit=..&offset=..&source=..]`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<SearchParams>,
  headers: HeaderMap,
) -> Result<Json<Page<Record>>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let page = state
    .store
    .search(
      &source,
      &params.q,
      params.limit.unwrap_or(DEFAULT_LIMIT),
      params.offset.unwrap_or(0),
    )
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}
