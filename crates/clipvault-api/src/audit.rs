//! Handler for `GET /audit/overlap`.
//!
//! Read-only isolation audit between two sources' key spaces. Both sources
//! are named explicitly; the ambient scope does not apply here.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;

use clipvault_core::{
  audit::{OverlapReport, overlap},
  ident::SourceId,
  store::RecordStore,
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct OverlapParams {
  pub a: String,
  pub b: String,
}

/// `GET /audit/overlap?a=<source>&b=<source>`
pub async fn overlap_handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<OverlapParams>,
) -> Result<Json<OverlapReport>, ApiError>
where
  S: RecordStore,
{
  let a = SourceId::parse(&params.a)?;
  let b = SourceId::parse(&params.b)?;
  for source in [&a, &b] {
    state
      .store
      .get_source(source)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| {
        ApiError::NotFound(format!("source {source} not registered"))
      })?;
  }

  let ids_a = state.store.list_ids(&a).await.map_err(ApiError::store)?;
  let ids_b = state.store.list_ids(&b).await.map_err(ApiError::store)?;
  Ok(Json(overlap(ids_a, ids_b)))
}
