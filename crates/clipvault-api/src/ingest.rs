//! Handler for `POST /ingest`.
//!
//! Runs the ingestion pipeline for the resolved source. The body carries the
//! raw export rows; undecodable rows come back as failures in the report, not
//! as a request error.

use std::path::PathBuf;

use axum::{
  Json,
  extract::{Query, State},
  http::HeaderMap,
};
use serde::Deserialize;

use clipvault_core::store::RecordStore;
use clipvault_engine::ingest::{IngestOptions, IngestReport, ingest};

use crate::{
  AppState,
  error::ApiError,
  scope::{ScopeParams, resolve_scope},
};

#[derive(Debug, Deserialize)]
pub struct IngestBody {
  pub rows:       Vec<serde_json::Value>,
  /// Delete records absent from this batch. Opt-in, never implicit.
  #[serde(default)]
  pub prune:      bool,
  /// Root for media existence checks, resolved on the server's filesystem.
  pub media_root: Option<PathBuf>,
}

/// `POST /ingest` — body: `{"rows":[...], "prune":false}`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ScopeParams>,
  headers: HeaderMap,
  Json(body): Json<IngestBody>,
) -> Result<Json<IngestReport>, ApiError>
where
  S: RecordStore,
{
  let source = resolve_scope(&state, params.source, &headers).await?;
  let options = IngestOptions { prune: body.prune, media_root: body.media_root };
  let report = ingest(state.store.as_ref(), &source, body.rows, &options)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report))
}
