//! Per-request tenant resolution.
//!
//! Every scoped handler funnels through [`resolve_scope`], which combines the
//! explicit `?source=` query parameter with the ambient profile header and
//! runs both through [`clipvault_core::resolver::resolve`] against a fresh
//! registry snapshot.

use axum::http::HeaderMap;
use serde::Deserialize;

use clipvault_core::{
  ident::SourceId,
  resolver::{ScopeHints, resolve},
  store::RecordStore,
};

use crate::{AppState, error::ApiError};

/// Header carrying the calling client's profile index, e.g. `2` for a client
/// bound to a `p02` schema.
pub const PROFILE_HEADER: &str = "x-clipvault-profile";

/// Query parameters shared by every tenant-scoped route.
#[derive(Debug, Deserialize)]
pub struct ScopeParams {
  pub source: Option<String>,
}

fn profile_hint(headers: &HeaderMap) -> Result<Option<u8>, ApiError> {
  let Some(value) = headers.get(PROFILE_HEADER) else {
    return Ok(None);
  };
  let text = value
    .to_str()
    .map_err(|_| ApiError::BadRequest("profile header is not valid text".into()))?;
  let profile = text.trim().parse::<u8>().map_err(|_| {
    ApiError::BadRequest(format!("profile header {text:?} is not a number"))
  })?;
  Ok(Some(profile))
}

/// Resolve the effective source for one request.
pub async fn resolve_scope<S>(
  state: &AppState<S>,
  source: Option<String>,
  headers: &HeaderMap,
) -> Result<SourceId, ApiError>
where
  S: RecordStore,
{
  let hints = ScopeHints { source, profile: profile_hint(headers)? };
  let sources = state.store.list_sources().await.map_err(ApiError::store)?;
  let resolved = resolve(&sources, &hints, &state.policy)?;
  Ok(resolved.source_id.clone())
}
