//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`clipvault-store-sqlite`,
//! `clipvault-store-remote`). Higher layers (`clipvault-engine`,
//! `clipvault-api`, `clipvault-cli`) depend on this abstraction, not on any
//! concrete backend, so exactly one backend can be active per process while
//! all of them satisfy the same contract.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  ident::SourceId,
  record::{Overlay, OverlayPatch, Record, SourceFields, WorkflowStatus},
  source::Source,
};

// ─── Result envelope ─────────────────────────────────────────────────────────

/// Uniform paged result envelope returned by query and search operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:  Vec<T>,
  /// Total matches before `limit`/`offset` were applied.
  pub total:  usize,
  pub limit:  usize,
  pub offset: usize,
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Sort order for [`RecordStore::query_records`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrder {
  /// Newest `posted_at` first, nulls last, id as tiebreaker.
  #[default]
  PostedDesc,
  PostedAsc,
  IdAsc,
}

/// Parameters for [`RecordStore::query_records`]. All filters are ANDed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordQuery {
  pub status:        Option<WorkflowStatus>,
  /// Records carrying all of these overlay tags.
  #[serde(default)]
  pub tags:          Vec<String>,
  pub min_rating:    Option<u8>,
  pub posted_after:  Option<DateTime<Utc>>,
  pub posted_before: Option<DateTime<Utc>>,
  #[serde(default)]
  pub order:         RecordOrder,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

/// The outcome of one [`RecordStore::upsert_record`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
  Created,
  Updated,
  /// Fingerprint unchanged; nothing was written.
  Skipped,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a clipvault storage backend.
///
/// Every operation is scoped to a validated [`SourceId`]; no call can reach
/// another source's partition. All methods return `Send` futures so the trait
/// can be used in multi-threaded async runtimes (tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Source registry ───────────────────────────────────────────────────

  /// Register a source, deriving its schema name from the id. Idempotent:
  /// re-registering an existing id updates the label and returns the
  /// existing mapping. The first source ever registered becomes the default.
  fn register_source(
    &self,
    source_id: SourceId,
    label: String,
  ) -> impl Future<Output = Result<Source, Self::Error>> + Send + '_;

  /// Look up a source. Returns `None` if not registered.
  fn get_source<'a>(
    &'a self,
    source_id: &'a SourceId,
  ) -> impl Future<Output = Result<Option<Source>, Self::Error>> + Send + 'a;

  fn list_sources(
    &self,
  ) -> impl Future<Output = Result<Vec<Source>, Self::Error>> + Send + '_;

  /// Atomically make `source_id` the default, clearing the previous one.
  fn set_default_source<'a>(
    &'a self,
    source_id: &'a SourceId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove a source. Fails with a conflict while its partition holds
  /// records or while it is the default.
  fn remove_source<'a>(
    &'a self,
    source_id: &'a SourceId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Records ───────────────────────────────────────────────────────────

  fn get_record<'a>(
    &'a self,
    source_id: &'a SourceId,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Insert or update the source-owned fields of one record, comparing
  /// `fingerprint` against the stored one. The overlay is never written.
  fn upsert_record<'a>(
    &'a self,
    source_id: &'a SourceId,
    id: &'a str,
    fields: SourceFields,
    fingerprint: String,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + 'a;

  /// Apply a partial overlay edit and return the updated overlay.
  fn update_overlay<'a>(
    &'a self,
    source_id: &'a SourceId,
    id: &'a str,
    patch: OverlayPatch,
  ) -> impl Future<Output = Result<Overlay, Self::Error>> + Send + 'a;

  fn query_records<'a>(
    &'a self,
    source_id: &'a SourceId,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Page<Record>, Self::Error>> + Send + 'a;

  /// Tenant-scoped text search. The primary index (FTS) is used when it
  /// accepts the query and holds rows; otherwise a deterministic substring
  /// fallback over caption, author fields, and id applies.
  fn search<'a>(
    &'a self,
    source_id: &'a SourceId,
    text: &'a str,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Page<Record>, Self::Error>> + Send + 'a;

  fn delete_record<'a>(
    &'a self,
    source_id: &'a SourceId,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// All external ids stored under a source, sorted ascending.
  fn list_ids<'a>(
    &'a self,
    source_id: &'a SourceId,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  fn count_records<'a>(
    &'a self,
    source_id: &'a SourceId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Destructive / maintenance ─────────────────────────────────────────

  /// Delete every record in the source's partition. Fail-closed: refused
  /// outright unless `confirm` is `true`. Returns the number deleted.
  fn truncate<'a>(
    &'a self,
    source_id: &'a SourceId,
    confirm: bool,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Drop and repopulate the search index for one source.
  fn rebuild_search_index<'a>(
    &'a self,
    source_id: &'a SourceId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
