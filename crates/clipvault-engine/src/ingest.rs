//! The ingestion pipeline.
//!
//! Consumes an ordered batch of source rows for one resolved tenant, computes
//! a content fingerprint per row, and upserts only rows whose fingerprint
//! changed. The overlay is never touched. A malformed row is recorded and
//! skipped; it never aborts the batch.

use std::{collections::BTreeSet, path::PathBuf};

use serde::{Deserialize, Serialize};

use clipvault_core::{
  fingerprint::fingerprint,
  ident::SourceId,
  record::SourceFields,
  store::{RecordStore, UpsertOutcome},
};

// ─── Input rows ──────────────────────────────────────────────────────────────

/// One row of a source export batch.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRow {
  pub id: String,
  #[serde(flatten)]
  pub fields: SourceFields,
}

/// Options for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
  /// Delete records absent from this batch. Always opt-in, never implicit.
  pub prune:      bool,
  /// When set, rows whose `media_path` does not exist under this root are
  /// counted as missing media.
  pub media_root: Option<PathBuf>,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// One row that could not be processed. Recorded, never fatal.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
  pub index:  usize,
  pub id:     Option<String>,
  pub reason: String,
}

/// Aggregate counts for one ingestion run. Callers can always tell "nothing
/// needed doing" (`skipped == n`) from "did not run".
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
  pub created:       usize,
  pub updated:       usize,
  pub skipped:       usize,
  pub deleted:       usize,
  pub missing_media: usize,
  pub failures:      Vec<RowFailure>,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Ingest `rows` into the partition of `source_id`.
///
/// Rows are JSON values so that one undecodable row becomes a [`RowFailure`]
/// instead of failing the whole batch up front. Returns the backend error
/// only for batch-level operations (the prune pass); row-level store errors
/// are captured as failures.
pub async fn ingest<S: RecordStore>(
  store: &S,
  source_id: &SourceId,
  rows: Vec<serde_json::Value>,
  options: &IngestOptions,
) -> Result<IngestReport, S::Error> {
  let mut report = IngestReport::default();
  let mut seen: BTreeSet<String> = BTreeSet::new();

  for (index, value) in rows.into_iter().enumerate() {
    let row: SourceRow = match serde_json::from_value(value) {
      Ok(row) => row,
      Err(e) => {
        report.failures.push(RowFailure {
          index,
          id: None,
          reason: e.to_string(),
        });
        continue;
      }
    };

    if let Err(reason) = validate_row_id(&row.id) {
      report.failures.push(RowFailure {
        index,
        id: Some(row.id.clone()),
        reason,
      });
      continue;
    }

    if let (Some(root), Some(media)) =
      (&options.media_root, &row.fields.media_path)
      && !root.join(media).exists()
    {
      report.missing_media += 1;
    }

    let fp = fingerprint(&row.fields);
    match store
      .upsert_record(source_id, &row.id, row.fields, fp)
      .await
    {
      Ok(UpsertOutcome::Created) => report.created += 1,
      Ok(UpsertOutcome::Updated) => report.updated += 1,
      Ok(UpsertOutcome::Skipped) => report.skipped += 1,
      Err(e) => {
        report.failures.push(RowFailure {
          index,
          id: Some(row.id.clone()),
          reason: e.to_string(),
        });
        continue;
      }
    }
    seen.insert(row.id);
  }

  if options.prune {
    for id in store.list_ids(source_id).await? {
      if !seen.contains(&id) && store.delete_record(source_id, &id).await? {
        report.deleted += 1;
      }
    }
  }

  tracing::info!(
    source = %source_id,
    created = report.created,
    updated = report.updated,
    skipped = report.skipped,
    deleted = report.deleted,
    missing_media = report.missing_media,
    failures = report.failures.len(),
    "ingestion finished"
  );

  Ok(report)
}

/// External ids end up in file names; reject anything that could escape the
/// notes directory or collide after canonicalisation.
fn validate_row_id(id: &str) -> Result<(), String> {
  if id.trim().is_empty() {
    return Err("empty id".into());
  }
  if id.contains('/') || id.contains('\\') || id.contains("..") {
    return Err(format!("id {id:?} contains path-like characters"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn row_id_validation() {
    assert!(validate_row_id("v1").is_ok());
    assert!(validate_row_id("7234981234_clip").is_ok());
    assert!(validate_row_id("").is_err());
    assert!(validate_row_id("  ").is_err());
    assert!(validate_row_id("../escape").is_err());
    assert!(validate_row_id("a/b").is_err());
  }
}
