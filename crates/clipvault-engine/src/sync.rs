//! The document synchronizer.
//!
//! Materializes records into managed-region notes, detects dirty documents,
//! consolidates duplicates across legacy directories, and resets or archives
//! documents. Files are replaced atomically (write to a sibling temp file,
//! then rename), so an interrupted run never leaves a half-written note.
//! Nothing here ever deletes a document; superseded or reset files move to a
//! timestamped archive directory.

use std::{
  collections::{BTreeMap, BTreeSet},
  fs,
  path::{Path, PathBuf},
  time::SystemTime,
};

use chrono::Utc;
use serde::Serialize;

use clipvault_core::{ident::SourceId, record::Record, store::RecordStore};
use clipvault_notes::{
  DirtyPolicy, DocumentParts, TEMPLATE_VERSION, dirty_reasons,
  document_file_name, render_generated, render_hash,
};

use crate::{Error, Result};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Outcome of materializing one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
  Created,
  Updated,
  /// Render hash and template version matched; nothing was written.
  Skipped,
}

/// Count-based result of a sync, consolidate, reset, or archive run. Never a
/// bare success flag: `skipped == n` means "nothing needed doing", which is
/// distinct from "did not run".
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
  pub created:   usize,
  pub updated:   usize,
  pub skipped:   usize,
  pub archived:  usize,
  /// Dirty documents the run refused to touch.
  pub protected: usize,
}

/// How aggressively [`Synchronizer::reset`] clears documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
  /// Skip dirty documents unless forced.
  Soft,
  /// Refuses to run at all without `force`.
  Hard,
}

// ─── Synchronizer ────────────────────────────────────────────────────────────

/// Filesystem side of document synchronization for one notes directory.
pub struct Synchronizer {
  notes_dir:   PathBuf,
  archive_dir: PathBuf,
  policy:      DirtyPolicy,
}

impl Synchronizer {
  pub fn new(
    notes_dir: impl Into<PathBuf>,
    archive_dir: impl Into<PathBuf>,
    policy: DirtyPolicy,
  ) -> Self {
    Self {
      notes_dir:   notes_dir.into(),
      archive_dir: archive_dir.into(),
      policy,
    }
  }

  /// Path of the note for one record.
  pub fn note_path(&self, source_id: &SourceId, id: &str) -> PathBuf {
    self
      .notes_dir
      .join(document_file_name(source_id.as_str(), id))
  }

  // ── Materialize ───────────────────────────────────────────────────────────

  /// Render and write the note for `record`, creating it if absent and
  /// otherwise replacing only the generated region. Byte-stable: unchanged
  /// inputs produce byte-identical output and are skipped via the embedded
  /// render hash.
  pub fn materialize(&self, record: &Record) -> Result<SyncOutcome> {
    let path = self.note_path(&record.source_id, &record.id);
    let region = render_generated(record);

    if !path.exists() {
      let parts = DocumentParts {
        before:    String::new(),
        generated: region,
        after:     "\n".into(),
      };
      write_atomic(&path, &parts.render())?;
      tracing::debug!(path = %path.display(), "note created");
      return Ok(SyncOutcome::Created);
    }

    let text = fs::read_to_string(&path)?;
    let parts = DocumentParts::parse_or_adopt(&text)?;

    let hash_matches =
      parts.generated_value("render-hash") == Some(render_hash(record).as_str());
    let template_matches =
      parts.generated_value("template") == Some(format!("v{TEMPLATE_VERSION}").as_str());
    if hash_matches && template_matches {
      return Ok(SyncOutcome::Skipped);
    }

    write_atomic(&path, &parts.merge(&region).render())?;
    tracing::debug!(path = %path.display(), "note regenerated");
    Ok(SyncOutcome::Updated)
  }

  /// Materialize every record of a source.
  pub async fn sync_source<S: RecordStore>(
    &self,
    store: &S,
    source_id: &SourceId,
  ) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for id in store.list_ids(source_id).await.map_err(Error::store)? {
      let Some(record) = store
        .get_record(source_id, &id)
        .await
        .map_err(Error::store)?
      else {
        continue;
      };
      match self.materialize(&record)? {
        SyncOutcome::Created => report.created += 1,
        SyncOutcome::Updated => report.updated += 1,
        SyncOutcome::Skipped => report.skipped += 1,
      }
    }

    tracing::info!(
      source = %source_id,
      created = report.created,
      updated = report.updated,
      skipped = report.skipped,
      "sync finished"
    );
    Ok(report)
  }

  // ── Dirty detection ───────────────────────────────────────────────────────

  /// The reasons `record`'s note counts as dirty; empty for clean or missing
  /// notes.
  pub fn dirty_reasons_for(&self, record: &Record) -> Result<Vec<String>> {
    let path = self.note_path(&record.source_id, &record.id);
    if !path.exists() {
      return Ok(Vec::new());
    }
    let text = fs::read_to_string(&path)?;
    let parts = DocumentParts::parse_or_adopt(&text)?;
    Ok(dirty_reasons(&parts, &record.overlay, &self.policy))
  }

  pub fn is_dirty(&self, record: &Record) -> Result<bool> {
    Ok(!self.dirty_reasons_for(record)?.is_empty())
  }

  // ── Consolidate ───────────────────────────────────────────────────────────

  /// Collapse duplicate documents across `legacy_dirs` into the canonical
  /// notes directory. For every file name the most-recently-modified copy
  /// wins; every other copy moves to a timestamped archive directory.
  pub fn consolidate(&self, legacy_dirs: &[PathBuf]) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    let run_dir = self.archive_run_dir("consolidate")?;

    // file name -> all copies, canonical first.
    let mut candidates: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for dir in std::iter::once(&self.notes_dir).chain(legacy_dirs) {
      for path in list_notes(dir)? {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
          candidates.entry(name.to_owned()).or_default().push(path);
        }
      }
    }

    for (name, copies) in candidates {
      let canonical = self.notes_dir.join(&name);
      let had_canonical = copies.iter().any(|p| *p == canonical);

      if copies.len() == 1 && had_canonical {
        report.skipped += 1;
        continue;
      }

      let winner = copies
        .iter()
        .max_by_key(|p| (mtime(p), std::cmp::Reverse(p.clone())))
        .cloned()
        .ok_or_else(|| {
          Error::Io(std::io::Error::other("empty candidate set"))
        })?;

      for copy in &copies {
        if *copy != winner && *copy != canonical {
          move_into(copy, &run_dir)?;
          report.archived += 1;
        }
      }

      if winner == canonical {
        report.skipped += 1;
      } else {
        if had_canonical {
          move_into(&canonical, &run_dir)?;
          report.archived += 1;
          report.updated += 1;
        } else {
          report.created += 1;
        }
        move_file(&winner, &canonical)?;
      }
    }

    tracing::info!(
      created = report.created,
      updated = report.updated,
      archived = report.archived,
      skipped = report.skipped,
      "consolidate finished"
    );
    Ok(report)
  }

  // ── Archive stale ─────────────────────────────────────────────────────────

  /// Move every note of `source_id` whose id is not in `live_ids` to the
  /// archive directory.
  pub fn archive_stale(
    &self,
    source_id: &SourceId,
    live_ids: &BTreeSet<String>,
  ) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    let mut run_dir: Option<PathBuf> = None;

    for (id, path) in self.source_notes(source_id)? {
      if live_ids.contains(&id) {
        report.skipped += 1;
        continue;
      }
      let dir = match &run_dir {
        Some(dir) => dir.clone(),
        None => {
          let dir = self.archive_run_dir("stale")?;
          run_dir = Some(dir.clone());
          dir
        }
      };
      move_into(&path, &dir)?;
      report.archived += 1;
    }

    Ok(report)
  }

  // ── Reset ─────────────────────────────────────────────────────────────────

  /// Archive the notes of `source_id`. Soft mode skips dirty documents
  /// unless `force` is set; hard mode refuses to run at all without it.
  pub async fn reset<S: RecordStore>(
    &self,
    store: &S,
    source_id: &SourceId,
    mode: ResetMode,
    force: bool,
  ) -> Result<SyncReport> {
    if mode == ResetMode::Hard && !force {
      return Err(Error::Core(clipvault_core::Error::Conflict(
        "hard reset requires the force flag".into(),
      )));
    }

    let mut report = SyncReport::default();
    let mut run_dir: Option<PathBuf> = None;
    let label = match mode {
      ResetMode::Soft => "reset-soft",
      ResetMode::Hard => "reset-hard",
    };

    for (id, path) in self.source_notes(source_id)? {
      if !force {
        let overlay = store
          .get_record(source_id, &id)
          .await
          .map_err(Error::store)?
          .map(|r| r.overlay)
          .unwrap_or_default();
        let text = fs::read_to_string(&path)?;
        let parts = DocumentParts::parse_or_adopt(&text)?;
        let reasons = dirty_reasons(&parts, &overlay, &self.policy);
        if !reasons.is_empty() {
          tracing::warn!(path = %path.display(), ?reasons, "protected from reset");
          report.protected += 1;
          continue;
        }
      }

      let dir = match &run_dir {
        Some(dir) => dir.clone(),
        None => {
          let dir = self.archive_run_dir(label)?;
          run_dir = Some(dir.clone());
          dir
        }
      };
      move_into(&path, &dir)?;
      report.archived += 1;
    }

    tracing::info!(
      source = %source_id,
      archived = report.archived,
      protected = report.protected,
      "reset finished"
    );
    Ok(report)
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// `(id, path)` for every note of one source in the canonical directory.
  fn source_notes(&self, source_id: &SourceId) -> Result<Vec<(String, PathBuf)>> {
    let prefix = format!("{}--", source_id.as_str());
    let mut notes = Vec::new();
    for path in list_notes(&self.notes_dir)? {
      let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        continue;
      };
      if let Some(stem) = name.strip_suffix(".md")
        && let Some(id) = stem.strip_prefix(&prefix)
      {
        notes.push((id.to_owned(), path));
      }
    }
    Ok(notes)
  }

  fn archive_run_dir(&self, label: &str) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let dir = self.archive_dir.join(format!("{label}-{stamp}"));
    fs::create_dir_all(&dir)?;
    Ok(dir)
  }
}

// ─── File helpers ────────────────────────────────────────────────────────────

fn list_notes(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut paths = Vec::new();
  if !dir.exists() {
    return Ok(paths);
  }
  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_file() && path.extension().is_some_and(|e| e == "md") {
      paths.push(path);
    }
  }
  paths.sort();
  Ok(paths)
}

fn mtime(path: &Path) -> SystemTime {
  fs::metadata(path)
    .and_then(|m| m.modified())
    .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Replace `path` atomically via a sibling temp file.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let tmp = path.with_extension("md.tmp");
  fs::write(&tmp, contents)?;
  fs::rename(&tmp, path)
}

/// Move `path` into `dir`, numbering the name on collision.
fn move_into(path: &Path, dir: &Path) -> std::io::Result<PathBuf> {
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "unnamed.md".to_owned());

  let mut target = dir.join(&name);
  let mut n = 1;
  while target.exists() {
    target = dir.join(format!("{n}-{name}"));
    n += 1;
  }
  move_file(path, &target)?;
  Ok(target)
}

/// Rename, falling back to copy+remove across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent)?;
  }
  match fs::rename(from, to) {
    Ok(()) => Ok(()),
    Err(_) => {
      fs::copy(from, to)?;
      fs::remove_file(from)
    }
  }
}
