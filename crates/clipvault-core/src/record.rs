//! Record types — the unit of ingestion and the overlay of user edits.
//!
//! A record carries two disjoint attribute groups. Source-owned fields are
//! replaced wholesale by every successful ingestion. Overlay fields belong to
//! the user and are written only through explicit overlay updates; ingestion
//! never touches them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident::SourceId;

// ─── Workflow status ─────────────────────────────────────────────────────────

/// Closed workflow vocabulary for a record's overlay.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
  #[default]
  Raw,
  Reviewing,
  Reviewed,
  Scheduling,
  Scheduled,
  Published,
  Archived,
}

impl WorkflowStatus {
  /// The string stored in the `status` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Raw => "raw",
      Self::Reviewing => "reviewing",
      Self::Reviewed => "reviewed",
      Self::Scheduling => "scheduling",
      Self::Scheduled => "scheduled",
      Self::Published => "published",
      Self::Archived => "archived",
    }
  }
}

// ─── Source-owned fields ─────────────────────────────────────────────────────

/// The attributes owned by the upstream export. Fully replaceable on every
/// ingestion without data loss.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceFields {
  pub caption:       Option<String>,
  pub author_handle: Option<String>,
  pub author_name:   Option<String>,
  pub posted_at:     Option<DateTime<Utc>>,
  pub duration_secs: Option<u32>,
  /// Path of the downloaded media file, relative to the media root.
  pub media_path:    Option<String>,
}

// ─── Overlay ─────────────────────────────────────────────────────────────────

/// User-owned attributes. Unknown keys land in `extra` so they survive
/// round-trips without weakening the schema contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Overlay {
  pub rating: Option<u8>,
  #[serde(default)]
  pub status: WorkflowStatus,
  #[serde(default)]
  pub tags:   Vec<String>,
  pub notes:  Option<String>,
  #[serde(default)]
  pub extra:  BTreeMap<String, serde_json::Value>,
}

impl Overlay {
  /// True when every overlay field still holds its default value.
  pub fn is_default(&self) -> bool {
    self.rating.is_none()
      && self.status == WorkflowStatus::default()
      && self.tags.is_empty()
      && self.notes.is_none()
      && self.extra.is_empty()
  }
}

/// A partial overlay edit; unset fields are left unchanged. Clearing an
/// optional field is an explicit flag so the patch round-trips through JSON
/// without double-`Option` ambiguity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayPatch {
  #[serde(default)]
  pub rating:       Option<u8>,
  #[serde(default)]
  pub clear_rating: bool,
  #[serde(default)]
  pub status:       Option<WorkflowStatus>,
  #[serde(default)]
  pub tags:         Option<Vec<String>>,
  #[serde(default)]
  pub notes:        Option<String>,
  #[serde(default)]
  pub clear_notes:  bool,
  #[serde(default)]
  pub extra:        Option<BTreeMap<String, serde_json::Value>>,
}

impl OverlayPatch {
  pub fn apply(&self, overlay: &mut Overlay) {
    if self.clear_rating {
      overlay.rating = None;
    } else if let Some(rating) = self.rating {
      overlay.rating = Some(rating);
    }
    if let Some(status) = self.status {
      overlay.status = status;
    }
    if let Some(tags) = &self.tags {
      overlay.tags = tags.clone();
    }
    if self.clear_notes {
      overlay.notes = None;
    } else if let Some(notes) = &self.notes {
      overlay.notes = Some(notes.clone());
    }
    if let Some(extra) = &self.extra {
      overlay.extra = extra.clone();
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One ingested unit, unique per `(source_id, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
  pub source_id:        SourceId,
  /// Stable external id assigned by the upstream export.
  pub id:               String,
  pub fields:           SourceFields,
  pub overlay:          Overlay,
  /// Content fingerprint of `fields` as of the last ingestion.
  pub fingerprint:      String,
  pub first_seen_at:    DateTime<Utc>,
  pub last_ingested_at: DateTime<Utc>,
}
