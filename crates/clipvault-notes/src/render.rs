//! Rendering a record into the generated region of its note.
//!
//! The region is a flat list of `key: value` lines. Rendering is a pure
//! function of the record and [`TEMPLATE_VERSION`], so two renders of an
//! unchanged record are byte-identical. The embedded `render-hash` lets the
//! synchronizer skip documents whose inputs have not changed without
//! re-reading the whole region.

use clipvault_core::record::Record;
use sha2::{Digest, Sha256};

/// Bumped whenever the region layout changes, forcing a refresh of every
/// document on the next sync.
pub const TEMPLATE_VERSION: u32 = 1;

/// Keys the renderer may emit. Anything else inside the region counts as
/// unexpected for dirty detection.
pub const GENERATED_KEYS: &[&str] = &[
  "template",
  "render-hash",
  "id",
  "source",
  "caption",
  "author",
  "posted",
  "duration",
  "media",
  "rating",
  "status",
  "tags",
  "notes",
];

/// File name of the note for `(source_id, id)` inside a notes directory.
pub fn document_file_name(source_id: &str, id: &str) -> String {
  format!("{source_id}--{id}.md")
}

/// Hash over everything that influences the rendered region.
///
/// Serde struct serialisation has a fixed field order, so the JSON string is
/// deterministic for a given record.
pub fn render_hash(record: &Record) -> String {
  let mut hasher = Sha256::new();
  hasher.update(TEMPLATE_VERSION.to_le_bytes());
  hasher.update(record.fingerprint.as_bytes());
  // Overlay edits must refresh the document too.
  if let Ok(overlay_json) = serde_json::to_string(&record.overlay) {
    hasher.update(overlay_json.as_bytes());
  }
  hex::encode(hasher.finalize())
}

/// Render the generated region body (without markers) for `record`.
pub fn render_generated(record: &Record) -> String {
  let mut out = String::new();
  let mut line = |key: &str, value: &str| {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
  };

  line("template", &format!("v{TEMPLATE_VERSION}"));
  line("render-hash", &render_hash(record));
  line("id", &record.id);
  line("source", record.source_id.as_str());

  if let Some(caption) = &record.fields.caption {
    // The region is line-oriented; captions must not span lines.
    line("caption", &caption.replace('\n', " "));
  }
  match (&record.fields.author_handle, &record.fields.author_name) {
    (Some(handle), Some(name)) => line("author", &format!("{handle} ({name})")),
    (Some(handle), None) => line("author", handle),
    (None, Some(name)) => line("author", name),
    (None, None) => {}
  }
  if let Some(posted) = record.fields.posted_at {
    line("posted", &posted.to_rfc3339());
  }
  if let Some(duration) = record.fields.duration_secs {
    line("duration", &format!("{duration}s"));
  }
  if let Some(media) = &record.fields.media_path {
    line("media", media);
  }
  if let Some(rating) = record.overlay.rating {
    line("rating", &rating.to_string());
  }
  line("status", record.overlay.status.as_str());
  if !record.overlay.tags.is_empty() {
    line("tags", &record.overlay.tags.join(", "));
  }
  if let Some(notes) = &record.overlay.notes {
    line("notes", &notes.replace('\n', " "));
  }

  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
