//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Tags and the overlay extra
//! map are stored as compact JSON.

use chrono::{DateTime, Utc};
use clipvault_core::{
  ident::{SchemaName, SourceId},
  record::{Overlay, Record, SourceFields, WorkflowStatus},
  source::Source,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── WorkflowStatus ──────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<WorkflowStatus> {
  match s {
    "raw" => Ok(WorkflowStatus::Raw),
    "reviewing" => Ok(WorkflowStatus::Reviewing),
    "reviewed" => Ok(WorkflowStatus::Reviewed),
    "scheduling" => Ok(WorkflowStatus::Scheduling),
    "scheduled" => Ok(WorkflowStatus::Scheduled),
    "published" => Ok(WorkflowStatus::Published),
    "archived" => Ok(WorkflowStatus::Archived),
    other => Err(Error::Decode(format!("unknown workflow status: {other:?}"))),
  }
}

// ─── Overlay collections ─────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_extra(
  extra: &std::collections::BTreeMap<String, serde_json::Value>,
) -> Result<String> {
  Ok(serde_json::to_string(extra)?)
}

pub fn decode_extra(
  s: &str,
) -> Result<std::collections::BTreeMap<String, serde_json::Value>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `records` row.
pub struct RawRecord {
  pub source_id:        String,
  pub id:               String,
  pub caption:          Option<String>,
  pub author_handle:    Option<String>,
  pub author_name:      Option<String>,
  pub posted_at:        Option<String>,
  pub duration_secs:    Option<i64>,
  pub media_path:       Option<String>,
  pub fingerprint:      String,
  pub first_seen_at:    String,
  pub last_ingested_at: String,
  pub rating:           Option<i64>,
  pub status:           String,
  pub tags:             String,
  pub notes:            Option<String>,
  pub extra:            String,
}

impl RawRecord {
  /// The column list matching the field order expected by [`Self::from_row`].
  pub const COLUMNS: &'static str = "source_id, id, caption, author_handle, \
     author_name, posted_at, duration_secs, media_path, fingerprint, \
     first_seen_at, last_ingested_at, rating, status, tags, notes, extra";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source_id:        row.get(0)?,
      id:               row.get(1)?,
      caption:          row.get(2)?,
      author_handle:    row.get(3)?,
      author_name:      row.get(4)?,
      posted_at:        row.get(5)?,
      duration_secs:    row.get(6)?,
      media_path:       row.get(7)?,
      fingerprint:      row.get(8)?,
      first_seen_at:    row.get(9)?,
      last_ingested_at: row.get(10)?,
      rating:           row.get(11)?,
      status:           row.get(12)?,
      tags:             row.get(13)?,
      notes:            row.get(14)?,
      extra:            row.get(15)?,
    })
  }

  /// Encode a domain record back into raw column values. Used by the mirror
  /// cache to copy remote rows verbatim, timestamps included.
  pub fn from_record(record: &Record) -> Result<Self> {
    Ok(Self {
      source_id:        record.source_id.as_str().to_owned(),
      id:               record.id.clone(),
      caption:          record.fields.caption.clone(),
      author_handle:    record.fields.author_handle.clone(),
      author_name:      record.fields.author_name.clone(),
      posted_at:        record.fields.posted_at.map(encode_dt),
      duration_secs:    record.fields.duration_secs.map(i64::from),
      media_path:       record.fields.media_path.clone(),
      fingerprint:      record.fingerprint.clone(),
      first_seen_at:    encode_dt(record.first_seen_at),
      last_ingested_at: encode_dt(record.last_ingested_at),
      rating:           record.overlay.rating.map(i64::from),
      status:           record.overlay.status.as_str().to_owned(),
      tags:             encode_tags(&record.overlay.tags)?,
      notes:            record.overlay.notes.clone(),
      extra:            encode_extra(&record.overlay.extra)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let source_id = SourceId::parse(&self.source_id).map_err(Error::Core)?;

    let fields = SourceFields {
      caption:       self.caption,
      author_handle: self.author_handle,
      author_name:   self.author_name,
      posted_at:     self.posted_at.as_deref().map(decode_dt).transpose()?,
      duration_secs: self
        .duration_secs
        .map(|d| u32::try_from(d).map_err(|e| Error::Decode(e.to_string())))
        .transpose()?,
      media_path:    self.media_path,
    };

    let overlay = Overlay {
      rating: self
        .rating
        .map(|r| u8::try_from(r).map_err(|e| Error::Decode(e.to_string())))
        .transpose()?,
      status: decode_status(&self.status)?,
      tags:   decode_tags(&self.tags)?,
      notes:  self.notes,
      extra:  decode_extra(&self.extra)?,
    };

    Ok(Record {
      source_id,
      id: self.id,
      fields,
      overlay,
      fingerprint: self.fingerprint,
      first_seen_at: decode_dt(&self.first_seen_at)?,
      last_ingested_at: decode_dt(&self.last_ingested_at)?,
    })
  }
}

/// Raw values read directly from a `sources` row.
pub struct RawSource {
  pub source_id:   String,
  pub schema_name: String,
  pub label:       String,
  pub is_default:  bool,
  pub created_at:  String,
}

impl RawSource {
  pub const COLUMNS: &'static str =
    "source_id, schema_name, label, is_default, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source_id:   row.get(0)?,
      schema_name: row.get(1)?,
      label:       row.get(2)?,
      is_default:  row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn from_source(source: &Source) -> Self {
    Self {
      source_id:   source.source_id.as_str().to_owned(),
      schema_name: source.schema_name.as_str().to_owned(),
      label:       source.label.clone(),
      is_default:  source.is_default,
      created_at:  encode_dt(source.created_at),
    }
  }

  pub fn into_source(self) -> Result<Source> {
    Ok(Source {
      source_id:   SourceId::parse(&self.source_id).map_err(Error::Core)?,
      schema_name: SchemaName::parse(&self.schema_name).map_err(Error::Core)?,
      label:       self.label,
      is_default:  self.is_default,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
