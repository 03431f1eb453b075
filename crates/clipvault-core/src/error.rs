//! Error types for `clipvault-core`.
//!
//! These are the typed tenancy and merge failures shared by every backend
//! and consumer. Transport-specific errors live in the backend crates and
//! wrap this enum via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed source id or schema name. Identifiers are rejected outright,
  /// never silently stripped down to the allowed charset.
  #[error("invalid identifier: {0:?}")]
  InvalidIdentifier(String),

  #[error("unknown source: {0:?}")]
  UnknownSource(String),

  /// Scoping was required (or no default exists) and no hint was given.
  #[error("no source specified and no unambiguous default available")]
  AmbiguousSource,

  /// Two scoping signals disagree about which tenant an operation targets.
  #[error(
    "profile/source mismatch: source {source:?} maps to profile \
     {expected:?}, request carried profile {given}"
  )]
  ProfileSourceMismatch {
    // `r#` prefix keeps thiserror from treating this field as the error's
    // `source()`; the identifier is still plain `source` to all callers.
    r#source: String,
    expected: Option<u8>,
    given:    u8,
  },

  /// Destructive or structural operation refused (non-empty source removal,
  /// unconfirmed truncate, duplicate default, ...).
  #[error("conflict: {0}")]
  Conflict(String),

  /// A document holds user content and the operation was not forced.
  ///
  /// Bulk sync and reset runs never raise this; they report protected
  /// documents as a count and move on. The variant is the wire form
  /// (`dirty_target_protected`) reserved for consumers that need a single
  /// refusal as a typed failure.
  #[error("refusing to touch dirty document {path:?}: {reasons:?}")]
  DirtyTargetProtected { path: String, reasons: Vec<String> },

  /// One ingestion row could not be processed.
  ///
  /// Never fatal to a batch; the pipeline records per-row failures in its
  /// report and carries on. The variant is the wire form (`malformed_row`)
  /// reserved for consumers that need a single row failure as a typed
  /// error.
  #[error("malformed row at index {index}: {reason}")]
  MalformedRow { index: usize, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
