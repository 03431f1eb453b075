//! Error type for `clipvault-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] clipvault_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored column value could not be decoded into its domain type.
  #[error("column decode error: {0}")]
  Decode(String),

  #[error("record not found: {source}/{id}")]
  // `r#` prefix keeps thiserror from treating this field as the error's
  // `source()`; the identifier is still plain `source` to all callers.
  RecordNotFound { r#source: String, id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
