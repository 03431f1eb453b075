//! Error type for `clipvault-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] clipvault_core::Error),

  #[error("document error: {0}")]
  Document(#[from] clipvault_notes::document::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Failure surfaced by whichever backend is active.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
