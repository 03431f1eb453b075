//! Error type for `clipvault-store-remote`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] clipvault_core::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Typed failure returned by the remote API.
  #[error("remote api error ({status} {kind}): {message}")]
  Api {
    status:  u16,
    kind:    String,
    message: String,
  },

  /// Failure in the local mirror cache.
  #[error("mirror cache error: {0}")]
  Cache(#[from] clipvault_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
