//! Configuration for the `clipvault` binary.
//!
//! Settings come from a TOML file plus `CLIPVAULT_`-prefixed environment
//! variables; the environment wins. Every field has a default so a bare
//! `clipvault` invocation works against an embedded store in the current
//! directory.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clipvault_notes::DirtyPolicy;
use serde::Deserialize;

/// Which storage backend this process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  /// Local SQLite file, no network.
  Embedded,
  /// HTTP client of a clipvault server.
  Remote,
  /// Remote fronted by a TTL-bounded local cache.
  Mirror,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "defaults::backend")]
  pub backend:         BackendKind,
  /// SQLite file for the embedded backend.
  #[serde(default = "defaults::store_path")]
  pub store_path:      PathBuf,
  /// Base URL for the remote and mirror backends.
  #[serde(default = "defaults::remote_url")]
  pub remote_url:      String,
  /// SQLite file holding the mirror cache.
  #[serde(default = "defaults::mirror_path")]
  pub mirror_path:     PathBuf,
  #[serde(default = "defaults::mirror_ttl_secs")]
  pub mirror_ttl_secs: u64,
  #[serde(default = "defaults::notes_dir")]
  pub notes_dir:       PathBuf,
  #[serde(default = "defaults::archive_dir")]
  pub archive_dir:     PathBuf,
  /// Root for media existence checks during ingestion.
  #[serde(default)]
  pub media_root:      Option<PathBuf>,
  /// Reject operations without an explicit source instead of falling back
  /// to the profile hint or registry default.
  #[serde(default)]
  pub require_explicit_source: bool,
  /// Ambient profile index of this installation, e.g. `2` for `p02`.
  #[serde(default)]
  pub profile:         Option<u8>,
  #[serde(default)]
  pub dirty:           DirtyPolicy,
  /// Bind address for `clipvault serve`.
  #[serde(default = "defaults::host")]
  pub host:            String,
  #[serde(default = "defaults::port")]
  pub port:            u16,
}

mod defaults {
  use std::path::PathBuf;

  use super::BackendKind;

  pub fn backend() -> BackendKind { BackendKind::Embedded }
  pub fn store_path() -> PathBuf { PathBuf::from("clipvault.db") }
  pub fn remote_url() -> String { "http://127.0.0.1:8425".to_owned() }
  pub fn mirror_path() -> PathBuf { PathBuf::from("clipvault-mirror.db") }
  pub fn mirror_ttl_secs() -> u64 { clipvault_store_remote::DEFAULT_TTL_SECS }
  pub fn notes_dir() -> PathBuf { PathBuf::from("notes") }
  pub fn archive_dir() -> PathBuf { PathBuf::from("notes-archive") }
  pub fn host() -> String { "127.0.0.1".to_owned() }
  pub fn port() -> u16 { 8425 }
}

impl AppConfig {
  /// Load configuration from `path` (optional) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("CLIPVAULT"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: AppConfig = settings
      .try_deserialize()
      .context("failed to deserialise configuration")?;

    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.mirror_path = expand_tilde(&cfg.mirror_path);
    cfg.notes_dir = expand_tilde(&cfg.notes_dir);
    cfg.archive_dir = expand_tilde(&cfg.archive_dir);
    cfg.media_root = cfg.media_root.as_deref().map(expand_tilde);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
