//! `clipvault` — tenant-isolated clip library manager.
//!
//! Reads `clipvault.toml` (or the path given with `--config`), opens the
//! configured backend, and runs one subcommand against it. Exactly one
//! backend is active per invocation; every subcommand works identically
//! against the embedded store, a remote server, or a TTL mirror.
//!
//! # Usage
//!
//! ```
//! clipvault sources register studio --label "Studio account"
//! clipvault ingest export.json --source studio
//! clipvault sync --source studio
//! clipvault serve
//! ```

mod commands;
mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use clipvault_store_remote::{MirrorStore, RemoteConfig, RemoteStore};
use clipvault_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, BackendKind};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "clipvault", version, about = "Tenant-isolated clip library manager")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "clipvault.toml")]
  config: PathBuf,

  /// Explicit source scope for this invocation.
  #[arg(long, global = true)]
  source: Option<String>,

  /// Ambient profile index, overriding the configured one.
  #[arg(long, global = true)]
  profile: Option<u8>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
pub enum Command {
  /// Serve the JSON API over HTTP.
  Serve,

  /// Manage the source registry.
  Sources {
    #[command(subcommand)]
    command: SourcesCommand,
  },

  /// Ingest a JSON batch of export rows into the scoped source.
  Ingest {
    /// JSON file holding an array of export rows.
    file:  PathBuf,
    /// Delete records absent from this batch.
    #[arg(long)]
    prune: bool,
  },

  /// List records with overlay filters.
  Query {
    #[arg(long)]
    status:     Option<String>,
    /// Require this overlay tag; repeatable.
    #[arg(long = "tag")]
    tags:       Vec<String>,
    #[arg(long)]
    min_rating: Option<u8>,
    #[arg(long, default_value_t = 50)]
    limit:      usize,
    #[arg(long, default_value_t = 0)]
    offset:     usize,
  },

  /// Text search over captions, authors, and ids.
  Search {
    text:   String,
    #[arg(long, default_value_t = 50)]
    limit:  usize,
    #[arg(long, default_value_t = 0)]
    offset: usize,
  },

  /// Edit one record's overlay.
  Set {
    id:           String,
    #[arg(long)]
    rating:       Option<u8>,
    #[arg(long)]
    clear_rating: bool,
    #[arg(long)]
    status:       Option<String>,
    /// Replace the tag list; repeatable.
    #[arg(long = "tag")]
    tags:         Vec<String>,
    #[arg(long)]
    notes:        Option<String>,
    #[arg(long)]
    clear_notes:  bool,
  },

  /// Materialize notes for every record of the scoped source.
  Sync,

  /// Collapse duplicate notes from legacy directories into the canonical
  /// notes directory; losers move to the archive.
  Consolidate {
    #[arg(long = "legacy-dir")]
    legacy_dirs: Vec<PathBuf>,
  },

  /// Archive the scoped source's notes.
  Reset {
    #[arg(long, value_enum, default_value_t = ResetModeArg::Soft)]
    mode:  ResetModeArg,
    /// Archive dirty documents too (and allow hard mode to run).
    #[arg(long)]
    force: bool,
  },

  /// Archive notes whose record no longer exists in the store.
  Archive,

  /// Compare two sources' id spaces for contamination.
  Audit { a: String, b: String },

  /// Delete every record in the scoped source's partition.
  Truncate {
    /// Required; the operation is refused without it.
    #[arg(long)]
    confirm: bool,
  },
}

#[derive(Subcommand)]
pub enum SourcesCommand {
  /// Register a source; idempotent, re-registering updates the label.
  Register {
    id:    String,
    #[arg(long)]
    label: Option<String>,
  },
  /// List registered sources, default first.
  List,
  /// Atomically switch the default source.
  SetDefault { id: String },
  /// Remove an empty, non-default source.
  Remove { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResetModeArg {
  /// Skip dirty documents unless forced.
  Soft,
  /// Refuse to run at all without force.
  Hard,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut cfg = AppConfig::load(&cli.config)?;
  if cli.profile.is_some() {
    cfg.profile = cli.profile;
  }

  match cfg.backend {
    BackendKind::Embedded => {
      let store = SqliteStore::open(&cfg.store_path)
        .await
        .with_context(|| {
          format!("failed to open store at {:?}", cfg.store_path)
        })?;
      commands::run(store, &cfg, cli.source, cli.command).await
    }
    BackendKind::Remote => {
      let remote = RemoteStore::new(RemoteConfig {
        base_url: cfg.remote_url.clone(),
        ..RemoteConfig::default()
      })?;
      commands::run(remote, &cfg, cli.source, cli.command).await
    }
    BackendKind::Mirror => {
      let remote = RemoteStore::new(RemoteConfig {
        base_url: cfg.remote_url.clone(),
        ..RemoteConfig::default()
      })?;
      let cache = SqliteStore::open(&cfg.mirror_path)
        .await
        .with_context(|| {
          format!("failed to open mirror cache at {:?}", cfg.mirror_path)
        })?;
      let mirror = MirrorStore::new(
        remote,
        cache,
        Duration::from_secs(cfg.mirror_ttl_secs),
      );
      commands::run(mirror, &cfg, cli.source, cli.command).await
    }
  }
}
