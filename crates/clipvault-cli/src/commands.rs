//! Subcommand implementations, generic over the active backend.
//!
//! Every tenant-scoped command resolves its effective source through the same
//! guard as the HTTP API: the `--source` flag is the explicit hint, the
//! configured profile index is the ambient one, and the configured policy
//! decides whether falling back to the registry default is allowed.

use std::{collections::BTreeSet, sync::Arc};

use anyhow::{Context as _, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use clipvault_core::{
  audit::overlap,
  ident::SourceId,
  record::{OverlayPatch, WorkflowStatus},
  resolver::{ScopeHints, ScopePolicy, resolve},
  store::{RecordQuery, RecordStore},
};
use clipvault_engine::{
  ingest::{IngestOptions, ingest},
  sync::{ResetMode, Synchronizer},
};

use crate::{Command, ResetModeArg, SourcesCommand, config::AppConfig};

/// Run one subcommand against `store`.
pub async fn run<S>(
  store: S,
  cfg: &AppConfig,
  source_flag: Option<String>,
  command: Command,
) -> Result<()>
where
  S: RecordStore + 'static,
{
  match command {
    Command::Serve => serve(store, cfg).await,

    Command::Sources { command } => sources(&store, command).await,

    Command::Ingest { file, prune } => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading batch file {}", file.display()))?;
      let rows = parse_batch(&raw).context("parsing batch file")?;

      let options = IngestOptions { prune, media_root: cfg.media_root.clone() };
      let report = ingest(&store, &source, rows, &options)
        .await
        .map_err(anyhow::Error::new)?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }

    Command::Query { status, tags, min_rating, limit, offset } => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let query = RecordQuery {
        status: status.as_deref().map(parse_status).transpose()?,
        tags,
        min_rating,
        limit: Some(limit),
        offset: Some(offset),
        ..RecordQuery::default()
      };
      let page = store
        .query_records(&source, &query)
        .await
        .map_err(anyhow::Error::new)?;
      println!("{}", serde_json::to_string_pretty(&page)?);
      Ok(())
    }

    Command::Search { text, limit, offset } => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let page = store
        .search(&source, &text, limit, offset)
        .await
        .map_err(anyhow::Error::new)?;
      println!("{}", serde_json::to_string_pretty(&page)?);
      Ok(())
    }

    Command::Set {
      id,
      rating,
      clear_rating,
      status,
      tags,
      notes,
      clear_notes,
    } => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let patch = OverlayPatch {
        rating,
        clear_rating,
        status: status.as_deref().map(parse_status).transpose()?,
        tags: (!tags.is_empty()).then_some(tags),
        notes,
        clear_notes,
        extra: None,
      };
      let overlay = store
        .update_overlay(&source, &id, patch)
        .await
        .map_err(anyhow::Error::new)?;
      println!("{}", serde_json::to_string_pretty(&overlay)?);
      Ok(())
    }

    Command::Sync => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let report = synchronizer(cfg).sync_source(&store, &source).await?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }

    Command::Consolidate { legacy_dirs } => {
      let report = synchronizer(cfg).consolidate(&legacy_dirs)?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }

    Command::Reset { mode, force } => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let mode = match mode {
        ResetModeArg::Soft => ResetMode::Soft,
        ResetModeArg::Hard => ResetMode::Hard,
      };
      let report = synchronizer(cfg)
        .reset(&store, &source, mode, force)
        .await?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }

    Command::Archive => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let live: BTreeSet<String> = store
        .list_ids(&source)
        .await
        .map_err(anyhow::Error::new)?
        .into_iter()
        .collect();
      let report = synchronizer(cfg).archive_stale(&source, &live)?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }

    Command::Audit { a, b } => {
      let a = SourceId::parse(&a)?;
      let b = SourceId::parse(&b)?;
      let ids_a = store.list_ids(&a).await.map_err(anyhow::Error::new)?;
      let ids_b = store.list_ids(&b).await.map_err(anyhow::Error::new)?;
      let report = overlap(ids_a, ids_b);
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }

    Command::Truncate { confirm } => {
      let source = resolve_scope(&store, cfg, source_flag).await?;
      let deleted = store
        .truncate(&source, confirm)
        .await
        .map_err(anyhow::Error::new)?;
      println!("deleted {deleted} records from {source}");
      Ok(())
    }
  }
}

// ─── Serve ────────────────────────────────────────────────────────────────────

async fn serve<S>(store: S, cfg: &AppConfig) -> Result<()>
where
  S: RecordStore + 'static,
{
  let policy = ScopePolicy { require_explicit: cfg.require_explicit_source };
  let app = axum::Router::new()
    .nest("/api", clipvault_api::api_router(Arc::new(store), policy))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  tracing::info!("listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

// ─── Source registry ──────────────────────────────────────────────────────────

async fn sources<S>(store: &S, command: SourcesCommand) -> Result<()>
where
  S: RecordStore,
{
  match command {
    SourcesCommand::Register { id, label } => {
      let source_id = SourceId::parse(&id)?;
      let label = label.unwrap_or_else(|| id.clone());
      let source = store
        .register_source(source_id, label)
        .await
        .map_err(anyhow::Error::new)?;
      println!(
        "registered {} -> {}{}",
        source.source_id,
        source.schema_name,
        if source.is_default { " (default)" } else { "" }
      );
      Ok(())
    }
    SourcesCommand::List => {
      for source in store.list_sources().await.map_err(anyhow::Error::new)? {
        println!(
          "{} {}\t{}\t{}",
          if source.is_default { "*" } else { " " },
          source.source_id,
          source.schema_name,
          source.label,
        );
      }
      Ok(())
    }
    SourcesCommand::SetDefault { id } => {
      let source_id = SourceId::parse(&id)?;
      store
        .set_default_source(&source_id)
        .await
        .map_err(anyhow::Error::new)?;
      println!("default source is now {source_id}");
      Ok(())
    }
    SourcesCommand::Remove { id } => {
      let source_id = SourceId::parse(&id)?;
      store
        .remove_source(&source_id)
        .await
        .map_err(anyhow::Error::new)?;
      println!("removed {source_id}");
      Ok(())
    }
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn resolve_scope<S>(
  store: &S,
  cfg: &AppConfig,
  source_flag: Option<String>,
) -> Result<SourceId>
where
  S: RecordStore,
{
  let sources = store.list_sources().await.map_err(anyhow::Error::new)?;
  let hints = ScopeHints { source: source_flag, profile: cfg.profile };
  let policy = ScopePolicy { require_explicit: cfg.require_explicit_source };
  Ok(resolve(&sources, &hints, &policy)?.source_id.clone())
}

fn synchronizer(cfg: &AppConfig) -> Synchronizer {
  Synchronizer::new(&cfg.notes_dir, &cfg.archive_dir, cfg.dirty)
}

/// A batch file is either one JSON array or JSON-lines, one row per line.
fn parse_batch(raw: &str) -> Result<Vec<serde_json::Value>> {
  if raw.trim_start().starts_with('[') {
    return Ok(serde_json::from_str(raw)?);
  }
  raw
    .lines()
    .filter(|line| !line.trim().is_empty())
    .map(|line| Ok(serde_json::from_str(line)?))
    .collect()
}

fn parse_status(s: &str) -> Result<WorkflowStatus> {
  match s {
    "raw" => Ok(WorkflowStatus::Raw),
    "reviewing" => Ok(WorkflowStatus::Reviewing),
    "reviewed" => Ok(WorkflowStatus::Reviewed),
    "scheduling" => Ok(WorkflowStatus::Scheduling),
    "scheduled" => Ok(WorkflowStatus::Scheduled),
    "published" => Ok(WorkflowStatus::Published),
    "archived" => Ok(WorkflowStatus::Archived),
    other => anyhow::bail!("unknown workflow status {other:?}"),
  }
}
