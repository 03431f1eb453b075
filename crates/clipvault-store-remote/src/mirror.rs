//! [`MirrorStore`] — a remote store fronted by a TTL-bounded SQLite cache.
//!
//! Reads are served from the local cache, which is refreshed from the remote
//! once its snapshot is older than the TTL. A failed refresh degrades to the
//! stale snapshot instead of failing the read; only a cache that has never
//! been filled propagates the remote error. Writes always go to the remote
//! and invalidate the affected snapshot.

use std::{
  collections::HashMap,
  time::{Duration, Instant},
};

use tokio::sync::Mutex;

use clipvault_core::{
  ident::SourceId,
  record::{Overlay, OverlayPatch, Record, SourceFields},
  source::Source,
  store::{Page, RecordOrder, RecordQuery, RecordStore, UpsertOutcome},
};
use clipvault_store_sqlite::SqliteStore;

use crate::{Error, RemoteStore, Result};

/// Default cache lifetime before a snapshot is considered stale.
pub const DEFAULT_TTL_SECS: u64 = 120;

/// Snapshot key for the source registry. Starts with a NUL byte, which no
/// valid source id can contain, so it never collides with a records key.
const SOURCES_KEY: &str = "\u{0}sources";

/// Page size used when pulling a source's records from the remote.
const PAGE_SIZE: usize = 500;

fn is_fresh(map: &HashMap<String, Instant>, key: &str, ttl: Duration) -> bool {
  map.get(key).is_some_and(|at| at.elapsed() < ttl)
}

/// A [`RemoteStore`] fronted by a local SQLite cache with per-source TTLs.
pub struct MirrorStore {
  remote:    RemoteStore,
  cache:     SqliteStore,
  ttl:       Duration,
  /// When each snapshot (per-source records, or the registry under
  /// [`SOURCES_KEY`]) was last pulled. Held across a refresh so concurrent
  /// readers of the same stale snapshot trigger exactly one pull.
  refreshed: Mutex<HashMap<String, Instant>>,
}

impl MirrorStore {
  pub fn new(remote: RemoteStore, cache: SqliteStore, ttl: Duration) -> Self {
    Self { remote, cache, ttl, refreshed: Mutex::new(HashMap::new()) }
  }

  // ── Refresh machinery ─────────────────────────────────────────────────────

  async fn ensure_sources_fresh(&self) -> Result<()> {
    let mut refreshed = self.refreshed.lock().await;
    if is_fresh(&refreshed, SOURCES_KEY, self.ttl) {
      return Ok(());
    }
    match self.remote.list_sources().await {
      Ok(sources) => {
        self.cache.replace_sources(sources).await?;
        refreshed.insert(SOURCES_KEY.to_owned(), Instant::now());
        Ok(())
      }
      Err(err) if refreshed.contains_key(SOURCES_KEY) => {
        tracing::warn!(%err, "source refresh failed, serving stale registry");
        Ok(())
      }
      Err(err) => Err(err),
    }
  }

  async fn ensure_records_fresh(&self, source_id: &SourceId) -> Result<()> {
    let key = source_id.as_str();
    let mut refreshed = self.refreshed.lock().await;
    if is_fresh(&refreshed, key, self.ttl) {
      return Ok(());
    }
    match self.refresh_records(source_id).await {
      Ok(()) => {
        refreshed.insert(key.to_owned(), Instant::now());
        Ok(())
      }
      Err(err) if refreshed.contains_key(key) => {
        tracing::warn!(
          source = key,
          %err,
          "record refresh failed, serving stale snapshot"
        );
        Ok(())
      }
      Err(err) => Err(err),
    }
  }

  /// Pull the full partition for one source and swap it into the cache.
  async fn refresh_records(&self, source_id: &SourceId) -> Result<()> {
    let Some(source) = self.remote.get_source(source_id).await? else {
      // Unknown on the remote: resync the registry, which also drops any
      // partition cached for the vanished source.
      let sources = self.remote.list_sources().await?;
      self.cache.replace_sources(sources).await?;
      return Ok(());
    };

    let mut records = Vec::new();
    let mut offset = 0;
    loop {
      let query = RecordQuery {
        order: RecordOrder::IdAsc,
        limit: Some(PAGE_SIZE),
        offset: Some(offset),
        ..RecordQuery::default()
      };
      let page = self.remote.query_records(source_id, &query).await?;
      let fetched = page.items.len();
      records.extend(page.items);
      offset += fetched;
      if fetched < PAGE_SIZE || offset >= page.total {
        break;
      }
    }

    Ok(self.cache.replace_records(&source, records).await?)
  }

  async fn invalidate(&self, key: &str) {
    self.refreshed.lock().await.remove(key);
  }
}

impl RecordStore for MirrorStore {
  type Error = Error;

  // ── Source registry ───────────────────────────────────────────────────────

  async fn register_source(
    &self,
    source_id: SourceId,
    label: String,
  ) -> Result<Source> {
    let source = self.remote.register_source(source_id, label).await?;
    self.invalidate(SOURCES_KEY).await;
    Ok(source)
  }

  async fn get_source(&self, source_id: &SourceId) -> Result<Option<Source>> {
    self.ensure_sources_fresh().await?;
    Ok(self.cache.get_source(source_id).await?)
  }

  async fn list_sources(&self) -> Result<Vec<Source>> {
    self.ensure_sources_fresh().await?;
    Ok(self.cache.list_sources().await?)
  }

  async fn set_default_source(&self, source_id: &SourceId) -> Result<()> {
    self.remote.set_default_source(source_id).await?;
    self.invalidate(SOURCES_KEY).await;
    Ok(())
  }

  async fn remove_source(&self, source_id: &SourceId) -> Result<()> {
    self.remote.remove_source(source_id).await?;
    self.invalidate(SOURCES_KEY).await;
    self.invalidate(source_id.as_str()).await;
    Ok(())
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn get_record(
    &self,
    source_id: &SourceId,
    id: &str,
  ) -> Result<Option<Record>> {
    self.ensure_records_fresh(source_id).await?;
    Ok(self.cache.get_record(source_id, id).await?)
  }

  async fn upsert_record(
    &self,
    source_id: &SourceId,
    id: &str,
    fields: SourceFields,
    fingerprint: String,
  ) -> Result<UpsertOutcome> {
    let outcome = self
      .remote
      .upsert_record(source_id, id, fields, fingerprint)
      .await?;
    self.invalidate(source_id.as_str()).await;
    Ok(outcome)
  }

  async fn update_overlay(
    &self,
    source_id: &SourceId,
    id: &str,
    patch: OverlayPatch,
  ) -> Result<Overlay> {
    let overlay = self.remote.update_overlay(source_id, id, patch).await?;
    self.invalidate(source_id.as_str()).await;
    Ok(overlay)
  }

  async fn query_records(
    &self,
    source_id: &SourceId,
    query: &RecordQuery,
  ) -> Result<Page<Record>> {
    self.ensure_records_fresh(source_id).await?;
    Ok(self.cache.query_records(source_id, query).await?)
  }

  async fn search(
    &self,
    source_id: &SourceId,
    text: &str,
    limit: usize,
    offset: usize,
  ) -> Result<Page<Record>> {
    self.ensure_records_fresh(source_id).await?;
    Ok(self.cache.search(source_id, text, limit, offset).await?)
  }

  async fn delete_record(&self, source_id: &SourceId, id: &str) -> Result<bool> {
    let deleted = self.remote.delete_record(source_id, id).await?;
    self.invalidate(source_id.as_str()).await;
    Ok(deleted)
  }

  async fn list_ids(&self, source_id: &SourceId) -> Result<Vec<String>> {
    self.ensure_records_fresh(source_id).await?;
    Ok(self.cache.list_ids(source_id).await?)
  }

  async fn count_records(&self, source_id: &SourceId) -> Result<usize> {
    self.ensure_records_fresh(source_id).await?;
    Ok(self.cache.count_records(source_id).await?)
  }

  // ── Destructive / maintenance ─────────────────────────────────────────────

  async fn truncate(&self, source_id: &SourceId, confirm: bool) -> Result<usize> {
    let deleted = self.remote.truncate(source_id, confirm).await?;
    self.invalidate(source_id.as_str()).await;
    Ok(deleted)
  }

  async fn rebuild_search_index(&self, source_id: &SourceId) -> Result<()> {
    self.remote.rebuild_search_index(source_id).await?;
    self.invalidate(source_id.as_str()).await;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn freshness_respects_ttl() {
    let ttl = Duration::from_secs(120);
    let mut map = HashMap::new();
    assert!(!is_fresh(&map, "clips", ttl));

    map.insert("clips".to_owned(), Instant::now());
    assert!(is_fresh(&map, "clips", ttl));
    assert!(!is_fresh(&map, "other", ttl));

    if let Some(stale) = Instant::now().checked_sub(Duration::from_secs(121)) {
      map.insert("clips".to_owned(), stale);
      assert!(!is_fresh(&map, "clips", ttl));
    }
  }
}
