//! [`SqliteStore`] — the embedded implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use clipvault_core::{
  ident::SourceId,
  record::{Overlay, OverlayPatch, Record, SourceFields},
  source::Source,
  store::{Page, RecordOrder, RecordQuery, RecordStore, UpsertOutcome},
};

use crate::{
  Error, Result,
  encode::{RawRecord, RawSource, encode_dt, encode_extra, encode_tags},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A clipvault record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All writes
/// for one process funnel through the single connection, which serialises
/// per-tenant mutations without any further locking.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Outcome codes for the transactional source-removal check.
enum RemoveOutcome {
  Removed,
  NotFound,
  IsDefault,
  HasRecords(usize),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing and as the mirror cache.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Mirror support ────────────────────────────────────────────────────────

  /// Replace the source registry with a remote snapshot, verbatim. Sources
  /// absent from the snapshot are dropped along with their cached records.
  pub async fn replace_sources(&self, sources: Vec<Source>) -> Result<()> {
    let raws: Vec<RawSource> =
      sources.iter().map(RawSource::from_source).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Vec<String> = {
          let mut stmt = tx.prepare("SELECT source_id FROM sources")?;
          let rows = stmt.query_map([], |r| r.get(0))?;
          rows.collect::<rusqlite::Result<_>>()?
        };
        for gone in existing
          .iter()
          .filter(|s| !raws.iter().any(|r| &r.source_id == *s))
        {
          tx.execute(
            "DELETE FROM records_fts WHERE source_id = ?1",
            rusqlite::params![gone],
          )?;
          tx.execute(
            "DELETE FROM records WHERE source_id = ?1",
            rusqlite::params![gone],
          )?;
          tx.execute(
            "DELETE FROM sources WHERE source_id = ?1",
            rusqlite::params![gone],
          )?;
        }

        for raw in raws {
          tx.execute(
            "INSERT INTO sources (
               source_id, schema_name, label, is_default, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(source_id) DO UPDATE SET
               schema_name = ?2, label = ?3, is_default = ?4, created_at = ?5",
            rusqlite::params![
              raw.source_id,
              raw.schema_name,
              raw.label,
              raw.is_default,
              raw.created_at,
            ],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Replace every cached row for one source with a remote snapshot,
  /// overlays and timestamps included. The source row itself is upserted in
  /// the same transaction so the records satisfy the registry reference.
  pub async fn replace_records(
    &self,
    source: &Source,
    records: Vec<Record>,
  ) -> Result<()> {
    let raw_src = RawSource::from_source(source);
    let raws = records
      .iter()
      .map(RawRecord::from_record)
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO sources (
             source_id, schema_name, label, is_default, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(source_id) DO UPDATE SET
             schema_name = ?2, label = ?3, is_default = ?4, created_at = ?5",
          rusqlite::params![
            raw_src.source_id,
            raw_src.schema_name,
            raw_src.label,
            raw_src.is_default,
            raw_src.created_at,
          ],
        )?;
        tx.execute(
          "DELETE FROM records_fts WHERE source_id = ?1",
          rusqlite::params![raw_src.source_id],
        )?;
        tx.execute(
          "DELETE FROM records WHERE source_id = ?1",
          rusqlite::params![raw_src.source_id],
        )?;

        for raw in raws {
          tx.execute(
            "INSERT INTO records (
               source_id, id, caption, author_handle, author_name,
               posted_at, duration_secs, media_path, fingerprint,
               first_seen_at, last_ingested_at, rating, status, tags,
               notes, extra
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?16)",
            rusqlite::params![
              raw.source_id,
              raw.id,
              raw.caption,
              raw.author_handle,
              raw.author_name,
              raw.posted_at,
              raw.duration_secs,
              raw.media_path,
              raw.fingerprint,
              raw.first_seen_at,
              raw.last_ingested_at,
              raw.rating,
              raw.status,
              raw.tags,
              raw.notes,
              raw.extra,
            ],
          )?;
          tx.execute(
            "INSERT INTO records_fts (
               source_id, id, caption, author_handle, author_name
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              raw.source_id,
              raw.id,
              raw.caption,
              raw.author_handle,
              raw.author_name,
            ],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Query assembly ──────────────────────────────────────────────────────────

fn order_clause(order: RecordOrder) -> &'static str {
  match order {
    RecordOrder::PostedDesc => {
      "ORDER BY posted_at IS NULL, posted_at DESC, id ASC"
    }
    RecordOrder::PostedAsc => {
      "ORDER BY posted_at IS NULL, posted_at ASC, id ASC"
    }
    RecordOrder::IdAsc => "ORDER BY id ASC",
  }
}

/// Build the WHERE conditions and positional params for a [`RecordQuery`].
/// The leading condition is always the tenant scope.
fn query_conditions(
  source_id: &SourceId,
  query: &RecordQuery,
) -> (Vec<String>, Vec<rusqlite::types::Value>) {
  let mut conds: Vec<String> = vec!["source_id = ?".into()];
  let mut params: Vec<rusqlite::types::Value> =
    vec![source_id.as_str().to_owned().into()];

  if let Some(status) = query.status {
    conds.push("status = ?".into());
    params.push(status.as_str().to_owned().into());
  }
  if let Some(min) = query.min_rating {
    conds.push("rating >= ?".into());
    params.push(i64::from(min).into());
  }
  if let Some(after) = query.posted_after {
    conds.push("posted_at >= ?".into());
    params.push(encode_dt(after).into());
  }
  if let Some(before) = query.posted_before {
    conds.push("posted_at <= ?".into());
    params.push(encode_dt(before).into());
  }
  for tag in &query.tags {
    // Tags are stored as a JSON array; match the quoted element. LIKE
    // metacharacters inside the tag must match literally, not as wildcards.
    conds.push("tags LIKE ? ESCAPE '\\'".into());
    let quoted = serde_json::Value::from(tag.clone())
      .to_string()
      .replace('\\', "\\\\")
      .replace('%', "\\%")
      .replace('_', "\\_");
    params.push(format!("%{quoted}%").into());
  }

  (conds, params)
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Source registry ───────────────────────────────────────────────────────

  async fn register_source(
    &self,
    source_id: SourceId,
    label: String,
  ) -> Result<Source> {
    let schema_name = source_id.default_schema_name().map_err(Error::Core)?;
    let id_str     = source_id.as_str().to_owned();
    let schema_str = schema_name.as_str().to_owned();
    let at_str     = encode_dt(Utc::now());

    let raw: RawSource = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<RawSource> = tx
          .query_row(
            &format!(
              "SELECT {} FROM sources WHERE source_id = ?1",
              RawSource::COLUMNS
            ),
            rusqlite::params![id_str],
            RawSource::from_row,
          )
          .optional()?;

        let raw = if let Some(mut existing) = existing {
          tx.execute(
            "UPDATE sources SET label = ?2 WHERE source_id = ?1",
            rusqlite::params![id_str, label],
          )?;
          existing.label = label;
          existing
        } else {
          // The first source ever registered becomes the default.
          let count: i64 =
            tx.query_row("SELECT COUNT(*) FROM sources", [], |r| r.get(0))?;
          let is_default = count == 0;
          tx.execute(
            "INSERT INTO sources (source_id, schema_name, label, is_default, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id_str, schema_str, label, is_default, at_str],
          )?;
          RawSource {
            source_id:   id_str,
            schema_name: schema_str,
            label,
            is_default,
            created_at:  at_str,
          }
        };

        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_source()
  }

  async fn get_source(&self, source_id: &SourceId) -> Result<Option<Source>> {
    let id_str = source_id.as_str().to_owned();

    let raw: Option<RawSource> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM sources WHERE source_id = ?1",
                RawSource::COLUMNS
              ),
              rusqlite::params![id_str],
              RawSource::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSource::into_source).transpose()
  }

  async fn list_sources(&self) -> Result<Vec<Source>> {
    let raws: Vec<RawSource> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM sources ORDER BY source_id",
          RawSource::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawSource::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSource::into_source).collect()
  }

  async fn set_default_source(&self, source_id: &SourceId) -> Result<()> {
    let id_str = source_id.as_str().to_owned();

    let updated: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("UPDATE sources SET is_default = 0 WHERE is_default = 1", [])?;
        let n = tx.execute(
          "UPDATE sources SET is_default = 1 WHERE source_id = ?1",
          rusqlite::params![id_str],
        )?;
        if n == 1 {
          tx.commit()?;
        }
        // n == 0 drops the transaction, rolling back the cleared default.
        Ok(n)
      })
      .await?;

    if updated == 0 {
      return Err(Error::Core(clipvault_core::Error::UnknownSource(
        source_id.to_string(),
      )));
    }
    Ok(())
  }

  async fn remove_source(&self, source_id: &SourceId) -> Result<()> {
    let id_str = source_id.as_str().to_owned();

    let outcome: RemoveOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let is_default: Option<bool> = tx
          .query_row(
            "SELECT is_default FROM sources WHERE source_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let outcome = match is_default {
          None => RemoveOutcome::NotFound,
          Some(true) => RemoveOutcome::IsDefault,
          Some(false) => {
            let count: i64 = tx.query_row(
              "SELECT COUNT(*) FROM records WHERE source_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )?;
            if count > 0 {
              RemoveOutcome::HasRecords(count as usize)
            } else {
              tx.execute(
                "DELETE FROM sources WHERE source_id = ?1",
                rusqlite::params![id_str],
              )?;
              tx.commit()?;
              RemoveOutcome::Removed
            }
          }
        };

        Ok(outcome)
      })
      .await?;

    match outcome {
      RemoveOutcome::Removed => Ok(()),
      RemoveOutcome::NotFound => Err(Error::Core(
        clipvault_core::Error::UnknownSource(source_id.to_string()),
      )),
      RemoveOutcome::IsDefault => {
        Err(Error::Core(clipvault_core::Error::Conflict(format!(
          "source {source_id} is the default; set another default first"
        ))))
      }
      RemoveOutcome::HasRecords(n) => {
        Err(Error::Core(clipvault_core::Error::Conflict(format!(
          "source {source_id} still holds {n} records"
        ))))
      }
    }
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn get_record(
    &self,
    source_id: &SourceId,
    id: &str,
  ) -> Result<Option<Record>> {
    let src_str = source_id.as_str().to_owned();
    let id_str  = id.to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM records WHERE source_id = ?1 AND id = ?2",
                RawRecord::COLUMNS
              ),
              rusqlite::params![src_str, id_str],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn upsert_record(
    &self,
    source_id: &SourceId,
    id: &str,
    fields: SourceFields,
    fingerprint: String,
  ) -> Result<UpsertOutcome> {
    let src_str   = source_id.as_str().to_owned();
    let id_str    = id.to_owned();
    let now_str   = encode_dt(Utc::now());
    let posted_at = fields.posted_at.map(encode_dt);

    let outcome: UpsertOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
          .query_row(
            "SELECT fingerprint FROM records WHERE source_id = ?1 AND id = ?2",
            rusqlite::params![src_str, id_str],
            |r| r.get(0),
          )
          .optional()?;

        let outcome = match existing {
          None => {
            tx.execute(
              "INSERT INTO records (
                 source_id, id, caption, author_handle, author_name,
                 posted_at, duration_secs, media_path, fingerprint,
                 first_seen_at, last_ingested_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
              rusqlite::params![
                src_str,
                id_str,
                fields.caption,
                fields.author_handle,
                fields.author_name,
                posted_at,
                fields.duration_secs,
                fields.media_path,
                fingerprint,
                now_str,
              ],
            )?;
            tx.execute(
              "INSERT INTO records_fts (source_id, id, caption, author_handle, author_name)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![
                src_str,
                id_str,
                fields.caption,
                fields.author_handle,
                fields.author_name,
              ],
            )?;
            UpsertOutcome::Created
          }
          Some(stored) if stored == fingerprint => UpsertOutcome::Skipped,
          Some(_) => {
            // Source-owned columns only; the overlay is never written here.
            tx.execute(
              "UPDATE records SET
                 caption = ?3, author_handle = ?4, author_name = ?5,
                 posted_at = ?6, duration_secs = ?7, media_path = ?8,
                 fingerprint = ?9, last_ingested_at = ?10
               WHERE source_id = ?1 AND id = ?2",
              rusqlite::params![
                src_str,
                id_str,
                fields.caption,
                fields.author_handle,
                fields.author_name,
                posted_at,
                fields.duration_secs,
                fields.media_path,
                fingerprint,
                now_str,
              ],
            )?;
            tx.execute(
              "DELETE FROM records_fts WHERE source_id = ?1 AND id = ?2",
              rusqlite::params![src_str, id_str],
            )?;
            tx.execute(
              "INSERT INTO records_fts (source_id, id, caption, author_handle, author_name)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![
                src_str,
                id_str,
                fields.caption,
                fields.author_handle,
                fields.author_name,
              ],
            )?;
            UpsertOutcome::Updated
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }

  async fn update_overlay(
    &self,
    source_id: &SourceId,
    id: &str,
    patch: OverlayPatch,
  ) -> Result<Overlay> {
    let record =
      self
        .get_record(source_id, id)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
          source: source_id.to_string(),
          id:     id.to_owned(),
        })?;

    let mut overlay = record.overlay;
    patch.apply(&mut overlay);

    let src_str   = source_id.as_str().to_owned();
    let id_str    = id.to_owned();
    let rating    = overlay.rating.map(i64::from);
    let status    = overlay.status.as_str().to_owned();
    let tags_str  = encode_tags(&overlay.tags)?;
    let notes     = overlay.notes.clone();
    let extra_str = encode_extra(&overlay.extra)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE records SET
             rating = ?3, status = ?4, tags = ?5, notes = ?6, extra = ?7
           WHERE source_id = ?1 AND id = ?2",
          rusqlite::params![
            src_str, id_str, rating, status, tags_str, notes, extra_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(overlay)
  }

  async fn query_records(
    &self,
    source_id: &SourceId,
    query: &RecordQuery,
  ) -> Result<Page<Record>> {
    let (conds, params) = query_conditions(source_id, query);
    let where_clause = conds.join(" AND ");
    let order = order_clause(query.order);
    let limit = query.limit.unwrap_or(100);
    let offset = query.offset.unwrap_or(0);

    let (total, raws): (usize, Vec<RawRecord>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM records WHERE {where_clause}"),
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let mut page_params = params;
        page_params.push((limit as i64).into());
        page_params.push((offset as i64).into());

        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM records WHERE {where_clause} {order} LIMIT ? OFFSET ?",
          RawRecord::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(page_params.iter()), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total as usize, rows))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawRecord::into_record)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, total, limit, offset })
  }

  async fn search(
    &self,
    source_id: &SourceId,
    text: &str,
    limit: usize,
    offset: usize,
  ) -> Result<Page<Record>> {
    let src_str  = source_id.as_str().to_owned();
    let text_str = text.to_owned();

    let (total, raws): (usize, Vec<RawRecord>) = self
      .conn
      .call(move |conn| {
        // Primary index path. Falls back when the index holds no rows for
        // this source or rejects the query syntax.
        let indexed: i64 = conn.query_row(
          "SELECT COUNT(*) FROM records_fts WHERE source_id = ?1",
          rusqlite::params![src_str],
          |r| r.get(0),
        )?;

        if indexed > 0
          && let Ok(found) =
            fts_search(conn, &src_str, &text_str, limit, offset)
        {
          return Ok(found);
        }

        Ok(like_search(conn, &src_str, &text_str, limit, offset)?)
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawRecord::into_record)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, total, limit, offset })
  }

  async fn delete_record(&self, source_id: &SourceId, id: &str) -> Result<bool> {
    let src_str = source_id.as_str().to_owned();
    let id_str  = id.to_owned();

    let deleted: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM records_fts WHERE source_id = ?1 AND id = ?2",
          rusqlite::params![src_str, id_str],
        )?;
        let n = tx.execute(
          "DELETE FROM records WHERE source_id = ?1 AND id = ?2",
          rusqlite::params![src_str, id_str],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn list_ids(&self, source_id: &SourceId) -> Result<Vec<String>> {
    let src_str = source_id.as_str().to_owned();

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id FROM records WHERE source_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![src_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids)
  }

  async fn count_records(&self, source_id: &SourceId) -> Result<usize> {
    let src_str = source_id.as_str().to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM records WHERE source_id = ?1",
          rusqlite::params![src_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count as usize)
  }

  // ── Destructive / maintenance ─────────────────────────────────────────────

  async fn truncate(&self, source_id: &SourceId, confirm: bool) -> Result<usize> {
    if !confirm {
      return Err(Error::Core(clipvault_core::Error::Conflict(format!(
        "truncate of {source_id} requires explicit confirmation"
      ))));
    }

    let src_str = source_id.as_str().to_owned();

    let deleted: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM records_fts WHERE source_id = ?1",
          rusqlite::params![src_str],
        )?;
        let n = tx.execute(
          "DELETE FROM records WHERE source_id = ?1",
          rusqlite::params![src_str],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    Ok(deleted)
  }

  async fn rebuild_search_index(&self, source_id: &SourceId) -> Result<()> {
    let src_str = source_id.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM records_fts WHERE source_id = ?1",
          rusqlite::params![src_str],
        )?;
        tx.execute(
          "INSERT INTO records_fts (source_id, id, caption, author_handle, author_name)
           SELECT source_id, id, caption, author_handle, author_name
           FROM records WHERE source_id = ?1",
          rusqlite::params![src_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}

// ─── Search helpers ──────────────────────────────────────────────────────────

/// FTS5 MATCH search. Any failure (most commonly rejected query syntax) is
/// surfaced so the caller can fall back deterministically.
fn fts_search(
  conn: &rusqlite::Connection,
  source_id: &str,
  text: &str,
  limit: usize,
  offset: usize,
) -> rusqlite::Result<(usize, Vec<RawRecord>)> {
  let total: i64 = conn.query_row(
    "SELECT COUNT(*) FROM records_fts
     WHERE records_fts MATCH ?2 AND source_id = ?1",
    rusqlite::params![source_id, text],
    |r| r.get(0),
  )?;

  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM records r
     JOIN records_fts ON records_fts.source_id = r.source_id
                     AND records_fts.id = r.id
     WHERE records_fts MATCH ?2 AND r.source_id = ?1
     ORDER BY records_fts.rank, r.id
     LIMIT ?3 OFFSET ?4",
    RawRecord::COLUMNS
      .split(", ")
      .map(|c| format!("r.{c}"))
      .collect::<Vec<_>>()
      .join(", ")
  ))?;

  let rows = stmt
    .query_map(
      rusqlite::params![source_id, text, limit as i64, offset as i64],
      RawRecord::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok((total as usize, rows))
}

/// Substring fallback over caption, author fields, and id.
fn like_search(
  conn: &rusqlite::Connection,
  source_id: &str,
  text: &str,
  limit: usize,
  offset: usize,
) -> rusqlite::Result<(usize, Vec<RawRecord>)> {
  let pattern = format!("%{text}%");
  let filter = "source_id = ?1 AND (
       caption LIKE ?2 OR author_handle LIKE ?2
       OR author_name LIKE ?2 OR id LIKE ?2
     )";

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM records WHERE {filter}"),
    rusqlite::params![source_id, pattern],
    |r| r.get(0),
  )?;

  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM records WHERE {filter}
     ORDER BY posted_at IS NULL, posted_at DESC, id ASC
     LIMIT ?3 OFFSET ?4",
    RawRecord::COLUMNS
  ))?;

  let rows = stmt
    .query_map(
      rusqlite::params![source_id, pattern, limit as i64, offset as i64],
      RawRecord::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok((total as usize, rows))
}
