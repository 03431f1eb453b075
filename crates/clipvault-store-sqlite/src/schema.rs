//! SQL schema for the clipvault SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The source registry: the only authority for the source -> schema mapping.
CREATE TABLE IF NOT EXISTS sources (
    source_id   TEXT PRIMARY KEY,
    schema_name TEXT NOT NULL UNIQUE,
    label       TEXT NOT NULL,
    is_default  INTEGER NOT NULL DEFAULT 0,  -- at most one row holds 1
    created_at  TEXT NOT NULL                -- ISO 8601 UTC
);

-- One row per ingested record. Source-owned columns are replaced wholesale
-- by ingestion; overlay columns are written only by explicit overlay edits.
CREATE TABLE IF NOT EXISTS records (
    source_id        TEXT NOT NULL REFERENCES sources(source_id),
    id               TEXT NOT NULL,
    -- source-owned
    caption          TEXT,
    author_handle    TEXT,
    author_name      TEXT,
    posted_at        TEXT,
    duration_secs    INTEGER,
    media_path       TEXT,
    fingerprint      TEXT NOT NULL,
    first_seen_at    TEXT NOT NULL,
    last_ingested_at TEXT NOT NULL,
    -- overlay
    rating           INTEGER,
    status           TEXT NOT NULL DEFAULT 'raw',
    tags             TEXT NOT NULL DEFAULT '[]',
    notes            TEXT,
    extra            TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (source_id, id)
);

CREATE INDEX IF NOT EXISTS records_posted_idx ON records(source_id, posted_at);
CREATE INDEX IF NOT EXISTS records_status_idx ON records(source_id, status);

-- Search index over the text-bearing source-owned columns. Maintained
-- manually on upsert/delete/truncate; rebuildable per source.
CREATE VIRTUAL TABLE IF NOT EXISTS records_fts USING fts5(
    source_id UNINDEXED,
    id        UNINDEXED,
    caption,
    author_handle,
    author_name
);

PRAGMA user_version = 1;
";
