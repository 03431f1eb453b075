//! Integration tests for the ingestion pipeline and document synchronizer,
//! run against an in-memory SQLite store and temp directories.

use std::{collections::BTreeSet, fs, path::PathBuf, time::Duration};

use serde_json::json;

use clipvault_core::{
  ident::SourceId,
  record::{OverlayPatch, WorkflowStatus},
  store::RecordStore,
};
use clipvault_notes::DirtyPolicy;
use clipvault_store_sqlite::SqliteStore;

use crate::{
  ingest::{IngestOptions, ingest},
  sync::{ResetMode, SyncOutcome, Synchronizer},
};

async fn store_with(source: &str) -> (SqliteStore, SourceId) {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let id = SourceId::parse(source).unwrap();
  store
    .register_source(id.clone(), source.to_owned())
    .await
    .unwrap();
  (store, id)
}

fn synchronizer(root: &tempfile::TempDir) -> Synchronizer {
  Synchronizer::new(
    root.path().join("notes"),
    root.path().join("archive"),
    DirtyPolicy::default(),
  )
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_twice_is_idempotent() {
  let (store, t1) = store_with("t1").await;
  let rows = vec![json!({"id": "v1", "caption": "A"})];

  let first = ingest(&store, &t1, rows.clone(), &IngestOptions::default())
    .await
    .unwrap();
  assert_eq!(first.created, 1);
  assert_eq!(first.updated, 0);
  assert_eq!(first.skipped, 0);

  let second = ingest(&store, &t1, rows, &IngestOptions::default())
    .await
    .unwrap();
  assert_eq!(second.created, 0);
  assert_eq!(second.updated, 0);
  assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn reingest_updates_fields_but_not_overlay() {
  let (store, t1) = store_with("t1").await;
  ingest(
    &store,
    &t1,
    vec![json!({"id": "v1", "caption": "A"})],
    &IngestOptions::default(),
  )
  .await
  .unwrap();

  store
    .update_overlay(&t1, "v1", OverlayPatch {
      status: Some(WorkflowStatus::Reviewed),
      ..Default::default()
    })
    .await
    .unwrap();

  let report = ingest(
    &store,
    &t1,
    vec![json!({"id": "v1", "caption": "B"})],
    &IngestOptions::default(),
  )
  .await
  .unwrap();
  assert_eq!(report.updated, 1);

  let rec = store.get_record(&t1, "v1").await.unwrap().unwrap();
  assert_eq!(rec.fields.caption.as_deref(), Some("B"));
  assert_eq!(rec.overlay.status, WorkflowStatus::Reviewed);
}

#[tokio::test]
async fn malformed_rows_never_abort_the_batch() {
  let (store, t1) = store_with("t1").await;
  let rows = vec![
    json!({"caption": "no id at all"}),
    json!({"id": "../escape", "caption": "bad id"}),
    json!({"id": "v1", "caption": "good row"}),
    json!("not even an object"),
  ];

  let report = ingest(&store, &t1, rows, &IngestOptions::default())
    .await
    .unwrap();
  assert_eq!(report.created, 1);
  assert_eq!(report.failures.len(), 3);
  assert!(store.get_record(&t1, "v1").await.unwrap().is_some());
}

#[tokio::test]
async fn prune_is_opt_in_and_tenant_scoped() {
  let (store, t1) = store_with("t1").await;
  let t2 = SourceId::parse("t2").unwrap();
  store.register_source(t2.clone(), "T2".into()).await.unwrap();

  let both = vec![
    json!({"id": "v1", "caption": "one"}),
    json!({"id": "v2", "caption": "two"}),
  ];
  ingest(&store, &t1, both.clone(), &IngestOptions::default())
    .await
    .unwrap();
  ingest(&store, &t2, both, &IngestOptions::default())
    .await
    .unwrap();

  // Without prune, absent rows survive.
  let only_v1 = vec![json!({"id": "v1", "caption": "one"})];
  let report = ingest(&store, &t1, only_v1.clone(), &IngestOptions::default())
    .await
    .unwrap();
  assert_eq!(report.deleted, 0);
  assert_eq!(store.count_records(&t1).await.unwrap(), 2);

  // With prune, only this tenant loses the absent row.
  let report = ingest(&store, &t1, only_v1, &IngestOptions {
    prune: true,
    ..Default::default()
  })
  .await
  .unwrap();
  assert_eq!(report.deleted, 1);
  assert_eq!(store.count_records(&t1).await.unwrap(), 1);
  assert_eq!(store.count_records(&t2).await.unwrap(), 2);
}

#[tokio::test]
async fn missing_media_is_counted() {
  let (store, t1) = store_with("t1").await;
  let media_root = tempfile::tempdir().unwrap();
  fs::write(media_root.path().join("present.mp4"), b"x").unwrap();

  let rows = vec![
    json!({"id": "v1", "caption": "a", "media_path": "present.mp4"}),
    json!({"id": "v2", "caption": "b", "media_path": "absent.mp4"}),
  ];
  let report = ingest(&store, &t1, rows, &IngestOptions {
    media_root: Some(media_root.path().to_path_buf()),
    ..Default::default()
  })
  .await
  .unwrap();

  assert_eq!(report.created, 2);
  assert_eq!(report.missing_media, 1);
}

// ─── Materialize ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn materialize_is_byte_stable() {
  let (store, t1) = store_with("t1").await;
  ingest(
    &store,
    &t1,
    vec![json!({"id": "v1", "caption": "A"})],
    &IngestOptions::default(),
  )
  .await
  .unwrap();
  let record = store.get_record(&t1, "v1").await.unwrap().unwrap();

  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);

  assert_eq!(sync.materialize(&record).unwrap(), SyncOutcome::Created);
  let first = fs::read_to_string(sync.note_path(&t1, "v1")).unwrap();

  assert_eq!(sync.materialize(&record).unwrap(), SyncOutcome::Skipped);
  let second = fs::read_to_string(sync.note_path(&t1, "v1")).unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn materialize_preserves_user_content_around_the_region() {
  let (store, t1) = store_with("t1").await;
  ingest(
    &store,
    &t1,
    vec![json!({"id": "v1", "caption": "A"})],
    &IngestOptions::default(),
  )
  .await
  .unwrap();
  let record = store.get_record(&t1, "v1").await.unwrap().unwrap();

  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);
  sync.materialize(&record).unwrap();

  // User edits outside the region.
  let path = sync.note_path(&t1, "v1");
  let mut text = fs::read_to_string(&path).unwrap();
  text.push_str("\nremember to credit the audio\n");
  fs::write(&path, &text).unwrap();

  // Source data changes upstream; re-materialize.
  ingest(
    &store,
    &t1,
    vec![json!({"id": "v1", "caption": "B"})],
    &IngestOptions::default(),
  )
  .await
  .unwrap();
  let record = store.get_record(&t1, "v1").await.unwrap().unwrap();
  assert_eq!(sync.materialize(&record).unwrap(), SyncOutcome::Updated);

  let after = fs::read_to_string(&path).unwrap();
  assert!(after.contains("caption: B"));
  assert!(after.contains("remember to credit the audio"));
}

#[tokio::test]
async fn sync_source_reports_counts() {
  let (store, t1) = store_with("t1").await;
  ingest(
    &store,
    &t1,
    vec![
      json!({"id": "v1", "caption": "one"}),
      json!({"id": "v2", "caption": "two"}),
    ],
    &IngestOptions::default(),
  )
  .await
  .unwrap();

  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);

  let report = sync.sync_source(&store, &t1).await.unwrap();
  assert_eq!(report.created, 2);

  let report = sync.sync_source(&store, &t1).await.unwrap();
  assert_eq!(report.skipped, 2);
  assert_eq!(report.created, 0);
}

// ─── Dirty protection and reset ──────────────────────────────────────────────

#[tokio::test]
async fn reset_soft_protects_dirty_documents() {
  let (store, t1) = store_with("t1").await;
  ingest(
    &store,
    &t1,
    vec![
      json!({"id": "clean", "caption": "one"}),
      json!({"id": "edited", "caption": "two"}),
    ],
    &IngestOptions::default(),
  )
  .await
  .unwrap();

  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);
  sync.sync_source(&store, &t1).await.unwrap();

  let edited = sync.note_path(&t1, "edited");
  let mut text = fs::read_to_string(&edited).unwrap();
  text.push_str("\nhand-written\n");
  fs::write(&edited, &text).unwrap();

  let report = sync
    .reset(&store, &t1, ResetMode::Soft, false)
    .await
    .unwrap();
  assert_eq!(report.archived, 1);
  assert_eq!(report.protected, 1);
  assert!(edited.exists());
  assert!(!sync.note_path(&t1, "clean").exists());
}

#[tokio::test]
async fn reset_hard_requires_force() {
  let (store, t1) = store_with("t1").await;
  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);

  let err = sync
    .reset(&store, &t1, ResetMode::Hard, false)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(clipvault_core::Error::Conflict(_))
  ));
}

#[tokio::test]
async fn reset_with_force_archives_dirty_documents_too() {
  let (store, t1) = store_with("t1").await;
  ingest(
    &store,
    &t1,
    vec![json!({"id": "edited", "caption": "x"})],
    &IngestOptions::default(),
  )
  .await
  .unwrap();

  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);
  sync.sync_source(&store, &t1).await.unwrap();

  let edited = sync.note_path(&t1, "edited");
  let mut text = fs::read_to_string(&edited).unwrap();
  text.push_str("\nhand-written\n");
  fs::write(&edited, &text).unwrap();

  let report = sync
    .reset(&store, &t1, ResetMode::Hard, true)
    .await
    .unwrap();
  assert_eq!(report.archived, 1);
  assert_eq!(report.protected, 0);
  assert!(!edited.exists());

  // Archived, not deleted.
  let archived: Vec<_> = walk(&root.path().join("archive"));
  assert_eq!(archived.len(), 1);
}

// ─── Consolidate and archive ─────────────────────────────────────────────────

#[tokio::test]
async fn consolidate_keeps_newest_and_archives_the_rest() {
  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);

  let legacy_a = root.path().join("legacy-a");
  let legacy_b = root.path().join("legacy-b");
  fs::create_dir_all(&legacy_a).unwrap();
  fs::create_dir_all(&legacy_b).unwrap();

  fs::write(legacy_a.join("t1--42.md"), "older copy\n").unwrap();
  std::thread::sleep(Duration::from_millis(50));
  fs::write(legacy_b.join("t1--42.md"), "newer copy\n").unwrap();

  let report = sync
    .consolidate(&[legacy_a.clone(), legacy_b.clone()])
    .unwrap();
  assert_eq!(report.created, 1);
  assert_eq!(report.archived, 1);

  let canonical = root.path().join("notes").join("t1--42.md");
  assert_eq!(fs::read_to_string(&canonical).unwrap(), "newer copy\n");
  assert!(!legacy_a.join("t1--42.md").exists());
  assert!(!legacy_b.join("t1--42.md").exists());

  // Exactly one archived copy, never a deletion.
  let archived = walk(&root.path().join("archive"));
  assert_eq!(archived.len(), 1);
}

#[tokio::test]
async fn consolidate_leaves_a_newer_canonical_copy_alone() {
  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);

  let legacy = root.path().join("legacy");
  fs::create_dir_all(&legacy).unwrap();
  fs::create_dir_all(root.path().join("notes")).unwrap();

  fs::write(legacy.join("t1--42.md"), "legacy copy\n").unwrap();
  std::thread::sleep(Duration::from_millis(50));
  fs::write(root.path().join("notes/t1--42.md"), "canonical copy\n").unwrap();

  let report = sync.consolidate(&[legacy]).unwrap();
  assert_eq!(report.skipped, 1);
  assert_eq!(report.archived, 1);
  assert_eq!(
    fs::read_to_string(root.path().join("notes/t1--42.md")).unwrap(),
    "canonical copy\n"
  );
}

#[tokio::test]
async fn archive_stale_moves_only_unselected_notes() {
  let (store, t1) = store_with("t1").await;
  ingest(
    &store,
    &t1,
    vec![
      json!({"id": "keep", "caption": "a"}),
      json!({"id": "stale", "caption": "b"}),
    ],
    &IngestOptions::default(),
  )
  .await
  .unwrap();

  let root = tempfile::tempdir().unwrap();
  let sync = synchronizer(&root);
  sync.sync_source(&store, &t1).await.unwrap();

  let live: BTreeSet<String> = ["keep".to_string()].into();
  let report = sync.archive_stale(&t1, &live).unwrap();
  assert_eq!(report.archived, 1);
  assert_eq!(report.skipped, 1);
  assert!(sync.note_path(&t1, "keep").exists());
  assert!(!sync.note_path(&t1, "stale").exists());
}

fn walk(dir: &std::path::Path) -> Vec<PathBuf> {
  let mut out = Vec::new();
  if !dir.exists() {
    return out;
  }
  for entry in fs::read_dir(dir).unwrap() {
    let path = entry.unwrap().path();
    if path.is_dir() {
      out.extend(walk(&path));
    } else {
      out.push(path);
    }
  }
  out
}
