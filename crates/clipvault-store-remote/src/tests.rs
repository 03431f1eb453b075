//! End-to-end tests against a live API server: a `RemoteStore` pointed at an
//! `api_router` over an in-memory embedded store, with a `MirrorStore` on
//! top, including degraded reads once the remote becomes unreachable.

use std::{sync::Arc, time::Duration};

use axum::Router;
use tokio::net::TcpListener;

use clipvault_api::api_router;
use clipvault_core::{
  fingerprint::fingerprint,
  ident::SourceId,
  record::SourceFields,
  resolver::ScopePolicy,
  store::{RecordStore, UpsertOutcome},
};
use clipvault_store_sqlite::SqliteStore;

use crate::{Error, MirrorStore, RemoteConfig, RemoteStore};

/// Short TTL so a test can wait out a snapshot without slowing the suite.
const TTL: Duration = Duration::from_millis(50);

async fn spawn_server()
-> (Arc<SqliteStore>, String, tokio::task::JoinHandle<()>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let app = Router::new()
    .nest("/api", api_router(Arc::clone(&store), ScopePolicy::default()));
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let handle = tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  (store, format!("http://{addr}"), handle)
}

fn remote(base_url: &str) -> RemoteStore {
  RemoteStore::new(RemoteConfig {
    base_url:     base_url.to_owned(),
    timeout_secs: 2,
  })
  .unwrap()
}

async fn mirror(base_url: &str) -> MirrorStore {
  let cache = SqliteStore::open_in_memory().await.unwrap();
  MirrorStore::new(remote(base_url), cache, TTL)
}

fn sid(s: &str) -> SourceId { SourceId::parse(s).unwrap() }

fn fields(caption: &str) -> SourceFields {
  SourceFields { caption: Some(caption.into()), ..Default::default() }
}

#[tokio::test]
async fn writes_reach_the_remote_and_reads_see_them() {
  let (_server_store, url, server) = spawn_server().await;
  let mirror = mirror(&url).await;
  let src = sid("studio");

  mirror
    .register_source(src.clone(), "Studio".into())
    .await
    .unwrap();
  let f = fields("clip one");
  let fp = fingerprint(&f);
  let outcome = mirror.upsert_record(&src, "v1", f, fp).await.unwrap();
  assert_eq!(outcome, UpsertOutcome::Created);

  // The write invalidated the snapshot, so the read re-pulls immediately
  // instead of waiting out the TTL.
  assert_eq!(mirror.list_ids(&src).await.unwrap(), vec!["v1".to_owned()]);
  let record = mirror.get_record(&src, "v1").await.unwrap().unwrap();
  assert_eq!(record.fields.caption.as_deref(), Some("clip one"));

  server.abort();
}

#[tokio::test]
async fn stale_snapshot_is_served_when_the_remote_goes_away() {
  let (server_store, url, server) = spawn_server().await;
  let src = sid("studio");
  server_store
    .register_source(src.clone(), "Studio".into())
    .await
    .unwrap();
  let f = fields("morning routine");
  let fp = fingerprint(&f);
  server_store.upsert_record(&src, "v1", f, fp).await.unwrap();

  // Warm both the registry and the records snapshot while the server is up.
  let mirror = mirror(&url).await;
  assert_eq!(mirror.list_sources().await.unwrap().len(), 1);
  assert_eq!(mirror.count_records(&src).await.unwrap(), 1);

  // Kill the server and wait out the TTL; the next reads attempt a refresh,
  // fail, and fall back to the cached snapshot.
  server.abort();
  tokio::time::sleep(TTL + Duration::from_millis(100)).await;

  let sources = mirror.list_sources().await.unwrap();
  assert_eq!(sources.len(), 1);
  assert_eq!(sources[0].source_id.as_str(), "studio");

  assert_eq!(mirror.count_records(&src).await.unwrap(), 1);
  let record = mirror.get_record(&src, "v1").await.unwrap().unwrap();
  assert_eq!(record.fields.caption.as_deref(), Some("morning routine"));
}

#[tokio::test]
async fn cold_cache_propagates_the_remote_failure() {
  // Bind and drop a listener so the port is known to be closed.
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let mirror = mirror(&format!("http://{addr}")).await;
  assert!(mirror.list_sources().await.is_err());
  assert!(mirror.count_records(&sid("studio")).await.is_err());
  assert!(mirror.get_record(&sid("studio"), "v1").await.is_err());
}

#[tokio::test]
async fn remote_surfaces_typed_api_errors() {
  let (_server_store, url, server) = spawn_server().await;
  let remote = remote(&url);
  let src = sid("ghost");

  // 404 on a direct lookup is an absence, not an error.
  assert!(remote.get_source(&src).await.unwrap().is_none());

  // Scoped routes report an unknown source as its wire kind.
  let err = remote.count_records(&src).await.unwrap_err();
  match err {
    Error::Api { status, kind, .. } => {
      assert_eq!(status, 404);
      assert_eq!(kind, "unknown_source");
    }
    other => panic!("unexpected error: {other}"),
  }

  // An unconfirmed truncate never reaches the wire.
  let err = remote.truncate(&src, false).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(clipvault_core::Error::Conflict(_))
  ));

  server.abort();
}
