//! JSON REST API for clipvault.
//!
//! Exposes an axum [`Router`] backed by any
//! [`clipvault_core::store::RecordStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility. Every tenant-scoped route resolves its
//! effective source per request from the `?source=` query parameter and the
//! ambient profile header, through the same guard as every other entry point.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", clipvault_api::api_router(store.clone(), policy))
//! ```

pub mod audit;
pub mod error;
pub mod ingest;
pub mod maintenance;
pub mod records;
pub mod scope;
pub mod search;
pub mod sources;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use clipvault_core::{resolver::ScopePolicy, store::RecordStore};

pub use error::ApiError;
pub use scope::PROFILE_HEADER;

/// Shared handler state: the active backend plus the deployment scoping
/// policy.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub policy: ScopePolicy,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), policy: self.policy }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, policy: ScopePolicy) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    // Source registry
    .route(
      "/sources",
      get(sources::list::<S>).post(sources::register::<S>),
    )
    .route(
      "/sources/{id}",
      get(sources::get_one::<S>).delete(sources::remove::<S>),
    )
    .route("/sources/{id}/default", post(sources::set_default::<S>))
    // Records
    .route(
      "/records/{id}",
      get(records::get_one::<S>)
        .put(records::upsert::<S>)
        .delete(records::remove::<S>),
    )
    .route("/records/{id}/overlay", put(records::overlay::<S>))
    .route("/records/query", post(records::query::<S>))
    .route("/ids", get(records::ids::<S>))
    .route("/count", get(records::count::<S>))
    // Search
    .route("/search", get(search::handler::<S>))
    // Ingestion
    .route("/ingest", post(ingest::handler::<S>))
    // Audit
    .route("/audit/overlap", get(audit::overlap_handler::<S>))
    // Maintenance
    .route("/truncate", post(maintenance::truncate::<S>))
    .route(
      "/rebuild-search",
      post(maintenance::rebuild_search::<S>),
    )
    .with_state(AppState { store, policy })
}
