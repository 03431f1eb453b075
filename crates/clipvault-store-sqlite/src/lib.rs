//! Embedded SQLite backend for the clipvault record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Tenant partitioning is enforced
//! by the composite `(source_id, id)` key; every statement is scoped by
//! `source_id`.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
