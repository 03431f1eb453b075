//! Backend-agnostic operations over a [`clipvault_core::store::RecordStore`]:
//! the ingestion pipeline and the document synchronizer.
//!
//! Nothing in this crate knows which backend is active; it sees only the
//! store trait, the notes directory, and the archive directory.

pub mod error;
pub mod ingest;
pub mod sync;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
