//! Networked backends for the clipvault record store.
//!
//! [`RemoteStore`] speaks the clipvault JSON API over HTTP and satisfies the
//! same [`clipvault_core::store::RecordStore`] contract as the embedded
//! backend, so callers cannot tell them apart. [`MirrorStore`] layers a
//! TTL-bounded local SQLite cache over a remote, preferring stale-but-present
//! data over blocking when the remote is unreachable.

mod client;
mod mirror;

pub mod error;

#[cfg(test)]
mod tests;

pub use client::{RemoteConfig, RemoteStore};
pub use error::{Error, Result};
pub use mirror::{DEFAULT_TTL_SECS, MirrorStore};
