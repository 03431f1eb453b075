//! Managed-region document model for clipvault notes.
//!
//! A note is an ordinary text file with one machine-managed region bounded by
//! markers. Everything outside the markers belongs to the user. This crate is
//! pure text processing: parsing a document into its
//! `{before, generated, after}` triple, merging a freshly rendered region
//! back in, and deciding whether a document is dirty. It never touches the
//! filesystem; `clipvault-engine` does that.

pub mod dirty;
pub mod document;
pub mod render;

pub use dirty::{DirtyPolicy, dirty_reasons};
pub use document::{BEGIN_MARKER, DocumentParts, END_MARKER, Error, Result};
pub use render::{TEMPLATE_VERSION, document_file_name, render_generated, render_hash};
