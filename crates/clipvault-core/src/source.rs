//! Source — one registered tenant of the vault.
//!
//! The registry entry is the only authority for the source → schema mapping.
//! Nothing may derive a schema name from a naming convention at read/write
//! time; conventions apply only inside registration itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident::{SchemaName, SourceId};

/// A registered source and its storage partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
  pub source_id:   SourceId,
  pub schema_name: SchemaName,
  /// Human-readable label shown in listings; carries no semantics.
  pub label:       String,
  /// At most one source is the default at any time.
  pub is_default:  bool,
  pub created_at:  DateTime<Utc>,
}
