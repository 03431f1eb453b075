//! Tenant identifier validation.
//!
//! Every component validates identifiers through these types before trusting
//! them. Validation canonicalises (trim + lowercase for source ids) and then
//! rejects anything outside the allow-list; it never strips characters.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

// ─── SourceId ────────────────────────────────────────────────────────────────

/// Canonical identifier of one source (tenant).
///
/// Allowed characters after canonicalisation: `[a-z0-9._-]`, non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(String);

impl SourceId {
  pub fn parse(raw: &str) -> Result<Self> {
    let canon = raw.trim().to_ascii_lowercase();
    if canon.is_empty() {
      return Err(Error::InvalidIdentifier(raw.to_owned()));
    }
    if !canon
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c))
    {
      return Err(Error::InvalidIdentifier(raw.to_owned()));
    }
    Ok(Self(canon))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Default schema name for this source, used only at registration time.
  /// Read/write paths must always go through the registry mapping instead.
  pub fn default_schema_name(&self) -> Result<SchemaName> {
    let mut s = String::with_capacity(self.0.len() + 3);
    s.push_str("cv_");
    for c in self.0.chars() {
      s.push(if c.is_ascii_alphanumeric() { c } else { '_' });
    }
    SchemaName::parse(&s)
  }
}

impl fmt::Display for SourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl Serialize for SourceId {
  fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for SourceId {
  fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    Self::parse(&raw).map_err(serde::de::Error::custom)
  }
}

// ─── SchemaName ──────────────────────────────────────────────────────────────

/// A validated storage-namespace token: leading letter or underscore, then
/// letters, digits, or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(String);

impl SchemaName {
  pub fn parse(raw: &str) -> Result<Self> {
    let mut chars = raw.chars();
    let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !head_ok || !tail_ok {
      return Err(Error::InvalidIdentifier(raw.to_owned()));
    }
    Ok(Self(raw.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The profile index encoded as a trailing `p<NN>` group, if any.
  ///
  /// `cv_studio_p02` → `Some(2)`; `cv_archive` → `None`.
  pub fn profile_index(&self) -> Option<u8> {
    let (_, tail) = self.0.rsplit_once('p')?;
    if tail.len() != 2 || !tail.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    tail.parse().ok()
  }
}

impl fmt::Display for SchemaName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl Serialize for SchemaName {
  fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for SchemaName {
  fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    Self::parse(&raw).map_err(serde::de::Error::custom)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_id_canonicalises_case_and_whitespace() {
    let id = SourceId::parse("  Studio.Main ").unwrap();
    assert_eq!(id.as_str(), "studio.main");
  }

  #[test]
  fn source_id_rejects_disallowed_characters() {
    assert!(matches!(
      SourceId::parse("studio main"),
      Err(Error::InvalidIdentifier(_))
    ));
    assert!(matches!(
      SourceId::parse("studio/../etc"),
      Err(Error::InvalidIdentifier(_))
    ));
    assert!(matches!(SourceId::parse("   "), Err(Error::InvalidIdentifier(_))));
  }

  #[test]
  fn schema_name_requires_leading_letter_or_underscore() {
    assert!(SchemaName::parse("_cv01").is_ok());
    assert!(SchemaName::parse("cv_studio").is_ok());
    assert!(matches!(
      SchemaName::parse("1cv"),
      Err(Error::InvalidIdentifier(_))
    ));
    assert!(matches!(
      SchemaName::parse("cv-studio"),
      Err(Error::InvalidIdentifier(_))
    ));
  }

  #[test]
  fn default_schema_name_is_always_valid() {
    let id = SourceId::parse("studio.main-02").unwrap();
    let schema = id.default_schema_name().unwrap();
    assert_eq!(schema.as_str(), "cv_studio_main_02");
  }

  #[test]
  fn profile_index_parses_two_digit_suffix_only() {
    assert_eq!(SchemaName::parse("cv_studio_p02").unwrap().profile_index(), Some(2));
    assert_eq!(SchemaName::parse("cv_studio_p2").unwrap().profile_index(), None);
    assert_eq!(SchemaName::parse("cv_studio").unwrap().profile_index(), None);
    assert_eq!(SchemaName::parse("cv_p10_old").unwrap().profile_index(), None);
  }
}
