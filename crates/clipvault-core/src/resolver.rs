//! Tenant resolution — deriving the effective source for one operation.
//!
//! Resolution is a pure function over a registry snapshot, so it carries no
//! session state and is trivially testable. It fails rather than guessing:
//! a required-but-missing hint is `AmbiguousSource`, disagreeing scope
//! signals are `ProfileSourceMismatch`. The guard runs on every write path,
//! not only reads; it is the primary defence against cross-tenant
//! contamination.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, ident::SourceId, source::Source};

// ─── Policy and hints ────────────────────────────────────────────────────────

/// Deployment-wide scoping policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScopePolicy {
  /// When set, operations without an explicit source hint are rejected
  /// instead of falling back to context or the registry default.
  #[serde(default)]
  pub require_explicit: bool,
}

/// Per-operation scoping signals. Both are optional; both are validated.
#[derive(Debug, Clone, Default)]
pub struct ScopeHints {
  /// Explicit source named by the caller.
  pub source:  Option<String>,
  /// Ambient context hint, e.g. the profile index of the calling client.
  pub profile: Option<u8>,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve the effective source for one operation.
///
/// Order: explicit hint (must exist, and must agree with any profile hint) →
/// reject if policy demands explicit scoping → profile hint matched against
/// registered schema names → registry default.
pub fn resolve<'a>(
  sources: &'a [Source],
  hints: &ScopeHints,
  policy: &ScopePolicy,
) -> Result<&'a Source> {
  if let Some(raw) = &hints.source {
    let id = SourceId::parse(raw)?;
    let source = sources
      .iter()
      .find(|s| s.source_id == id)
      .ok_or_else(|| Error::UnknownSource(id.to_string()))?;

    if let Some(given) = hints.profile {
      let expected = source.schema_name.profile_index();
      if expected != Some(given) {
        return Err(Error::ProfileSourceMismatch {
          source: source.source_id.to_string(),
          expected,
          given,
        });
      }
    }
    return Ok(source);
  }

  if policy.require_explicit {
    return Err(Error::AmbiguousSource);
  }

  if let Some(given) = hints.profile {
    let mut matches = sources
      .iter()
      .filter(|s| s.schema_name.profile_index() == Some(given));
    if let Some(first) = matches.next() {
      if matches.next().is_some() {
        // Two sources claim the same profile; refuse to pick one.
        return Err(Error::AmbiguousSource);
      }
      return Ok(first);
    }
    return Err(Error::ProfileSourceMismatch {
      source:   String::new(),
      expected: None,
      given,
    });
  }

  sources
    .iter()
    .find(|s| s.is_default)
    .ok_or(Error::AmbiguousSource)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::ident::SchemaName;

  fn source(id: &str, schema: &str, is_default: bool) -> Source {
    Source {
      source_id:   SourceId::parse(id).unwrap(),
      schema_name: SchemaName::parse(schema).unwrap(),
      label:       id.to_owned(),
      is_default,
      created_at:  Utc::now(),
    }
  }

  fn registry() -> Vec<Source> {
    vec![
      source("archive", "cv_archive", true),
      source("studio", "cv_studio_p02", false),
    ]
  }

  #[test]
  fn explicit_hint_wins() {
    let sources = registry();
    let hints = ScopeHints { source: Some("studio".into()), profile: None };
    let resolved = resolve(&sources, &hints, &ScopePolicy::default()).unwrap();
    assert_eq!(resolved.source_id.as_str(), "studio");
  }

  #[test]
  fn unknown_explicit_hint_fails() {
    let sources = registry();
    let hints = ScopeHints { source: Some("ghost".into()), profile: None };
    let err = resolve(&sources, &hints, &ScopePolicy::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownSource(_)));
  }

  #[test]
  fn malformed_explicit_hint_fails_before_lookup() {
    let sources = registry();
    let hints = ScopeHints { source: Some("no spaces".into()), profile: None };
    let err = resolve(&sources, &hints, &ScopePolicy::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier(_)));
  }

  #[test]
  fn require_explicit_rejects_missing_hint() {
    let sources = registry();
    let policy = ScopePolicy { require_explicit: true };
    let err = resolve(&sources, &ScopeHints::default(), &policy).unwrap_err();
    assert!(matches!(err, Error::AmbiguousSource));
  }

  #[test]
  fn profile_hint_selects_matching_source() {
    let sources = registry();
    let hints = ScopeHints { source: None, profile: Some(2) };
    let resolved = resolve(&sources, &hints, &ScopePolicy::default()).unwrap();
    assert_eq!(resolved.source_id.as_str(), "studio");
  }

  #[test]
  fn agreeing_signals_pass_the_guard() {
    let sources = registry();
    let hints = ScopeHints { source: Some("studio".into()), profile: Some(2) };
    assert!(resolve(&sources, &hints, &ScopePolicy::default()).is_ok());
  }

  #[test]
  fn disagreeing_signals_fail_the_guard() {
    let sources = registry();
    let hints = ScopeHints { source: Some("studio".into()), profile: Some(3) };
    let err = resolve(&sources, &hints, &ScopePolicy::default()).unwrap_err();
    assert!(matches!(
      err,
      Error::ProfileSourceMismatch { expected: Some(2), given: 3, .. }
    ));
  }

  #[test]
  fn profile_guard_applies_to_unindexed_sources_too() {
    let sources = registry();
    let hints = ScopeHints { source: Some("archive".into()), profile: Some(2) };
    let err = resolve(&sources, &hints, &ScopePolicy::default()).unwrap_err();
    assert!(matches!(
      err,
      Error::ProfileSourceMismatch { expected: None, given: 2, .. }
    ));
  }

  #[test]
  fn falls_back_to_registry_default() {
    let sources = registry();
    let resolved =
      resolve(&sources, &ScopeHints::default(), &ScopePolicy::default()).unwrap();
    assert_eq!(resolved.source_id.as_str(), "archive");
  }

  #[test]
  fn no_default_no_hint_is_ambiguous() {
    let sources = vec![source("studio", "cv_studio_p02", false)];
    let err =
      resolve(&sources, &ScopeHints::default(), &ScopePolicy::default()).unwrap_err();
    assert!(matches!(err, Error::AmbiguousSource));
  }
}
