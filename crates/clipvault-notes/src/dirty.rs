//! Dirty detection — deciding when a document holds user content that must
//! not be silently overwritten.
//!
//! The exact predicate is policy, not law: each heuristic can be toggled
//! independently. The default enables all three.

use clipvault_core::record::Overlay;
use serde::{Deserialize, Serialize};

use crate::{document::DocumentParts, render::GENERATED_KEYS};

/// Which heuristics mark a document as dirty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DirtyPolicy {
  /// Non-whitespace text outside the managed region.
  #[serde(default = "default_true")]
  pub manual_text:     bool,
  /// Overlay fields holding non-default values.
  #[serde(default = "default_true")]
  pub overlay_values:  bool,
  /// `key: value` lines inside the region the renderer never emits.
  #[serde(default = "default_true")]
  pub unexpected_keys: bool,
}

fn default_true() -> bool { true }

impl Default for DirtyPolicy {
  fn default() -> Self {
    Self { manual_text: true, overlay_values: true, unexpected_keys: true }
  }
}

/// Every reason the document counts as dirty under `policy`. Empty means the
/// document is safe to regenerate or reset.
pub fn dirty_reasons(
  parts: &DocumentParts,
  overlay: &Overlay,
  policy: &DirtyPolicy,
) -> Vec<String> {
  let mut reasons = Vec::new();

  if policy.manual_text
    && (!parts.before.trim().is_empty() || !parts.after.trim().is_empty())
  {
    reasons.push("manual notes outside the managed region".to_owned());
  }

  if policy.overlay_values && !overlay.is_default() {
    reasons.push("overlay fields hold non-default values".to_owned());
  }

  if policy.unexpected_keys {
    let unexpected: Vec<&str> = parts
      .generated_keys()
      .into_iter()
      .filter(|k| !GENERATED_KEYS.contains(k))
      .collect();
    if !unexpected.is_empty() {
      reasons.push(format!("unexpected keys in managed region: {unexpected:?}"));
    }
  }

  reasons
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use clipvault_core::record::WorkflowStatus;

  use super::*;

  fn clean_parts() -> DocumentParts {
    DocumentParts {
      before:    String::new(),
      generated: "id: v1\nstatus: raw\n".into(),
      after:     "\n".into(),
    }
  }

  #[test]
  fn pristine_document_is_clean() {
    let reasons = dirty_reasons(
      &clean_parts(),
      &Overlay::default(),
      &DirtyPolicy::default(),
    );
    assert!(reasons.is_empty());
  }

  #[test]
  fn text_outside_region_is_dirty() {
    let mut parts = clean_parts();
    parts.after = "\nremember to credit the audio\n".into();
    let reasons =
      dirty_reasons(&parts, &Overlay::default(), &DirtyPolicy::default());
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("manual notes"));
  }

  #[test]
  fn non_default_overlay_is_dirty() {
    let overlay = Overlay {
      status: WorkflowStatus::Reviewed,
      ..Default::default()
    };
    let reasons =
      dirty_reasons(&clean_parts(), &overlay, &DirtyPolicy::default());
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("overlay"));
  }

  #[test]
  fn unexpected_region_key_is_dirty() {
    let mut parts = clean_parts();
    parts.generated.push_str("my-secret-field: yes\n");
    let reasons =
      dirty_reasons(&parts, &Overlay::default(), &DirtyPolicy::default());
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("my-secret-field"));
  }

  #[test]
  fn disabled_heuristics_do_not_fire() {
    let mut parts = clean_parts();
    parts.after = "\nmanual\n".into();
    let overlay = Overlay { rating: Some(5), ..Default::default() };
    let policy = DirtyPolicy {
      manual_text:     false,
      overlay_values:  false,
      unexpected_keys: false,
    };
    assert!(dirty_reasons(&parts, &overlay, &policy).is_empty());
  }
}
