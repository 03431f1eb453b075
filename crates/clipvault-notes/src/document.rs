//! Parsing and re-materialising managed-region documents.
//!
//! `render(parse(text)) == text` holds byte-for-byte for any document this
//! module accepts, and `merge` only ever replaces the generated region, so
//! re-materialising an unchanged document is byte-stable.

use thiserror::Error;

/// Opens the machine-managed region. Must sit on its own line.
pub const BEGIN_MARKER: &str = "<!-- clipvault:begin -->";
/// Closes the machine-managed region.
pub const END_MARKER: &str = "<!-- clipvault:end -->";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("document has no begin marker")]
  MissingBeginMarker,

  #[error("document has a begin marker but no end marker")]
  MissingEndMarker,

  #[error("end marker appears before begin marker")]
  MarkersOutOfOrder,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A document split at its managed-region markers. `before` and `after` are
/// preserved verbatim, including all whitespace; `generated` is the region
/// body without the markers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentParts {
  pub before:    String,
  pub generated: String,
  pub after:     String,
}

impl DocumentParts {
  /// Parse a document that must contain a managed region.
  pub fn parse(text: &str) -> Result<Self> {
    let begin = text.find(BEGIN_MARKER).ok_or(Error::MissingBeginMarker)?;
    let end = text.find(END_MARKER).ok_or(Error::MissingEndMarker)?;
    if end < begin {
      return Err(Error::MarkersOutOfOrder);
    }

    let before = &text[..begin];
    let mut gen_start = begin + BEGIN_MARKER.len();
    // The marker owns its trailing newline; the region body starts after it.
    if text[gen_start..].starts_with('\n') {
      gen_start += 1;
    }
    let generated = &text[gen_start..end];
    let after = &text[end + END_MARKER.len()..];

    Ok(Self {
      before:    before.to_owned(),
      generated: generated.to_owned(),
      after:     after.to_owned(),
    })
  }

  /// Parse a document, treating a marker-less file as pure user content with
  /// an empty region appended at the end. Corrupt marker pairs still error.
  pub fn parse_or_adopt(text: &str) -> Result<Self> {
    match Self::parse(text) {
      Ok(parts) => Ok(parts),
      Err(Error::MissingBeginMarker) => {
        let mut before = text.to_owned();
        if !before.is_empty() && !before.ends_with('\n') {
          before.push('\n');
        }
        Ok(Self { before, generated: String::new(), after: "\n".into() })
      }
      Err(e) => Err(e),
    }
  }

  /// Re-materialise the document. Inverse of [`Self::parse`].
  pub fn render(&self) -> String {
    format!(
      "{}{BEGIN_MARKER}\n{}{END_MARKER}{}",
      self.before, self.generated, self.after
    )
  }

  /// Pure merge: keep the user content, replace the generated region.
  pub fn merge(&self, new_generated: &str) -> Self {
    Self {
      before:    self.before.clone(),
      generated: new_generated.to_owned(),
      after:     self.after.clone(),
    }
  }

  /// The value of a `key: value` line in the generated region, if present.
  pub fn generated_value(&self, key: &str) -> Option<&str> {
    self.generated.lines().find_map(|line| {
      let (k, v) = line.split_once(": ")?;
      (k == key).then_some(v)
    })
  }

  /// All `key` tokens of `key: value` lines in the generated region.
  pub fn generated_keys(&self) -> Vec<&str> {
    self
      .generated
      .lines()
      .filter_map(|line| line.split_once(": ").map(|(k, _)| k))
      .collect()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  const DOC: &str = "my intro\n\n<!-- clipvault:begin -->\nid: v1\nstatus: raw\n<!-- clipvault:end -->\n\nmy outro\n";

  #[test]
  fn parse_splits_at_markers() {
    let parts = DocumentParts::parse(DOC).unwrap();
    assert_eq!(parts.before, "my intro\n\n");
    assert_eq!(parts.generated, "id: v1\nstatus: raw\n");
    assert_eq!(parts.after, "\n\nmy outro\n");
  }

  #[test]
  fn render_is_the_exact_inverse_of_parse() {
    let parts = DocumentParts::parse(DOC).unwrap();
    assert_eq!(parts.render(), DOC);
  }

  #[test]
  fn merge_replaces_only_the_region() {
    let parts = DocumentParts::parse(DOC).unwrap();
    let merged = parts.merge("id: v1\nstatus: reviewed\n");
    assert_eq!(merged.before, parts.before);
    assert_eq!(merged.after, parts.after);
    assert_eq!(
      merged.render(),
      "my intro\n\n<!-- clipvault:begin -->\nid: v1\nstatus: reviewed\n<!-- clipvault:end -->\n\nmy outro\n"
    );
  }

  #[test]
  fn merge_with_unchanged_region_is_byte_stable() {
    let parts = DocumentParts::parse(DOC).unwrap();
    let region = parts.generated.clone();
    assert_eq!(parts.merge(&region).render(), DOC);
    assert_eq!(parts.merge(&region).merge(&region).render(), DOC);
  }

  #[test]
  fn missing_begin_marker_errors() {
    assert_eq!(
      DocumentParts::parse("no markers here"),
      Err(Error::MissingBeginMarker)
    );
  }

  #[test]
  fn missing_end_marker_errors() {
    let text = "<!-- clipvault:begin -->\nid: v1\n";
    assert_eq!(DocumentParts::parse(text), Err(Error::MissingEndMarker));
  }

  #[test]
  fn out_of_order_markers_error() {
    let text = "<!-- clipvault:end -->\n<!-- clipvault:begin -->\n";
    assert_eq!(DocumentParts::parse(text), Err(Error::MarkersOutOfOrder));
  }

  #[test]
  fn adopt_keeps_markerless_text_as_user_content() {
    let parts = DocumentParts::parse_or_adopt("hand-written note").unwrap();
    assert_eq!(parts.before, "hand-written note\n");
    assert_eq!(parts.generated, "");

    let rendered = parts.merge("id: v1\n").render();
    assert!(rendered.starts_with("hand-written note\n"));
    assert!(rendered.contains(BEGIN_MARKER));
  }

  #[test]
  fn generated_value_lookup() {
    let parts = DocumentParts::parse(DOC).unwrap();
    assert_eq!(parts.generated_value("id"), Some("v1"));
    assert_eq!(parts.generated_value("status"), Some("raw"));
    assert_eq!(parts.generated_value("missing"), None);
    assert_eq!(parts.generated_keys(), vec!["id", "status"]);
  }
}
