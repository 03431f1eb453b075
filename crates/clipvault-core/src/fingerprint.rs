//! Content fingerprinting over the source-owned fields of a record.
//!
//! The fingerprint is a SHA-256 over the fields in a fixed order with
//! length-prefixed framing, so `("ab", "c")` and `("a", "bc")` can never
//! collide. Byte-identical source-owned data always yields the same digest,
//! which is what makes re-ingestion a no-op.

use sha2::{Digest, Sha256};

use crate::record::SourceFields;

/// Compute the lowercase-hex fingerprint of `fields`.
pub fn fingerprint(fields: &SourceFields) -> String {
  let mut hasher = Sha256::new();
  update_opt_str(&mut hasher, fields.caption.as_deref());
  update_opt_str(&mut hasher, fields.author_handle.as_deref());
  update_opt_str(&mut hasher, fields.author_name.as_deref());
  update_opt_str(
    &mut hasher,
    fields
      .posted_at
      .map(|dt| dt.timestamp_micros().to_string())
      .as_deref(),
  );
  update_opt_str(
    &mut hasher,
    fields.duration_secs.map(|d| d.to_string()).as_deref(),
  );
  update_opt_str(&mut hasher, fields.media_path.as_deref());
  hex::encode(hasher.finalize())
}

fn update_opt_str(hasher: &mut Sha256, value: Option<&str>) {
  match value {
    Some(s) => {
      hasher.update([1u8]);
      hasher.update((s.len() as u64).to_le_bytes());
      hasher.update(s.as_bytes());
    }
    None => hasher.update([0u8]),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn fields() -> SourceFields {
    SourceFields {
      caption:       Some("morning routine".into()),
      author_handle: Some("@kestrel".into()),
      author_name:   Some("Kestrel".into()),
      posted_at:     Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
      duration_secs: Some(31),
      media_path:    Some("kestrel/morning.mp4".into()),
    }
  }

  #[test]
  fn identical_fields_identical_digest() {
    assert_eq!(fingerprint(&fields()), fingerprint(&fields()));
  }

  #[test]
  fn any_source_field_changes_the_digest() {
    let base = fingerprint(&fields());

    let mut f = fields();
    f.caption = Some("evening routine".into());
    assert_ne!(fingerprint(&f), base);

    let mut f = fields();
    f.duration_secs = Some(32);
    assert_ne!(fingerprint(&f), base);

    let mut f = fields();
    f.media_path = None;
    assert_ne!(fingerprint(&f), base);
  }

  #[test]
  fn none_and_empty_string_differ() {
    let mut a = fields();
    a.caption = None;
    let mut b = fields();
    b.caption = Some(String::new());
    assert_ne!(fingerprint(&a), fingerprint(&b));
  }

  #[test]
  fn framing_prevents_adjacent_field_bleed() {
    let mut a = SourceFields::default();
    a.caption = Some("ab".into());
    a.author_handle = Some("c".into());

    let mut b = SourceFields::default();
    b.caption = Some("a".into());
    b.author_handle = Some("bc".into());

    assert_ne!(fingerprint(&a), fingerprint(&b));
  }
}
