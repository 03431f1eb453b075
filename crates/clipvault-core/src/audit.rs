//! Contamination auditor — set differences between two tenants' key spaces.
//!
//! Read-only and pure; callers feed it the id lists of two sources (via
//! [`crate::store::RecordStore::list_ids`]) after any recovery or migration
//! procedure to verify isolation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The three id-sets produced by [`overlap`]. All sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapReport {
  /// Ids present under both sources. A shared id is not itself a leak; the
  /// records behind it must still differ per tenant.
  pub overlap_ids: Vec<String>,
  pub only_a_ids:  Vec<String>,
  pub only_b_ids:  Vec<String>,
}

/// Compute the overlap report for two id lists.
pub fn overlap<I, J>(ids_a: I, ids_b: J) -> OverlapReport
where
  I: IntoIterator<Item = String>,
  J: IntoIterator<Item = String>,
{
  let a: BTreeSet<String> = ids_a.into_iter().collect();
  let b: BTreeSet<String> = ids_b.into_iter().collect();

  OverlapReport {
    overlap_ids: a.intersection(&b).cloned().collect(),
    only_a_ids:  a.difference(&b).cloned().collect(),
    only_b_ids:  b.difference(&a).cloned().collect(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn disjoint_sets_have_empty_overlap() {
    let report = overlap(ids(&["a", "b"]), ids(&["c", "d"]));
    assert!(report.overlap_ids.is_empty());
    assert_eq!(report.only_a_ids, ids(&["a", "b"]));
    assert_eq!(report.only_b_ids, ids(&["c", "d"]));
  }

  #[test]
  fn shared_ids_are_reported_sorted() {
    let report = overlap(ids(&["x", "b", "a"]), ids(&["x", "a", "z"]));
    assert_eq!(report.overlap_ids, ids(&["a", "x"]));
    assert_eq!(report.only_a_ids, ids(&["b"]));
    assert_eq!(report.only_b_ids, ids(&["z"]));
  }

  #[test]
  fn duplicate_input_ids_collapse() {
    let report = overlap(ids(&["a", "a"]), ids(&["a"]));
    assert_eq!(report.overlap_ids, ids(&["a"]));
    assert!(report.only_a_ids.is_empty());
  }
}
