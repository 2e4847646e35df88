//! Derived, read-only filter view over a cached sequence.

/// Entities that can be matched against a free-text query.
///
/// `needle` is already trimmed and lowercased; implementors compare their
/// searchable fields case-insensitively against it.
pub trait Searchable {
  fn matches(&self, needle: &str) -> bool;
}

/// The subsequence matching `query`, relative order preserved.
///
/// Pure function of its inputs: no re-sort, idempotent for a sequence that
/// already matches the query. An empty or whitespace query matches
/// everything.
pub fn filter<T: Searchable + Clone>(entities: &[T], query: &str) -> Vec<T> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return entities.to_vec();
  }
  entities
    .iter()
    .filter(|e| e.matches(&needle))
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::classes::ClassName;
  use crate::testing::class;

  #[test]
  fn matches_subject_case_insensitively() {
    let classes = vec![
      class("1", ClassName::A, "Mathematics"),
      class("2", ClassName::B, "History"),
    ];
    let hits = filter(&classes, "math");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "1");
  }

  #[test]
  fn matches_formatted_display_name() {
    let classes = vec![
      class("1", ClassName::A, "Mathematics"),
      class("2", ClassName::B, "History"),
    ];
    // "class b" matches the display name "Class B", not any subject.
    let hits = filter(&classes, "class b");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "2");
  }

  #[test]
  fn preserves_relative_order() {
    let classes = vec![
      class("1", ClassName::A, "Science"),
      class("2", ClassName::B, "History"),
      class("3", ClassName::C, "Computer Science"),
    ];
    let hits = filter(&classes, "science");
    let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
  }

  #[test]
  fn filtering_is_idempotent() {
    let classes = vec![
      class("1", ClassName::A, "Science"),
      class("2", ClassName::B, "History"),
      class("3", ClassName::C, "Computer Science"),
    ];
    let once = filter(&classes, "science");
    let twice = filter(&once, "science");
    assert_eq!(once, twice);
  }

  #[test]
  fn empty_query_returns_everything() {
    let classes = vec![class("1", ClassName::A, "Science")];
    assert_eq!(filter(&classes, "").len(), 1);
    assert_eq!(filter(&classes, "   ").len(), 1);
  }
}
