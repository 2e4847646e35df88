//! Core traits for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for entities that can be cached.
///
/// Implementors must provide a unique key within their collection. The store
/// is the authority on key values; clients never generate them.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Unique identifier for this entity (e.g., the row id)
  fn entity_key(&self) -> String;

  /// Entity type name for keying and diagnostics (e.g., "class")
  fn entity_type() -> &'static str;

  /// Human-facing label used in notification copy (e.g., "Class")
  fn entity_label() -> &'static str;
}

/// Key identifying one cached collection.
///
/// The hash must be stable across runs for the same logical query so that
/// subscriptions and queues line up with cached state.
pub trait CollectionKey {
  /// Stable, fixed-length lookup key for this collection
  fn cache_hash(&self) -> String;

  /// Human-readable description for logging (e.g., "all classes")
  fn description(&self) -> String;
}
