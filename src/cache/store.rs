//! In-memory collection store.
//!
//! One `CollectionState` per collection key: the ordered entity sequence, a
//! staleness flag, and the refresh sequence numbers used to enforce
//! last-issued-wins. The store is only ever mutated by the cache layer's
//! refresh path and the coordinator's mutation success paths.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::traits::Entity;

/// State of one cached collection.
struct CollectionState<T> {
  /// Ordered entities from the last applied refresh, plus mutation edits
  entities: Vec<T>,
  /// Whether the value may not reflect the remote store
  stale: bool,
  /// When the last refresh was applied
  fetched_at: Option<DateTime<Utc>>,
  /// Sequence number of the most recently issued refresh
  issued_seq: u64,
  /// Sequence number of the most recently applied write
  applied_seq: u64,
}

impl<T> Default for CollectionState<T> {
  fn default() -> Self {
    Self {
      entities: Vec::new(),
      stale: true,
      fetched_at: None,
      issued_seq: 0,
      applied_seq: 0,
    }
  }
}

/// In-memory store keyed by collection hash.
pub(crate) struct CacheStore<T> {
  collections: Mutex<HashMap<String, CollectionState<T>>>,
}

impl<T: Entity> CacheStore<T> {
  pub(crate) fn new() -> Self {
    Self {
      collections: Mutex::new(HashMap::new()),
    }
  }

  /// Lock the map, recovering the data from a poisoned lock.
  ///
  /// Reads must stay infallible; a panic in an unrelated holder must not
  /// take the cache down with it.
  fn lock(&self) -> MutexGuard<'_, HashMap<String, CollectionState<T>>> {
    match self.collections.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  /// Get the last known value and staleness for a collection.
  ///
  /// A collection that has never been fetched reads as empty and stale.
  pub(crate) fn get(&self, hash: &str) -> (Vec<T>, bool) {
    let map = self.lock();
    match map.get(hash) {
      Some(state) => (state.entities.clone(), state.stale),
      None => (Vec::new(), true),
    }
  }

  /// When the collection was last successfully refreshed.
  pub(crate) fn fetched_at(&self, hash: &str) -> Option<DateTime<Utc>> {
    self.lock().get(hash).and_then(|s| s.fetched_at)
  }

  /// Hand out the sequence number for a newly issued refresh.
  pub(crate) fn next_refresh_seq(&self, hash: &str) -> u64 {
    let mut map = self.lock();
    let state = map.entry(hash.to_string()).or_default();
    state.issued_seq += 1;
    state.issued_seq
  }

  /// Apply a completed refresh, unless a newer write has already landed.
  ///
  /// Returns `false` when the result is discarded (last-issued-wins).
  pub(crate) fn apply_refresh(&self, hash: &str, seq: u64, entities: Vec<T>) -> bool {
    let mut map = self.lock();
    let state = map.entry(hash.to_string()).or_default();
    if seq <= state.applied_seq {
      return false;
    }
    state.entities = entities;
    state.stale = false;
    state.fetched_at = Some(Utc::now());
    state.applied_seq = seq;
    true
  }

  /// Mark a collection stale without touching its value.
  pub(crate) fn mark_stale(&self, hash: &str) {
    let mut map = self.lock();
    map.entry(hash.to_string()).or_default().stale = true;
  }

  /// Prepend a newly created entity (the remote row is authoritative).
  pub(crate) fn insert_front(&self, hash: &str, entity: T) {
    let mut map = self.lock();
    let state = map.entry(hash.to_string()).or_default();
    state.entities.insert(0, entity);
    // Any refresh issued before this edit must not clobber it.
    state.applied_seq = state.issued_seq;
  }

  /// Replace the entity with the same key in place, position unchanged.
  pub(crate) fn replace_entity(&self, hash: &str, entity: T) -> bool {
    let mut map = self.lock();
    let state = map.entry(hash.to_string()).or_default();
    let key = entity.entity_key();
    let Some(slot) = state.entities.iter_mut().find(|e| e.entity_key() == key) else {
      return false;
    };
    *slot = entity;
    state.applied_seq = state.issued_seq;
    true
  }

  /// Remove the entity with the given key, if present.
  pub(crate) fn remove_entity(&self, hash: &str, key: &str) -> bool {
    let mut map = self.lock();
    let state = map.entry(hash.to_string()).or_default();
    let before = state.entities.len();
    state.entities.retain(|e| e.entity_key() != key);
    let removed = state.entities.len() != before;
    if removed {
      state.applied_seq = state.issued_seq;
    }
    removed
  }
}
