//! Cache layer that orchestrates collection state with background refreshes.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::remote::RemoteTable;

use super::store::CacheStore;
use super::traits::CollectionKey;

/// What changed in a cached collection.
#[derive(Debug, Clone)]
pub enum CacheEvent {
  /// The collection's contents changed (refresh applied or mutation landed)
  Changed,
  /// A refresh failed; the previous value is still being served
  RefreshFailed(String),
}

type Listener = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

/// Observer list per collection hash.
///
/// Listeners run synchronously in registration order; a panicking listener
/// is isolated so the rest still run.
struct SubscriberRegistry {
  next_id: AtomicU64,
  listeners: Mutex<HashMap<String, Vec<(u64, Listener)>>>,
}

impl SubscriberRegistry {
  fn new() -> Self {
    Self {
      next_id: AtomicU64::new(1),
      listeners: Mutex::new(HashMap::new()),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<(u64, Listener)>>> {
    match self.listeners.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  fn add(&self, hash: &str, listener: Listener) -> u64 {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    self
      .lock()
      .entry(hash.to_string())
      .or_default()
      .push((id, listener));
    id
  }

  fn remove(&self, hash: &str, id: u64) {
    if let Some(list) = self.lock().get_mut(hash) {
      list.retain(|(entry_id, _)| *entry_id != id);
    }
  }

  fn notify(&self, hash: &str, event: &CacheEvent) {
    // Snapshot outside the lock so listeners may subscribe/unsubscribe.
    let snapshot: Vec<Listener> = self
      .lock()
      .get(hash)
      .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
      .unwrap_or_default();

    for listener in snapshot {
      if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
        warn!(collection = hash, "cache listener panicked");
      }
    }
  }
}

/// Handle returned by [`EntityCache::subscribe`]; deregisters on request.
pub struct SubscriptionHandle {
  registry: Arc<SubscriberRegistry>,
  hash: String,
  id: u64,
}

impl SubscriptionHandle {
  /// Remove the listener this handle was issued for.
  pub fn unsubscribe(self) {
    self.registry.remove(&self.hash, self.id);
  }
}

/// The public cache surface for one remote table.
///
/// Reads are synchronous and never block on the network; refreshes run on
/// spawned tasks and their results are applied in issuance order. The store
/// behind this cache is only written by the refresh path here and by the
/// mutation coordinator's success paths.
pub struct EntityCache<R: RemoteTable> {
  store: Arc<CacheStore<R::Item>>,
  remote: Arc<R>,
  subscribers: Arc<SubscriberRegistry>,
}

impl<R: RemoteTable> EntityCache<R> {
  /// Create a cache over the given remote table.
  pub fn new(remote: Arc<R>) -> Self {
    Self {
      store: Arc::new(CacheStore::new()),
      remote,
      subscribers: Arc::new(SubscriberRegistry::new()),
    }
  }

  /// Last known value and staleness for a collection.
  ///
  /// Never blocks. A collection that has never been fetched reads as empty
  /// and stale; while a refresh is in flight the previous value is served.
  pub fn get<K: CollectionKey>(&self, key: &K) -> (Vec<R::Item>, bool) {
    self.store.get(&key.cache_hash())
  }

  /// `get`, scheduling a refresh first when the value is absent or stale.
  pub fn ensure<K: CollectionKey>(&self, key: &K) -> (Vec<R::Item>, bool) {
    let hash = key.cache_hash();
    let (entities, stale) = self.store.get(&hash);
    if stale {
      self.refresh(key);
    }
    (entities, stale)
  }

  /// Trigger an asynchronous fetch from the remote store.
  ///
  /// On success the stored sequence is replaced atomically and marked fresh;
  /// on failure the previous value and staleness are left untouched and the
  /// error is surfaced to subscribers. A result that arrives after a newer
  /// refresh has already landed is discarded.
  pub fn refresh<K: CollectionKey>(&self, key: &K) {
    let hash = key.cache_hash();
    let description = key.description();
    let seq = self.store.next_refresh_seq(&hash);
    let store = Arc::clone(&self.store);
    let remote = Arc::clone(&self.remote);
    let subscribers = Arc::clone(&self.subscribers);

    tokio::spawn(async move {
      match remote.list().await {
        Ok(entities) => {
          if store.apply_refresh(&hash, seq, entities) {
            subscribers.notify(&hash, &CacheEvent::Changed);
          } else {
            debug!(collection = %description, seq, "discarding superseded refresh");
          }
        }
        Err(err) => {
          warn!(collection = %description, error = %err, "refresh failed");
          subscribers.notify(&hash, &CacheEvent::RefreshFailed(err.to_string()));
        }
      }
    });
  }

  /// Mark a collection stale and schedule a refresh.
  pub fn invalidate<K: CollectionKey>(&self, key: &K) {
    self.store.mark_stale(&key.cache_hash());
    self.refresh(key);
  }

  /// Register a listener invoked after every content change or failed
  /// refresh of the given collection.
  pub fn subscribe<K, F>(&self, key: &K, listener: F) -> SubscriptionHandle
  where
    K: CollectionKey,
    F: Fn(&CacheEvent) + Send + Sync + 'static,
  {
    let hash = key.cache_hash();
    let id = self.subscribers.add(&hash, Arc::new(listener));
    SubscriptionHandle {
      registry: Arc::clone(&self.subscribers),
      hash,
      id,
    }
  }

  /// When the collection was last successfully refreshed.
  pub fn fetched_at<K: CollectionKey>(&self, key: &K) -> Option<chrono::DateTime<chrono::Utc>> {
    self.store.fetched_at(&key.cache_hash())
  }

  pub(crate) fn remote(&self) -> Arc<R> {
    Arc::clone(&self.remote)
  }

  /// Apply a successful create: prepend the store-returned row and notify.
  pub(crate) fn apply_created(&self, hash: &str, entity: R::Item) {
    self.store.insert_front(hash, entity);
    self.subscribers.notify(hash, &CacheEvent::Changed);
  }

  /// Apply a successful update: replace the matching entity in place.
  pub(crate) fn apply_updated(&self, hash: &str, entity: R::Item) {
    if self.store.replace_entity(hash, entity) {
      self.subscribers.notify(hash, &CacheEvent::Changed);
    }
  }

  /// Remove an entity by key (successful delete, or a not-found eviction).
  pub(crate) fn apply_removed(&self, hash: &str, key: &str) {
    if self.store.remove_entity(hash, key) {
      self.subscribers.notify(hash, &CacheEvent::Changed);
    }
  }
}

impl<R: RemoteTable> Clone for EntityCache<R> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      remote: Arc::clone(&self.remote),
      subscribers: Arc::clone(&self.subscribers),
    }
  }
}
