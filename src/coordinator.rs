//! Mutation coordinator: applies create/update/delete against the remote
//! store while keeping the cache consistent.
//!
//! Mutations targeting one collection are serialized through a per-key FIFO
//! queue (one worker task per collection key), so completions are applied to
//! the cache in the order the requests were issued, not the order their
//! network responses arrive. Mutations on different collection keys proceed
//! independently.
//!
//! Every entry point returns a [`MutationRecord`] in a terminal state;
//! failures are values, never panics, and there are no automatic retries.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};

use crate::cache::{CollectionKey, Entity, EntityCache};
use crate::error::MutationError;
use crate::notify::Notifier;
use crate::remote::{RemoteError, RemoteTable};

/// Payloads that are checked locally before any network call is issued.
pub trait Validate {
  fn validate(&self) -> Result<(), MutationError>;
}

/// Which operation a mutation record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
}

/// Terminal state of a mutation. Pending is never observable from outside;
/// the entry points resolve only once the outcome is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationStatus {
  Succeeded,
  Failed(MutationError),
}

/// One completed mutation, as observed by the caller. Nothing is kept after
/// the caller drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
  pub kind: MutationKind,
  /// Human-readable description of the target, e.g. "class 12"
  pub target: String,
  pub status: MutationStatus,
}

impl MutationRecord {
  fn failed(kind: MutationKind, target: String, err: MutationError) -> Self {
    Self {
      kind,
      target,
      status: MutationStatus::Failed(err),
    }
  }

  pub fn is_success(&self) -> bool {
    self.status == MutationStatus::Succeeded
  }

  pub fn error(&self) -> Option<&MutationError> {
    match &self.status {
      MutationStatus::Failed(err) => Some(err),
      MutationStatus::Succeeded => None,
    }
  }
}

type Job = BoxFuture<'static, ()>;

/// Coordinates mutations for one remote table and its cache.
///
/// Owns the per-collection queues; the cache store is only written by this
/// coordinator's success paths and the cache's own refresh path.
pub struct MutationCoordinator<R: RemoteTable> {
  cache: EntityCache<R>,
  remote: Arc<R>,
  notifier: Arc<dyn Notifier>,
  queues: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Job>>>>,
}

impl<R: RemoteTable> MutationCoordinator<R>
where
  R::Draft: Validate,
  R::Patch: Validate,
{
  pub fn new(cache: EntityCache<R>, notifier: Arc<dyn Notifier>) -> Self {
    let remote = cache.remote();
    Self {
      cache,
      remote,
      notifier,
      queues: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// The cache this coordinator keeps consistent.
  pub fn cache(&self) -> &EntityCache<R> {
    &self.cache
  }

  /// Validate and insert a new entity.
  ///
  /// On success the store-returned row (authoritative for generated fields)
  /// is prepended to the cached sequence and subscribers are notified. On
  /// failure the cache is left untouched.
  pub async fn create<K: CollectionKey>(&self, key: &K, draft: R::Draft) -> MutationRecord {
    let target = format!("new {}", R::Item::entity_type());
    if let Err(err) = draft.validate() {
      self.notifier.notify_error(&err.to_string());
      return MutationRecord::failed(MutationKind::Create, target, err);
    }

    let hash = key.cache_hash();
    let cache = self.cache.clone();
    let remote = Arc::clone(&self.remote);
    let notifier = Arc::clone(&self.notifier);
    let job_hash = hash.clone();
    let (done_tx, done_rx) = oneshot::channel();

    let job: Job = Box::pin(async move {
      let status = match remote.insert(&draft).await {
        Ok(row) => {
          cache.apply_created(&job_hash, row);
          notifier.notify_success(&format!("{} created successfully.", R::Item::entity_label()));
          MutationStatus::Succeeded
        }
        Err(err) => {
          let err = MutationError::from(err);
          notifier.notify_error(&err.to_string());
          MutationStatus::Failed(err)
        }
      };
      let _ = done_tx.send(status);
    });

    self.submit(&hash, MutationKind::Create, target, job, done_rx).await
  }

  /// Validate and update the entity with the given key.
  ///
  /// The patch carries editable fields only. On success the matching cached
  /// entity is replaced in place, position unchanged. A not-found outcome
  /// evicts the cached entry, since the cache was already stale.
  pub async fn update<K: CollectionKey>(
    &self,
    key: &K,
    entity_key: &str,
    patch: R::Patch,
  ) -> MutationRecord {
    let target = format!("{} {}", R::Item::entity_type(), entity_key);
    if let Err(err) = patch.validate() {
      self.notifier.notify_error(&err.to_string());
      return MutationRecord::failed(MutationKind::Update, target, err);
    }

    let hash = key.cache_hash();
    let cache = self.cache.clone();
    let remote = Arc::clone(&self.remote);
    let notifier = Arc::clone(&self.notifier);
    let job_hash = hash.clone();
    let entity_key = entity_key.to_string();
    let (done_tx, done_rx) = oneshot::channel();

    let job: Job = Box::pin(async move {
      let status = match remote.update(&entity_key, &patch).await {
        Ok(row) => {
          cache.apply_updated(&job_hash, row);
          notifier.notify_success(&format!("{} updated successfully.", R::Item::entity_label()));
          MutationStatus::Succeeded
        }
        Err(RemoteError::NotFound(missing)) => {
          cache.apply_removed(&job_hash, &missing);
          let err = MutationError::NotFound(missing);
          notifier.notify_error(&err.to_string());
          MutationStatus::Failed(err)
        }
        Err(err) => {
          let err = MutationError::from(err);
          notifier.notify_error(&err.to_string());
          MutationStatus::Failed(err)
        }
      };
      let _ = done_tx.send(status);
    });

    self.submit(&hash, MutationKind::Update, target, job, done_rx).await
  }

  /// Delete the entity with the given key.
  ///
  /// On success (or a not-found outcome, which means the cache was already
  /// stale) the entity is removed from the cached sequence.
  pub async fn delete<K: CollectionKey>(&self, key: &K, entity_key: &str) -> MutationRecord {
    let target = format!("{} {}", R::Item::entity_type(), entity_key);
    let hash = key.cache_hash();
    let cache = self.cache.clone();
    let remote = Arc::clone(&self.remote);
    let notifier = Arc::clone(&self.notifier);
    let job_hash = hash.clone();
    let entity_key = entity_key.to_string();
    let (done_tx, done_rx) = oneshot::channel();

    let job: Job = Box::pin(async move {
      let status = match remote.delete(&entity_key).await {
        Ok(()) => {
          cache.apply_removed(&job_hash, &entity_key);
          notifier.notify_success(&format!("{} deleted successfully.", R::Item::entity_label()));
          MutationStatus::Succeeded
        }
        Err(RemoteError::NotFound(missing)) => {
          cache.apply_removed(&job_hash, &missing);
          let err = MutationError::NotFound(missing);
          notifier.notify_error(&err.to_string());
          MutationStatus::Failed(err)
        }
        Err(err) => {
          let err = MutationError::from(err);
          notifier.notify_error(&err.to_string());
          MutationStatus::Failed(err)
        }
      };
      let _ = done_tx.send(status);
    });

    self.submit(&hash, MutationKind::Delete, target, job, done_rx).await
  }

  fn lock_queues(&self) -> MutexGuard<'_, HashMap<String, mpsc::UnboundedSender<Job>>> {
    match self.queues.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  /// The FIFO queue for one collection, spawning its worker on first use.
  fn sender_for(&self, hash: &str) -> mpsc::UnboundedSender<Job> {
    let mut queues = self.lock_queues();
    queues
      .entry(hash.to_string())
      .or_insert_with(|| {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
          // Jobs run to completion one at a time; this is what serializes
          // mutations per collection key.
          while let Some(job) = rx.recv().await {
            job.await;
          }
        });
        tx
      })
      .clone()
  }

  async fn submit(
    &self,
    hash: &str,
    kind: MutationKind,
    target: String,
    job: Job,
    done_rx: oneshot::Receiver<MutationStatus>,
  ) -> MutationRecord {
    if self.sender_for(hash).send(job).is_err() {
      return MutationRecord::failed(kind, target, MutationError::Remote("mutation queue closed".to_string()));
    }
    match done_rx.await {
      Ok(status) => MutationRecord { kind, target, status },
      Err(_) => MutationRecord::failed(
        kind,
        target,
        MutationError::Remote("mutation was cancelled".to_string()),
      ),
    }
  }
}

impl<R: RemoteTable> Clone for MutationCoordinator<R> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      remote: Arc::clone(&self.remote),
      notifier: Arc::clone(&self.notifier),
      queues: Arc::clone(&self.queues),
    }
  }
}
