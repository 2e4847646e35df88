//! Table operations the cache and coordinator depend on.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::cache::Entity;

/// Failure reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
  /// Network or store failure; the store's message is carried verbatim
  #[error("{0}")]
  Store(String),

  /// The keyed row does not exist remotely
  #[error("'{0}' no longer exists")]
  NotFound(String),
}

/// A table-oriented remote store.
///
/// The store is the single source of truth: it generates identifiers and
/// default fields, and the rows it returns are authoritative. One
/// implementation covers one table; the ordering of `list` is a property of
/// the table (e.g., newest first).
#[async_trait]
pub trait RemoteTable: Send + Sync + 'static {
  /// Row type this table holds
  type Item: Entity;
  /// Creation payload
  type Draft: Serialize + Send + Sync + 'static;
  /// Update payload, restricted to editable fields
  type Patch: Serialize + Send + Sync + 'static;

  /// Fetch all rows, ordered.
  async fn list(&self) -> Result<Vec<Self::Item>, RemoteError>;

  /// Insert a row and return it as stored (with generated fields).
  async fn insert(&self, draft: &Self::Draft) -> Result<Self::Item, RemoteError>;

  /// Update the row with the given key and return it as stored.
  async fn update(&self, key: &str, patch: &Self::Patch) -> Result<Self::Item, RemoteError>;

  /// Delete the row with the given key.
  async fn delete(&self, key: &str) -> Result<(), RemoteError>;
}
