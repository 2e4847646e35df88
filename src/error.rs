//! Error surface for cache and mutation operations.
//!
//! Errors are plain values carried in a terminal [`MutationStatus`]; nothing
//! panics across the cache/coordinator boundary and callers decide how to
//! present failures.
//!
//! [`MutationStatus`]: crate::coordinator::MutationStatus

use thiserror::Error;

use crate::remote::RemoteError;

/// Why a mutation reached a failed terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
  /// Local, pre-network rejection of a payload. No request was issued.
  #[error("{message}")]
  Validation {
    /// Which field failed validation
    field: &'static str,
    message: String,
  },

  /// The remote store reported a failure; the message is carried verbatim.
  #[error("{0}")]
  Remote(String),

  /// The update/delete target no longer exists remotely. The cached entry
  /// is evicted when this is observed, since the cache was already stale.
  #[error("'{0}' no longer exists")]
  NotFound(String),
}

impl MutationError {
  /// Shorthand for a field-level validation failure.
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation {
      field,
      message: message.into(),
    }
  }
}

impl From<RemoteError> for MutationError {
  fn from(err: RemoteError) -> Self {
    match err {
      RemoteError::Store(message) => Self::Remote(message),
      RemoteError::NotFound(key) => Self::NotFound(key),
    }
  }
}
