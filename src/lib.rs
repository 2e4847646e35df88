//! Client-side data layer for a class-management dashboard.
//!
//! The crate owns the in-memory copy of remote collections and keeps it
//! consistent while create/update/delete operations run against the backend:
//!
//! - [`cache::EntityCache`] serves the last known value of a collection
//!   synchronously and reconciles with the remote store in the background.
//! - [`coordinator::MutationCoordinator`] applies mutations through a
//!   per-collection FIFO queue so completions land in issuance order.
//! - [`filter`] derives a searchable view from a cached sequence.
//!
//! Routing, forms and rendering are supplied by the embedding application;
//! the backend is any table-oriented store implementing [`remote::RemoteTable`].

pub mod cache;
pub mod classes;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod notify;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheEvent, EntityCache, SubscriptionHandle};
pub use coordinator::{MutationCoordinator, MutationKind, MutationRecord, MutationStatus, Validate};
pub use error::MutationError;
