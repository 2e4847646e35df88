//! Generic in-memory caching layer for remote collections.
//!
//! The cache owns the client-side copy of each collection and:
//! - serves the last known value synchronously (possibly stale, never blocking)
//! - reconciles with the remote store through background refreshes
//! - applies refresh results in issuance order (a superseded refresh is
//!   discarded rather than clobbering a newer one)
//! - fans out change notifications to registered subscribers

mod layer;
mod store;
mod traits;

pub use layer::{CacheEvent, EntityCache, SubscriptionHandle};
pub use traits::{CollectionKey, Entity};
