//! Remote persistence endpoint.
//!
//! The core depends on exactly four table operations: select-with-ordering,
//! insert-returning-row, update-by-key-returning-row and delete-by-key. The
//! [`RemoteTable`] trait captures them; [`HttpTable`] implements the trait
//! against a PostgREST-style REST backend.

mod http;
mod table;

pub use http::HttpTable;
pub use table::{RemoteError, RemoteTable};
