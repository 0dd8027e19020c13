//! SQLite backend for the Pact agreement store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutation runs inside an
//! `IMMEDIATE` transaction, which makes the agreement row the unit of mutual
//! exclusion across connections and processes.

mod directory;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
