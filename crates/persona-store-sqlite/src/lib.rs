//! SQLite backend for the persona registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;
mod ticket;

pub mod error;

pub use error::{Error, Result};
pub use store::{MATRICULA_ATTEMPTS, SqliteStore, StoreTimeouts};

#[cfg(test)]
mod tests;
