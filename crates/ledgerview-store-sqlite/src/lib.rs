//! SQLite backend for the ledgerview chain index.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on dedicated threads
//! without blocking the async runtime. One [`SqliteStore`] implements every
//! trait in [`ledgerview_core::store`].

mod chain;
mod encode;
mod ratings;
mod rollback;
mod schema;
mod store;
mod txn;
mod utxo;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
