//! Storage layer.
//!
//! - [`traits`]: the [`SlipStore`] contract
//! - [`persistence`]: the `SQLite` implementation
//! - [`sqlite`]: shared connection, transaction and metrics helpers

// Dropping the connection guard slightly early provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod persistence;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use persistence::SqliteSlipStore;
pub use traits::{SlipStore, StoreStats};
