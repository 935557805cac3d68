//! Persistence backends for slips and matches.

mod sqlite;

pub use sqlite::SqliteSlipStore;
