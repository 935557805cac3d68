//! Shared `SQLite` infrastructure for the slip store.
//!
//! - [`connection`]: mutex handling and connection pragmas
//! - [`metrics`]: storage operation metrics
//! - [`transaction`]: `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK` wrapper

mod connection;
mod metrics;
mod transaction;

pub use connection::{acquire_lock, configure_connection};
pub use metrics::record_operation_metrics;
pub use transaction::{storage_error, with_immediate_transaction};
