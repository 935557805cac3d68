//! Connection handling for the `SQLite` slip store.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Milliseconds `SQLite` waits on a locked database before giving up.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Acquires the connection mutex, recovering from poison.
///
/// A panic while holding the lock leaves the connection usable: any open
/// transaction is rolled back by the next `BEGIN IMMEDIATE` failing or by
/// `SQLite` itself when the statement is dropped.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Applies connection pragmas.
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: durable at transaction boundaries under WAL
/// - **`busy_timeout`**: waits for locks held by other processes
/// - **`foreign_keys`**: matches must reference an existing slip
///
/// # Errors
///
/// Returns [`Error::StorageUnavailable`] if foreign key enforcement cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal", or "memory" for in-memory databases)
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS);

    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| Error::StorageUnavailable {
            operation: "enable_foreign_keys".to_string(),
            cause: e.to_string(),
        })?;

    Ok(())
}
