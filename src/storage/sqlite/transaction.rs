//! Explicit transaction handling.

use crate::{Error, Result};
use rusqlite::Connection;

/// Builds a `map_err` adapter that tags a rusqlite error with the failing operation.
pub fn storage_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::StorageUnavailable {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// Runs `body` inside `BEGIN IMMEDIATE` ... `COMMIT`.
///
/// Takes the write lock up front so concurrent writers queue on `busy_timeout`
/// instead of failing halfway. Any error from `body` rolls the transaction back.
///
/// # Errors
///
/// Returns [`Error::StorageUnavailable`] if the transaction cannot be started or
/// committed, or whatever `body` returned.
pub fn with_immediate_transaction<T>(
    conn: &Connection,
    body: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(storage_error("begin_transaction"))?;

    match body(conn) {
        Ok(value) => {
            if let Err(e) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(storage_error("commit_transaction")(e));
            }
            Ok(value)
        },
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        },
    }
}
