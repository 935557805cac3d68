//! # Slipcheck
//!
//! Duplicate detection for sports bet slips.
//!
//! Slipcheck takes a slip (a list of match pairs such as `Arsenal vs Chelsea`),
//! reduces every pair to an order- and case-insensitive key, and reports which
//! matches repeat inside the slip, which already appear in recently submitted
//! slips, and whether the exact same slip was sent before. Submissions are
//! persisted in `SQLite`; matches stop counting as "seen" once they fall out of
//! a configurable retention window.
//!
//! ## Pipeline
//!
//! ```text
//! raw pairs ─▶ ExpiryManager::sweep_expired ─▶ DuplicateClassifier::classify
//!           ─▶ SlipStore::save_submission ─▶ SlipReport
//! ```
//!
//! ## Example
//!
//! ```rust
//! use slipcheck::services::IngestService;
//! use slipcheck::storage::SqliteSlipStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteSlipStore::in_memory()?);
//! let service = IngestService::new(store, 2);
//!
//! let first = service.ingest_text(0, "Team One vs Team Two")?;
//! let second = service.ingest_text(0, "team two vs team one")?;
//!
//! let report = second.report().expect("slip was processed");
//! assert!(first.report().is_some());
//! assert!(report.rows[0].seen_before);
//! assert!(!report.flags.identical_slip_seen);
//! # Ok::<(), slipcheck::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod clock;
pub mod config;
pub mod gc;
pub mod ingest;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use config::SlipcheckConfig;
pub use gc::{ExpiryManager, RetentionWindow};
pub use models::{
    ClassifiedRow, MatchPair, MatchRecord, NormalizedPair, Slip, SlipFingerprint, SlipFlags,
    SlipId, SlipReport,
};
pub use services::{DuplicateClassifier, IngestOutcome, IngestService};
pub use storage::{SlipStore, SqliteSlipStore};

/// Error type for slipcheck operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed retention values, bad CLI arguments |
/// | `StorageUnavailable` | Any `SQLite` read or write fails |
/// | `OperationFailed` | Config file I/O, HTTP client setup, logging setup |
///
/// An empty slip is not an error: see [`IngestOutcome::NothingToProcess`].
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A retention window value is not an integer
    /// - A CLI or session command is missing a required argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The slip store could not be read or written.
    ///
    /// Fatal to the current ingestion. The submission is rolled back, so
    /// callers can safely retry the whole request.
    #[error("storage unavailable during '{operation}': {cause}")]
    StorageUnavailable {
        /// The storage operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation outside the store failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns `true` if this error came from the slip store.
    #[must_use]
    pub const fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

/// Result type alias for slipcheck operations.
pub type Result<T> = std::result::Result<T, Error>;
