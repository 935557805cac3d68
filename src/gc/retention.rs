//! Retention window and expiry sweep.
//!
//! # Configuration
//!
//! The window can be set via:
//! - Environment variable: `SLIPCHECK_EXPIRE_DAYS` (default: 2)
//! - Config file: `retention_days = 2`
//! - CLI: `--expire-days 2`, or `/expiredays 2` in a session
//!
//! A window of 0 days disables expiry.
//!
//! # Example
//!
//! ```rust
//! use slipcheck::gc::{ExpiryManager, RetentionWindow};
//! use slipcheck::storage::SqliteSlipStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteSlipStore::in_memory()?);
//! let window = Arc::new(RetentionWindow::new(2));
//! let expiry = ExpiryManager::new(store, window);
//!
//! let deactivated = expiry.sweep_expired(chrono::Utc::now())?;
//! assert_eq!(deactivated, 0);
//! # Ok::<(), slipcheck::Error>(())
//! ```

use crate::storage::SlipStore;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Environment variable for the retention window in days.
pub const RETENTION_DAYS_ENV: &str = "SLIPCHECK_EXPIRE_DAYS";

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 2;

/// Parses a retention window coming from outside the process.
///
/// Negative integers clamp to 0. Anything that is not an integer is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `value` is not an integer.
///
/// ```rust
/// use slipcheck::gc::parse_retention_days;
///
/// assert_eq!(parse_retention_days(" 3 ").unwrap(), 3);
/// assert_eq!(parse_retention_days("-4").unwrap(), 0);
/// assert!(parse_retention_days("two").is_err());
/// ```
pub fn parse_retention_days(value: &str) -> Result<u32> {
    let days: i64 = value.trim().parse().map_err(|_| {
        Error::InvalidInput(format!("retention days must be an integer, got '{value}'"))
    })?;
    Ok(clamp_days(days))
}

fn clamp_days(days: i64) -> u32 {
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Process-wide retention window in days.
///
/// Read-mostly shared state; updates replace the value atomically and only
/// affect sweeps that start afterwards.
#[derive(Debug)]
pub struct RetentionWindow {
    days: AtomicU32,
}

impl RetentionWindow {
    /// Creates a window of `days` days.
    #[must_use]
    pub const fn new(days: u32) -> Self {
        Self {
            days: AtomicU32::new(days),
        }
    }

    /// Returns the current window in days.
    #[must_use]
    pub fn days(&self) -> u32 {
        self.days.load(Ordering::Relaxed)
    }

    /// Sets the window, clamping negative values to 0.
    pub fn set_days(&self, days: i64) {
        self.days.store(clamp_days(days), Ordering::Relaxed);
    }

    /// Returns `true` when expiry is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.days() == 0
    }

    /// Returns the cutoff for `now`, or `None` when nothing can be stale.
    ///
    /// That is the case when expiry is disabled, or when the window reaches
    /// further back than any representable time. Matches created strictly
    /// before the cutoff are stale.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.days() {
            0 => None,
            days => {
                Duration::try_days(i64::from(days)).and_then(|window| now.checked_sub_signed(window))
            },
        }
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_DAYS)
    }
}

/// Deactivates matches that fell out of the retention window.
pub struct ExpiryManager<S: SlipStore> {
    store: Arc<S>,
    window: Arc<RetentionWindow>,
}

impl<S: SlipStore> ExpiryManager<S> {
    /// Creates an expiry manager over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, window: Arc<RetentionWindow>) -> Self {
        Self { store, window }
    }

    /// Returns the shared retention window handle.
    #[must_use]
    pub fn window(&self) -> Arc<RetentionWindow> {
        Arc::clone(&self.window)
    }

    /// Returns the current retention window in days.
    #[must_use]
    pub fn retention_window(&self) -> u32 {
        self.window.days()
    }

    /// Sets the retention window. Negative values clamp to 0 (disabled).
    pub fn set_retention_window(&self, days: i64) {
        self.window.set_days(days);
        info!(
            retention_days = self.window.days(),
            "Retention window updated"
        );
    }

    /// Deactivates every active match created before `now - window`.
    ///
    /// No-op when the window is 0. Runs as one bulk update, so a failure
    /// leaves every match as it was. Returns the number of matches deactivated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the update fails.
    #[instrument(
        name = "slipcheck.gc.sweep",
        skip(self),
        fields(retention_days = self.window.days())
    )]
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let Some(cutoff) = self.window.cutoff(now) else {
            debug!("No match can be older than the retention window, skipping sweep");
            return Ok(0);
        };

        let start = Instant::now();
        let deactivated = self.store.deactivate_matches_before(cutoff)?;

        metrics::counter!("expiry_sweeps_total").increment(1);
        metrics::counter!("expiry_deactivated_total")
            .increment(u64::try_from(deactivated).unwrap_or(u64::MAX));
        metrics::histogram!("expiry_sweep_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        if deactivated > 0 {
            info!(deactivated, %cutoff, "Deactivated expired matches");
        } else {
            debug!(%cutoff, "No expired matches");
        }

        Ok(deactivated)
    }
}
