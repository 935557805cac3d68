//! Expiry of stale matches.
//!
//! Matches only count as "seen before" while they are younger than the
//! retention window. The [`ExpiryManager`] flips older matches to inactive
//! at the start of every ingestion.

mod retention;

pub use retention::{
    DEFAULT_RETENTION_DAYS, ExpiryManager, RETENTION_DAYS_ENV, RetentionWindow,
    parse_retention_days,
};
