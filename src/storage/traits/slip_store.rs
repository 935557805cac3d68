//! Slip store trait.

use crate::Result;
use crate::models::{MatchRecord, NormalizedPair, Slip, SlipFingerprint, SlipId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Row counts reported by [`SlipStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of stored slips.
    pub slips: u64,
    /// Number of stored matches, active or not.
    pub matches: u64,
    /// Number of matches that still count for "seen before".
    pub active_matches: u64,
}

/// Durable storage for slips and their matches.
///
/// Implementations are the authoritative source for "seen before" and
/// "identical slip" checks. Every I/O failure must surface as
/// [`crate::Error::StorageUnavailable`].
pub trait SlipStore: Send + Sync {
    /// Returns `true` if any stored slip has this fingerprint.
    fn fingerprint_exists(&self, fingerprint: &SlipFingerprint) -> Result<bool>;

    /// Stores a new slip and returns its identity.
    fn save_slip(&self, user_id: i64, raw_text: &str, fingerprint: &SlipFingerprint)
    -> Result<SlipId>;

    /// Stores one active match per pair, all stamped with the same time.
    fn save_matches(&self, slip_id: SlipId, pairs: &[NormalizedPair]) -> Result<()>;

    /// Returns `true` if an active match with this key exists.
    fn pair_active_exists(&self, pair: &NormalizedPair) -> Result<bool>;

    /// Stores a slip and its matches as one unit.
    ///
    /// Either both the slip and all its matches are stored, or nothing is.
    fn save_submission(
        &self,
        user_id: i64,
        raw_text: &str,
        fingerprint: &SlipFingerprint,
        pairs: &[NormalizedPair],
    ) -> Result<SlipId>;

    /// Deactivates every active match created strictly before `cutoff`.
    ///
    /// Runs as a single bulk update and returns the number of matches changed.
    fn deactivate_matches_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Retrieves a slip by identity.
    fn get_slip(&self, id: SlipId) -> Result<Option<Slip>>;

    /// Lists the matches of a slip in insertion order.
    fn matches_for_slip(&self, id: SlipId) -> Result<Vec<MatchRecord>>;

    /// Returns row counts.
    fn stats(&self) -> Result<StoreStats>;
}
