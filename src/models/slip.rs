//! Slip and match types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw `(team A, team B)` pair as submitted.
///
/// Team names are kept exactly as given so they can be shown back to the
/// submitter. Use [`crate::services::PairNormalizer`] to derive the
/// comparison key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    /// First team as written.
    pub team_a: String,
    /// Second team as written.
    pub team_b: String,
}

impl MatchPair {
    /// Creates a new pair.
    #[must_use]
    pub fn new(team_a: impl Into<String>, team_b: impl Into<String>) -> Self {
        Self {
            team_a: team_a.into(),
            team_b: team_b.into(),
        }
    }
}

impl fmt::Display for MatchPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.team_a, self.team_b)
    }
}

/// Canonical key for a match, independent of team order, case and spacing.
///
/// Only produced by the normalizer or read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPair(String);

impl NormalizedPair {
    /// Wraps an already-normalized key.
    pub(crate) const fn from_key(key: String) -> Self {
        Self(key)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded SHA-256 digest over a slip's ordered normalized pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlipFingerprint(String);

impl SlipFingerprint {
    /// Wraps an already-computed hex digest.
    pub(crate) const fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlipFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned slip identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlipId(pub i64);

impl fmt::Display for SlipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted submission. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slip {
    /// Slip identity.
    pub id: SlipId,
    /// Submitter identifier (0 when unknown).
    pub user_id: i64,
    /// The text the slip was built from.
    pub raw_text: String,
    /// Fingerprint of the slip's normalized pairs.
    pub fingerprint: SlipFingerprint,
    /// When the slip was stored.
    pub created_at: DateTime<Utc>,
}

/// A persisted match belonging to one slip.
///
/// `active` starts `true` and is only ever cleared by the expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Row identity.
    pub id: i64,
    /// Owning slip.
    pub slip_id: SlipId,
    /// Normalized match key.
    pub pair: NormalizedPair,
    /// Whether the match still counts for "seen before" checks.
    pub active: bool,
    /// When the match was stored.
    pub created_at: DateTime<Utc>,
}
