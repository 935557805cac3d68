//! Classification output handed to the presentation layer.

use super::{NormalizedPair, SlipFingerprint, SlipId};
use serde::Serialize;

/// One annotated input pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRow {
    /// First team, as submitted.
    pub team_a: String,
    /// Second team, as submitted.
    pub team_b: String,
    /// The pair's comparison key.
    pub normalized: NormalizedPair,
    /// The same match already appeared earlier in this slip.
    pub dup_in_slip: bool,
    /// An active match with the same key exists in a stored slip.
    pub seen_before: bool,
}

/// Slip-level summary flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlipFlags {
    /// At least one row has `dup_in_slip`.
    pub any_dup_in_slip: bool,
    /// At least one row has `seen_before`.
    pub any_seen_before: bool,
    /// A slip with the same fingerprint was stored before this one.
    pub identical_slip_seen: bool,
}

impl SlipFlags {
    /// Returns `true` when nothing was flagged.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !self.any_dup_in_slip && !self.any_seen_before && !self.identical_slip_seen
    }
}

/// Result of ingesting one slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlipReport {
    /// Identity of the stored slip.
    pub slip_id: SlipId,
    /// Fingerprint of the stored slip.
    pub fingerprint: SlipFingerprint,
    /// One row per submitted pair, in submission order.
    pub rows: Vec<ClassifiedRow>,
    /// Slip-level flags.
    pub flags: SlipFlags,
}
