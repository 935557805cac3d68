//! Duplicate classification.
//!
//! Annotates each pair of an incoming slip with two independent flags:
//!
//! - **`dup_in_slip`**: the same match already appeared earlier in this slip.
//!   The first occurrence is never flagged.
//! - **`seen_before`**: an *active* match with the same key is stored. The
//!   store is queried per row, and the slip being classified is not stored
//!   yet, so a slip never matches its own pairs.
//!
//! It also reports whether the whole slip (same pairs, same order) was
//! stored before.

use crate::Result;
use crate::models::{ClassifiedRow, MatchPair, NormalizedPair, SlipFingerprint, SlipFlags};
use crate::storage::SlipStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

use super::fingerprint::SlipFingerprinter;
use super::normalizer::PairNormalizer;

/// Output of [`DuplicateClassifier::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// One row per input pair, in input order.
    pub rows: Vec<ClassifiedRow>,
    /// Slip-level flags.
    pub flags: SlipFlags,
    /// Fingerprint of the slip.
    pub fingerprint: SlipFingerprint,
    /// Normalized keys in input order, ready to persist.
    pub normalized: Vec<NormalizedPair>,
}

/// Classifies slips against themselves and the store.
pub struct DuplicateClassifier<S: SlipStore> {
    store: Arc<S>,
}

impl<S: SlipStore> DuplicateClassifier<S> {
    /// Creates a classifier backed by `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Classifies `pairs` in submission order.
    ///
    /// Read-only: nothing is written to the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StorageUnavailable`] if a store lookup fails.
    #[instrument(name = "slipcheck.classify", skip_all, fields(pairs = pairs.len()))]
    pub fn classify(&self, pairs: &[MatchPair]) -> Result<Classification> {
        let normalized: Vec<NormalizedPair> =
            pairs.iter().map(PairNormalizer::normalize_pair).collect();
        let fingerprint = SlipFingerprinter::fingerprint(&normalized);

        let mut flags = SlipFlags {
            identical_slip_seen: self.store.fingerprint_exists(&fingerprint)?,
            ..SlipFlags::default()
        };

        let mut seen_in_slip: HashSet<&NormalizedPair> = HashSet::with_capacity(normalized.len());
        let mut rows = Vec::with_capacity(pairs.len());

        for (pair, key) in pairs.iter().zip(&normalized) {
            let dup_in_slip = !seen_in_slip.insert(key);
            let seen_before = self.store.pair_active_exists(key)?;

            flags.any_dup_in_slip |= dup_in_slip;
            flags.any_seen_before |= seen_before;

            rows.push(ClassifiedRow {
                team_a: pair.team_a.clone(),
                team_b: pair.team_b.clone(),
                normalized: key.clone(),
                dup_in_slip,
                seen_before,
            });
        }

        tracing::debug!(
            fingerprint = %fingerprint,
            identical = flags.identical_slip_seen,
            any_dup_in_slip = flags.any_dup_in_slip,
            any_seen_before = flags.any_seen_before,
            "Slip classified"
        );

        Ok(Classification {
            rows,
            flags,
            fingerprint,
            normalized,
        })
    }
}
