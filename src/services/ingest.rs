//! Slip ingestion pipeline.
//!
//! One ingestion is a single sequential unit of work:
//!
//! 1. Sweep matches that fell out of the retention window
//! 2. Classify the pairs against the slip itself and the store
//! 3. Persist the slip and its matches in one transaction
//!
//! Classification always runs before persistence so a slip never counts as
//! "seen before" because of its own matches.

use crate::clock::{Clock, SystemClock};
use crate::gc::{ExpiryManager, RetentionWindow};
use crate::ingest::{CouponSource, parse_bet_slip};
use crate::models::{MatchPair, SlipReport};
use crate::storage::SlipStore;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use super::deduplication::DuplicateClassifier;

/// Result of an ingestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// No pairs were found; nothing was swept or stored.
    NothingToProcess,
    /// The slip was classified and stored.
    Processed(SlipReport),
}

impl IngestOutcome {
    /// Returns the report if the slip was processed.
    #[must_use]
    pub const fn report(&self) -> Option<&SlipReport> {
        match self {
            Self::Processed(report) => Some(report),
            Self::NothingToProcess => None,
        }
    }

    /// Returns `true` if no pairs were found.
    #[must_use]
    pub const fn is_nothing_to_process(&self) -> bool {
        matches!(self, Self::NothingToProcess)
    }
}

/// Runs the sweep, classify, persist pipeline.
///
/// # Example
///
/// ```rust
/// use slipcheck::MatchPair;
/// use slipcheck::services::IngestService;
/// use slipcheck::storage::SqliteSlipStore;
/// use std::sync::Arc;
///
/// let service = IngestService::new(Arc::new(SqliteSlipStore::in_memory()?), 2);
/// let pairs = [MatchPair::new("A", "B"), MatchPair::new("B", "A")];
///
/// let outcome = service.ingest(42, "A vs B\nB vs A", &pairs)?;
/// let report = outcome.report().expect("pairs were given");
/// assert!(!report.rows[0].dup_in_slip);
/// assert!(report.rows[1].dup_in_slip);
/// # Ok::<(), slipcheck::Error>(())
/// ```
pub struct IngestService<S: SlipStore> {
    store: Arc<S>,
    expiry: ExpiryManager<S>,
    classifier: DuplicateClassifier<S>,
    clock: Arc<dyn Clock>,
}

impl<S: SlipStore> IngestService<S> {
    /// Creates a service with its own retention window of `retention_days`.
    #[must_use]
    pub fn new(store: Arc<S>, retention_days: u32) -> Self {
        Self::with_window(store, Arc::new(RetentionWindow::new(retention_days)))
    }

    /// Creates a service sharing an existing retention window.
    #[must_use]
    pub fn with_window(store: Arc<S>, window: Arc<RetentionWindow>) -> Self {
        Self {
            expiry: ExpiryManager::new(Arc::clone(&store), window),
            classifier: DuplicateClassifier::new(Arc::clone(&store)),
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to compute expiry cutoffs.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the expiry manager, e.g. to change the retention window.
    #[must_use]
    pub const fn expiry(&self) -> &ExpiryManager<S> {
        &self.expiry
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Ingests an already-extracted list of pairs.
    ///
    /// `raw_text` is stored with the slip as submitted. An empty `pairs`
    /// slice returns [`IngestOutcome::NothingToProcess`] without touching
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StorageUnavailable`] if any store operation fails.
    /// Nothing from this slip is persisted in that case.
    #[instrument(
        name = "slipcheck.ingest",
        skip_all,
        fields(user_id = user_id, pairs = pairs.len())
    )]
    pub fn ingest(&self, user_id: i64, raw_text: &str, pairs: &[MatchPair]) -> Result<IngestOutcome> {
        if pairs.is_empty() {
            metrics::counter!("slips_ingested_total", "outcome" => "empty").increment(1);
            return Ok(IngestOutcome::NothingToProcess);
        }

        let start = Instant::now();
        self.expiry.sweep_expired(self.clock.now())?;

        let classification = self.classifier.classify(pairs)?;
        let slip_id = self.store.save_submission(
            user_id,
            raw_text,
            &classification.fingerprint,
            &classification.normalized,
        )?;

        let flags = classification.flags;
        metrics::counter!("slips_ingested_total", "outcome" => "processed").increment(1);
        if flags.identical_slip_seen {
            metrics::counter!("slip_flags_total", "flag" => "identical_slip_seen").increment(1);
        }
        if flags.any_dup_in_slip {
            metrics::counter!("slip_flags_total", "flag" => "dup_in_slip").increment(1);
        }
        if flags.any_seen_before {
            metrics::counter!("slip_flags_total", "flag" => "seen_before").increment(1);
        }
        metrics::histogram!("ingest_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);

        info!(
            slip_id = %slip_id,
            identical_slip_seen = flags.identical_slip_seen,
            any_dup_in_slip = flags.any_dup_in_slip,
            any_seen_before = flags.any_seen_before,
            "Slip ingested"
        );

        Ok(IngestOutcome::Processed(SlipReport {
            slip_id,
            fingerprint: classification.fingerprint,
            rows: classification.rows,
            flags,
        }))
    }

    /// Parses free text into pairs and ingests them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StorageUnavailable`] if any store operation fails.
    pub fn ingest_text(&self, user_id: i64, text: &str) -> Result<IngestOutcome> {
        let text = text.trim();
        let pairs = parse_bet_slip(text);
        self.ingest(user_id, text, &pairs)
    }

    /// Decodes a coupon code into pairs and ingests them.
    ///
    /// The stored raw text is rebuilt as one `A vs B` line per pair.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error if decoding fails, or
    /// [`crate::Error::StorageUnavailable`] if any store operation fails.
    pub fn ingest_coupon(
        &self,
        user_id: i64,
        code: &str,
        source: &dyn CouponSource,
    ) -> Result<IngestOutcome> {
        let pairs = source.decode(code)?;
        let raw_text = pairs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.ingest(user_id, &raw_text, &pairs)
    }
}
