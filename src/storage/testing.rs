//! Store double that fails one named operation.

use crate::models::{MatchRecord, NormalizedPair, Slip, SlipFingerprint, SlipId};
use crate::storage::{SlipStore, SqliteSlipStore, StoreStats};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// Wraps an in-memory store and fails `fail_on` as if the disk went away.
pub struct FailingStore {
    inner: SqliteSlipStore,
    fail_on: &'static str,
}

impl FailingStore {
    pub fn new(fail_on: &'static str) -> Result<Self> {
        Ok(Self {
            inner: SqliteSlipStore::in_memory()?,
            fail_on,
        })
    }

    pub const fn inner(&self) -> &SqliteSlipStore {
        &self.inner
    }

    fn check(&self, operation: &str) -> Result<()> {
        if operation == self.fail_on {
            return Err(Error::StorageUnavailable {
                operation: operation.to_string(),
                cause: "disk I/O error".to_string(),
            });
        }
        Ok(())
    }
}

impl SlipStore for FailingStore {
    fn fingerprint_exists(&self, fingerprint: &SlipFingerprint) -> Result<bool> {
        self.check("fingerprint_exists")?;
        self.inner.fingerprint_exists(fingerprint)
    }

    fn save_slip(&self, user_id: i64, raw_text: &str, fingerprint: &SlipFingerprint) -> Result<SlipId> {
        self.check("save_slip")?;
        self.inner.save_slip(user_id, raw_text, fingerprint)
    }

    fn save_matches(&self, slip_id: SlipId, pairs: &[NormalizedPair]) -> Result<()> {
        self.check("save_matches")?;
        self.inner.save_matches(slip_id, pairs)
    }

    fn pair_active_exists(&self, pair: &NormalizedPair) -> Result<bool> {
        self.check("pair_active_exists")?;
        self.inner.pair_active_exists(pair)
    }

    fn save_submission(
        &self,
        user_id: i64,
        raw_text: &str,
        fingerprint: &SlipFingerprint,
        pairs: &[NormalizedPair],
    ) -> Result<SlipId> {
        self.check("save_submission")?;
        self.inner.save_submission(user_id, raw_text, fingerprint, pairs)
    }

    fn deactivate_matches_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.check("deactivate_matches_before")?;
        self.inner.deactivate_matches_before(cutoff)
    }

    fn get_slip(&self, id: SlipId) -> Result<Option<Slip>> {
        self.check("get_slip")?;
        self.inner.get_slip(id)
    }

    fn matches_for_slip(&self, id: SlipId) -> Result<Vec<MatchRecord>> {
        self.check("matches_for_slip")?;
        self.inner.matches_for_slip(id)
    }

    fn stats(&self) -> Result<StoreStats> {
        self.check("stats")?;
        self.inner.stats()
    }
}
