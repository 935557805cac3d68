//! `SQLite`-based slip store.
//!
//! Stores slips and their matches in two tables:
//!
//! ```text
//! slips   (id, user_id, raw_text, fingerprint, created_at)
//! matches (id, slip_id -> slips.id, norm_pair, active, created_at)
//! ```
//!
//! Timestamps are Unix seconds. Fingerprint and normalized-pair lookups are
//! indexed because every ingestion queries them.

use crate::clock::{Clock, SystemClock};
use crate::models::{MatchRecord, NormalizedPair, Slip, SlipFingerprint, SlipId};
use crate::storage::sqlite::{
    acquire_lock, configure_connection, record_operation_metrics, storage_error,
    with_immediate_transaction,
};
use crate::storage::traits::{SlipStore, StoreStats};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::instrument;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS slips (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        raw_text TEXT NOT NULL,
        fingerprint TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS matches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slip_id INTEGER NOT NULL REFERENCES slips(id),
        norm_pair TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_slips_fingerprint ON slips(fingerprint);
    CREATE INDEX IF NOT EXISTS idx_matches_norm_pair_active ON matches(norm_pair, active);
    CREATE INDEX IF NOT EXISTS idx_matches_active_created ON matches(active, created_at);
    CREATE INDEX IF NOT EXISTS idx_matches_slip_id ON matches(slip_id);
";

fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| {
        tracing::warn!(created_at = secs, "Stored timestamp out of range, using Unix epoch");
        DateTime::UNIX_EPOCH
    })
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// `SQLite`-based [`SlipStore`].
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` so operations from different threads are
/// serialized within the process. Writes run in `BEGIN IMMEDIATE`
/// transactions, and WAL mode plus `busy_timeout` handle other processes
/// sharing the same database file.
pub struct SqliteSlipStore {
    /// Protected by Mutex because `rusqlite::Connection` is not `Sync`.
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
    /// Source of creation timestamps.
    clock: Arc<dyn Clock>,
}

impl SqliteSlipStore {
    /// Opens (or creates) a store at `db_path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::StorageUnavailable {
                operation: "create_data_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }

        let conn = Connection::open(&db_path).map_err(storage_error("open_sqlite"))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
            clock: Arc::new(SystemClock),
        };

        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error("open_sqlite_in_memory"))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
            clock: Arc::new(SystemClock),
        };

        store.initialize()?;
        Ok(store)
    }

    /// Replaces the clock used to stamp new slips and matches.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;
        conn.execute_batch(SCHEMA)
            .map_err(storage_error("create_schema"))?;
        Ok(())
    }

    /// Runs `body` under the connection lock and records metrics for it.
    fn run<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = {
            let conn = acquire_lock(&self.conn);
            body(&conn)
        };
        record_operation_metrics(operation, start, result.is_ok());
        if let Err(e) = &result {
            tracing::error!(operation, error = %e, "Slip store operation failed");
        }
        result
    }

    fn insert_slip(
        conn: &Connection,
        user_id: i64,
        raw_text: &str,
        fingerprint: &SlipFingerprint,
        now: DateTime<Utc>,
    ) -> Result<SlipId> {
        conn.execute(
            "INSERT INTO slips (user_id, raw_text, fingerprint, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, raw_text, fingerprint.as_str(), now.timestamp()],
        )
        .map_err(storage_error("insert_slip"))?;
        Ok(SlipId(conn.last_insert_rowid()))
    }

    fn insert_matches(
        conn: &Connection,
        slip_id: SlipId,
        pairs: &[NormalizedPair],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO matches (slip_id, norm_pair, active, created_at) VALUES (?1, ?2, 1, ?3)",
            )
            .map_err(storage_error("prepare_insert_match"))?;
        let created_at = now.timestamp();
        for pair in pairs {
            stmt.execute(params![slip_id.0, pair.as_str(), created_at])
                .map_err(storage_error("insert_match"))?;
        }
        Ok(())
    }
}

impl SlipStore for SqliteSlipStore {
    #[instrument(skip_all, fields(backend = "sqlite", fingerprint = %fingerprint))]
    fn fingerprint_exists(&self, fingerprint: &SlipFingerprint) -> Result<bool> {
        self.run("fingerprint_exists", |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM slips WHERE fingerprint = ?1 LIMIT 1",
                    params![fingerprint.as_str()],
                    |_| Ok(()),
                )
                .optional()
                .map_err(storage_error("fingerprint_exists"))?;
            Ok(found.is_some())
        })
    }

    #[instrument(skip_all, fields(backend = "sqlite", user_id = user_id, raw_text_len = raw_text.len()))]
    fn save_slip(
        &self,
        user_id: i64,
        raw_text: &str,
        fingerprint: &SlipFingerprint,
    ) -> Result<SlipId> {
        let now = self.clock.now();
        self.run("save_slip", |conn| {
            Self::insert_slip(conn, user_id, raw_text, fingerprint, now)
        })
    }

    #[instrument(skip_all, fields(backend = "sqlite", slip_id = %slip_id, count = pairs.len()))]
    fn save_matches(&self, slip_id: SlipId, pairs: &[NormalizedPair]) -> Result<()> {
        let now = self.clock.now();
        self.run("save_matches", |conn| {
            with_immediate_transaction(conn, |tx| Self::insert_matches(tx, slip_id, pairs, now))
        })
    }

    #[instrument(skip_all, fields(backend = "sqlite", pair = %pair))]
    fn pair_active_exists(&self, pair: &NormalizedPair) -> Result<bool> {
        self.run("pair_active_exists", |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM matches WHERE norm_pair = ?1 AND active = 1 LIMIT 1",
                    params![pair.as_str()],
                    |_| Ok(()),
                )
                .optional()
                .map_err(storage_error("pair_active_exists"))?;
            Ok(found.is_some())
        })
    }

    #[instrument(
        skip_all,
        fields(backend = "sqlite", fingerprint = %fingerprint, count = pairs.len())
    )]
    fn save_submission(
        &self,
        user_id: i64,
        raw_text: &str,
        fingerprint: &SlipFingerprint,
        pairs: &[NormalizedPair],
    ) -> Result<SlipId> {
        let now = self.clock.now();
        self.run("save_submission", |conn| {
            with_immediate_transaction(conn, |tx| {
                let slip_id = Self::insert_slip(tx, user_id, raw_text, fingerprint, now)?;
                Self::insert_matches(tx, slip_id, pairs, now)?;
                Ok(slip_id)
            })
        })
    }

    #[instrument(skip_all, fields(backend = "sqlite", cutoff = %cutoff))]
    fn deactivate_matches_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.run("deactivate_matches_before", |conn| {
            conn.execute(
                "UPDATE matches SET active = 0 WHERE active = 1 AND created_at < ?1",
                params![cutoff.timestamp()],
            )
            .map_err(storage_error("deactivate_matches_before"))
        })
    }

    #[instrument(skip_all, fields(backend = "sqlite", slip_id = %id))]
    fn get_slip(&self, id: SlipId) -> Result<Option<Slip>> {
        self.run("get_slip", |conn| {
            conn.query_row(
                "SELECT id, user_id, raw_text, fingerprint, created_at FROM slips WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(Slip {
                        id: SlipId(row.get(0)?),
                        user_id: row.get(1)?,
                        raw_text: row.get(2)?,
                        fingerprint: SlipFingerprint::from_hex(row.get(3)?),
                        created_at: to_datetime(row.get(4)?),
                    })
                },
            )
            .optional()
            .map_err(storage_error("get_slip"))
        })
    }

    #[instrument(skip_all, fields(backend = "sqlite", slip_id = %id))]
    fn matches_for_slip(&self, id: SlipId) -> Result<Vec<MatchRecord>> {
        self.run("matches_for_slip", |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, slip_id, norm_pair, active, created_at
                     FROM matches WHERE slip_id = ?1 ORDER BY id",
                )
                .map_err(storage_error("prepare_matches_for_slip"))?;

            let rows = stmt
                .query_map(params![id.0], |row| {
                    Ok(MatchRecord {
                        id: row.get(0)?,
                        slip_id: SlipId(row.get(1)?),
                        pair: NormalizedPair::from_key(row.get(2)?),
                        active: row.get::<_, i64>(3)? != 0,
                        created_at: to_datetime(row.get(4)?),
                    })
                })
                .map_err(storage_error("matches_for_slip"))?;

            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_error("matches_for_slip_row"))
        })
    }

    #[instrument(skip_all, fields(backend = "sqlite"))]
    fn stats(&self) -> Result<StoreStats> {
        self.run("stats", |conn| {
            conn.query_row(
                "SELECT (SELECT COUNT(*) FROM slips),
                        (SELECT COUNT(*) FROM matches),
                        (SELECT COUNT(*) FROM matches WHERE active = 1)",
                [],
                |row| {
                    Ok(StoreStats {
                        slips: to_count(row.get(0)?),
                        matches: to_count(row.get(1)?),
                        active_matches: to_count(row.get(2)?),
                    })
                },
            )
            .map_err(storage_error("stats"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::services::{PairNormalizer, SlipFingerprinter};
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 18, 0, 0).unwrap()
    }

    fn store_with_clock() -> (SqliteSlipStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let store = SqliteSlipStore::in_memory()
            .unwrap()
            .with_clock(clock.clone());
        (store, clock)
    }

    fn pairs() -> Vec<NormalizedPair> {
        vec![
            PairNormalizer::normalize("Arsenal", "Chelsea"),
            PairNormalizer::normalize("Lazio", "Roma"),
        ]
    }

    #[test]
    fn test_save_slip_assigns_increasing_ids() {
        let (store, _) = store_with_clock();
        let fp = SlipFingerprinter::fingerprint(&pairs());

        let first = store.save_slip(7, "Arsenal vs Chelsea", &fp).unwrap();
        let second = store.save_slip(7, "Arsenal vs Chelsea", &fp).unwrap();
        assert!(second > first);

        let slip = store.get_slip(first).unwrap().unwrap();
        assert_eq!(slip.user_id, 7);
        assert_eq!(slip.raw_text, "Arsenal vs Chelsea");
        assert_eq!(slip.fingerprint, fp);
        assert_eq!(slip.created_at, start());
    }

    #[test]
    fn test_fingerprint_exists() {
        let (store, _) = store_with_clock();
        let fp = SlipFingerprinter::fingerprint(&pairs());

        assert!(!store.fingerprint_exists(&fp).unwrap());
        store.save_slip(0, "text", &fp).unwrap();
        assert!(store.fingerprint_exists(&fp).unwrap());
    }

    #[test]
    fn test_save_matches_and_pair_active_exists() {
        let (store, _) = store_with_clock();
        let fp = SlipFingerprinter::fingerprint(&pairs());
        let slip_id = store.save_slip(0, "text", &fp).unwrap();

        assert!(!store.pair_active_exists(&pairs()[0]).unwrap());
        store.save_matches(slip_id, &pairs()).unwrap();
        assert!(store.pair_active_exists(&pairs()[0]).unwrap());
        assert!(store.pair_active_exists(&pairs()[1]).unwrap());

        let records = store.matches_for_slip(slip_id).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.active && r.slip_id == slip_id));
        assert_eq!(records[0].pair, pairs()[0]);
        assert_eq!(records[0].created_at, records[1].created_at);
    }

    #[test]
    fn test_save_matches_requires_existing_slip() {
        let (store, _) = store_with_clock();
        let result = store.save_matches(SlipId(999), &pairs());

        assert!(result.unwrap_err().is_storage_unavailable());
        assert_eq!(store.stats().unwrap().matches, 0);
    }

    #[test]
    fn test_save_submission_is_atomic() {
        let (store, _) = store_with_clock();
        let fp = SlipFingerprinter::fingerprint(&pairs());

        let slip_id = store.save_submission(3, "slip", &fp, &pairs()).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.slips, 1);
        assert_eq!(stats.matches, 2);
        assert_eq!(store.matches_for_slip(slip_id).unwrap().len(), 2);

        // Break the matches table so the second half of a submission fails.
        {
            let conn = acquire_lock(&store.conn);
            conn.execute_batch("DROP TABLE matches").unwrap();
        }
        let result = store.save_submission(3, "slip", &fp, &pairs());
        assert!(result.unwrap_err().is_storage_unavailable());

        let slips: i64 = acquire_lock(&store.conn)
            .query_row("SELECT COUNT(*) FROM slips", [], |row| row.get(0))
            .unwrap();
        assert_eq!(slips, 1, "failed submission must not leave a slip behind");
    }

    #[test]
    fn test_deactivate_matches_before() {
        let (store, clock) = store_with_clock();
        let fp = SlipFingerprinter::fingerprint(&pairs());
        store.save_submission(0, "old", &fp, &pairs()[..1]).unwrap();

        clock.advance(Duration::days(3));
        store.save_submission(0, "new", &fp, &pairs()[1..]).unwrap();

        let cutoff = clock.now() - Duration::days(2);
        assert_eq!(store.deactivate_matches_before(cutoff).unwrap(), 1);
        assert!(!store.pair_active_exists(&pairs()[0]).unwrap());
        assert!(store.pair_active_exists(&pairs()[1]).unwrap());

        // Already inactive rows are not counted again.
        assert_eq!(store.deactivate_matches_before(cutoff).unwrap(), 0);
        assert_eq!(store.stats().unwrap().active_matches, 1);
        assert_eq!(store.stats().unwrap().matches, 2);
    }

    #[test]
    fn test_cutoff_is_strict() {
        let (store, clock) = store_with_clock();
        let fp = SlipFingerprinter::fingerprint(&pairs());
        store.save_submission(0, "slip", &fp, &pairs()).unwrap();

        // A match created exactly at the cutoff stays active.
        assert_eq!(store.deactivate_matches_before(clock.now()).unwrap(), 0);
        assert_eq!(
            store
                .deactivate_matches_before(clock.now() + Duration::seconds(1))
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_to_datetime_out_of_range_falls_back_to_epoch() {
        assert_eq!(to_datetime(i64::MAX), DateTime::UNIX_EPOCH);
        assert_eq!(to_datetime(86_400).timestamp(), 86_400);
    }

    #[test]
    fn test_get_missing_slip() {
        let (store, _) = store_with_clock();
        assert!(store.get_slip(SlipId(1)).unwrap().is_none());
        assert!(store.matches_for_slip(SlipId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("slips.db");
        let fp = SlipFingerprinter::fingerprint(&pairs());

        {
            let store = SqliteSlipStore::new(&path).unwrap();
            assert_eq!(store.db_path(), Some(path.as_path()));
            store.save_submission(1, "slip", &fp, &pairs()).unwrap();
        }

        let reopened = SqliteSlipStore::new(&path).unwrap();
        assert!(reopened.fingerprint_exists(&fp).unwrap());
        assert!(reopened.pair_active_exists(&pairs()[1]).unwrap());
        assert_eq!(reopened.stats().unwrap().slips, 1);
    }
}
