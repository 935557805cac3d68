//! Integration tests for slipcheck.
//!
//! Drives the full pipeline (sweep, classify, persist) against real `SQLite`
//! databases, both in memory and on disk.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use chrono::{Duration, TimeZone, Utc};
use slipcheck::clock::{Clock, ManualClock};
use slipcheck::gc::RetentionWindow;
use slipcheck::services::{PairNormalizer, SlipFingerprinter};
use slipcheck::storage::{SlipStore, SqliteSlipStore};
use slipcheck::{ExpiryManager, IngestOutcome, IngestService, MatchPair, SlipReport};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
}

fn pipeline(days: u32) -> (IngestService<SqliteSlipStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let store = Arc::new(
        SqliteSlipStore::in_memory()
            .unwrap()
            .with_clock(clock.clone()),
    );
    (IngestService::new(store, days).with_clock(clock.clone()), clock)
}

fn processed(outcome: IngestOutcome) -> SlipReport {
    match outcome {
        IngestOutcome::Processed(report) => report,
        IngestOutcome::NothingToProcess => panic!("expected a processed slip"),
    }
}

fn pairs(raw: &[(&str, &str)]) -> Vec<MatchPair> {
    raw.iter().map(|(a, b)| MatchPair::new(*a, *b)).collect()
}

#[test]
fn test_seen_before_across_slips() {
    let (service, _) = pipeline(2);

    let first = processed(
        service
            .ingest(
                0,
                "Team One vs Team Two\nTeam Three vs Team Four",
                &pairs(&[("Team One", "Team Two"), ("Team Three", "Team Four")]),
            )
            .unwrap(),
    );
    assert!(first.flags.is_clean());

    let second = processed(
        service
            .ingest(0, "team two vs team one", &pairs(&[("team two", "team one")]))
            .unwrap(),
    );
    assert_eq!(second.rows.len(), 1);
    assert!(second.rows[0].seen_before);
    assert!(!second.rows[0].dup_in_slip);
    assert!(!second.flags.identical_slip_seen);
}

#[test]
fn test_duplicate_within_slip() {
    let (service, _) = pipeline(2);
    let report = processed(
        service
            .ingest(0, "A vs B\nB vs A", &pairs(&[("A", "B"), ("B", "A")]))
            .unwrap(),
    );

    assert!(!report.rows[0].dup_in_slip);
    assert!(report.rows[1].dup_in_slip);
    assert!(!report.rows[0].seen_before);
    assert!(!report.rows[1].seen_before);
    assert!(report.flags.any_dup_in_slip);
    assert!(!report.flags.any_seen_before);
}

#[test]
fn test_identical_slip_twice() {
    let (service, _) = pipeline(2);
    let slip = "Arsenal vs Chelsea\nLazio vs Roma";

    let first = processed(service.ingest_text(1, slip).unwrap());
    let second = processed(service.ingest_text(2, slip).unwrap());

    assert!(!first.flags.identical_slip_seen);
    assert!(second.flags.identical_slip_seen);
    assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn test_same_pairs_reordered_are_not_identical() {
    let (service, _) = pipeline(2);
    service.ingest_text(1, "A vs B\nC vs D").unwrap();

    let reordered = processed(service.ingest_text(1, "C vs D\nA vs B").unwrap());
    assert!(!reordered.flags.identical_slip_seen);
    assert!(reordered.rows.iter().all(|row| row.seen_before));
}

#[test]
fn test_nothing_to_process_leaves_store_untouched() {
    let (service, clock) = pipeline(1);
    service.ingest_text(1, "Ajax vs PSV").unwrap();
    clock.advance(Duration::days(5));

    let outcome = service.ingest(1, "", &[]).unwrap();
    assert!(outcome.is_nothing_to_process());

    // No sweep ran, so the old match is still active
    let stats = service.store().stats().unwrap();
    assert_eq!(stats.slips, 1);
    assert_eq!(stats.active_matches, 1);
}

#[test]
fn test_match_expires_after_window() {
    let (service, clock) = pipeline(1);
    service.ingest_text(1, "Ajax vs PSV").unwrap();

    let key = PairNormalizer::normalize("Ajax", "PSV");
    clock.advance(Duration::days(2));
    assert!(service.store().pair_active_exists(&key).unwrap());

    let deactivated = service.expiry().sweep_expired(clock.now()).unwrap();
    assert_eq!(deactivated, 1);
    assert!(!service.store().pair_active_exists(&key).unwrap());

    let again = processed(service.ingest_text(1, "PSV vs Ajax").unwrap());
    assert!(!again.rows[0].seen_before);
}

#[test]
fn test_sweep_is_idempotent() {
    let (service, clock) = pipeline(1);
    service.ingest_text(1, "A vs B\nC vs D").unwrap();
    clock.advance(Duration::days(3));

    let now = clock.now();
    assert_eq!(service.expiry().sweep_expired(now).unwrap(), 2);
    assert_eq!(service.expiry().sweep_expired(now).unwrap(), 0);
}

#[test]
fn test_expired_slip_still_counts_as_identical() {
    let (service, clock) = pipeline(1);
    service.ingest_text(1, "A vs B").unwrap();
    clock.advance(Duration::days(10));

    let report = processed(service.ingest_text(1, "A vs B").unwrap());
    assert!(report.flags.identical_slip_seen);
    assert!(!report.flags.any_seen_before);
}

#[test]
fn test_shared_retention_window() {
    let clock = Arc::new(ManualClock::new(start()));
    let store = Arc::new(
        SqliteSlipStore::in_memory()
            .unwrap()
            .with_clock(clock.clone()),
    );
    let window = Arc::new(RetentionWindow::new(30));
    let service =
        IngestService::with_window(Arc::clone(&store), Arc::clone(&window)).with_clock(clock.clone());
    let manager = ExpiryManager::new(Arc::clone(&store), Arc::clone(&window));

    service.ingest_text(1, "A vs B").unwrap();
    clock.advance(Duration::days(2));

    manager.set_retention_window(1);
    assert_eq!(service.expiry().retention_window(), 1);

    let report = processed(service.ingest_text(1, "B vs A").unwrap());
    assert!(!report.rows[0].seen_before);
}

#[test]
fn test_persisted_rows() {
    let (service, _) = pipeline(2);
    let report = processed(service.ingest_text(77, "Lyon vs Nice\nNice - Lyon").unwrap());

    let slip = service.store().get_slip(report.slip_id).unwrap().unwrap();
    assert_eq!(slip.user_id, 77);
    assert_eq!(slip.created_at, start());

    let matches = service.store().matches_for_slip(report.slip_id).unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.active && m.slip_id == report.slip_id));
    assert_eq!(matches[0].pair, matches[1].pair);

    let expected = SlipFingerprinter::fingerprint(&[
        PairNormalizer::normalize("Lyon", "Nice"),
        PairNormalizer::normalize("Nice", "Lyon"),
    ]);
    assert_eq!(slip.fingerprint, expected);
}

#[test]
fn test_concurrent_ingestion() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteSlipStore::new(dir.path().join("slips.db")).unwrap());
    let service = Arc::new(IngestService::new(Arc::clone(&store), 2));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for j in 0..5 {
                    let text = format!("Home {i} vs Away {j}\nShared FC vs Common United");
                    service.ingest_text(i, &text).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = store.stats().unwrap();
    assert_eq!(stats.slips, 40);
    assert_eq!(stats.matches, 80);
    assert_eq!(stats.active_matches, 80);
}

#[test]
fn test_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("slips.db");

    {
        let service = IngestService::new(Arc::new(SqliteSlipStore::new(&path).unwrap()), 2);
        service.ingest_text(1, "Porto vs Benfica").unwrap();
    }

    let service = IngestService::new(Arc::new(SqliteSlipStore::new(&path).unwrap()), 2);
    let report = processed(service.ingest_text(1, "Porto vs Benfica").unwrap());
    assert!(report.flags.identical_slip_seen);
    assert!(report.rows[0].seen_before);
}
