// crates/score-ledger-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Score Store Unit Tests
// Description: Schema, submission, ranking, and compaction checks.
// Purpose: Validate path safety, schema versioning, idempotent init,
//          ranking order, and capacity-triggered compaction.
// ============================================================================

//! ## Overview
//! Unit-level tests for `SQLite` score store invariants:
//! - Path safety checks and schema version validation
//! - Idempotent schema initialization
//! - Submission rank and leaderboard row positions
//! - Compaction at the default ceiling, survivor order, and id renumbering

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::sync::Arc;
use std::thread;

use rusqlite::Connection;
use rusqlite::params;
use score_ledger_core::NewScore;
use score_ledger_core::RecordTimestamp;
use score_ledger_core::RetentionPolicy;
use score_ledger_core::ScoreStore;
use score_ledger_core::StoreError;
use score_ledger_store_sqlite::SqliteScoreStore;
use score_ledger_store_sqlite::SqliteStoreConfig;
use score_ledger_store_sqlite::SqliteStoreError;
use score_ledger_store_sqlite::SqliteStoreMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn open_store(path: &Path) -> SqliteScoreStore {
    SqliteScoreStore::new(SqliteStoreConfig::for_path(path)).expect("open store")
}

fn stamp(millis: u64) -> RecordTimestamp {
    let seconds = millis / 1000;
    let fraction = millis % 1000;
    RecordTimestamp::from_stored(format!(
        "2026-03-01 {:02}:{:02}:{:02}.{fraction:03}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    ))
}

fn new_score(name: &str, score: i64, millis: u64) -> NewScore {
    NewScore {
        name: name.to_string(),
        score,
        timestamp: stamp(millis),
    }
}

/// Bulk-loads `count` rows directly, bypassing the store.
fn seed_rows(path: &Path, count: u64, score_of: impl Fn(u64) -> i64) {
    let mut connection = Connection::open(path).unwrap();
    let tx = connection.transaction().unwrap();
    {
        let mut stmt =
            tx.prepare("INSERT INTO scores (name, score, timestamp) VALUES (?1, ?2, ?3)").unwrap();
        for index in 0 .. count {
            stmt.execute(params![format!("seed-{index}"), score_of(index), stamp(index).as_str()])
                .unwrap();
        }
    }
    tx.commit().unwrap();
}

fn table_count(path: &Path, table: &str) -> i64 {
    let connection = Connection::open(path).unwrap();
    connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn initialize_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scores.sqlite");
    let store = open_store(&path);
    store.initialize().unwrap();
    store.initialize().unwrap();
    drop(store);
    let reopened = open_store(&path);
    reopened.initialize().unwrap();
    assert_eq!(table_count(&path, "scores"), 1);
    assert_eq!(reopened.count().unwrap(), 0);
}

#[test]
fn rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let result = SqliteScoreStore::new(SqliteStoreConfig::for_path(temp.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn rejects_unknown_schema_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scores.sqlite");
    drop(open_store(&path));
    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", []).unwrap();
    drop(connection);
    let result = SqliteScoreStore::new(SqliteStoreConfig::for_path(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn version_mismatch_maps_to_core_error() {
    let error = StoreError::from(SqliteStoreError::VersionMismatch("v9".to_string()));
    assert_eq!(error, StoreError::VersionMismatch("v9".to_string()));
}

#[test]
fn delete_journal_mode_is_supported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("scores.sqlite");
    let config = SqliteStoreConfig {
        journal_mode: SqliteStoreMode::Delete,
        ..SqliteStoreConfig::for_path(&path)
    };
    let store = SqliteScoreStore::new(config).unwrap();
    store.submit(&new_score("a", 1, 0), &RetentionPolicy::default()).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.path(), path.as_path());
}

#[test]
fn ties_rank_by_timestamp_then_id() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp.path().join("scores.sqlite"));
    let policy = RetentionPolicy::default();
    store.submit(&new_score("fifty", 50, 1), &policy).unwrap();
    let first = store.submit(&new_score("first-80", 80, 2), &policy).unwrap();
    let second = store.submit(&new_score("second-80", 80, 3), &policy).unwrap();
    let thirty = store.submit(&new_score("thirty", 30, 4), &policy).unwrap();
    assert_eq!((first.rank, second.rank, thirty.rank), (1, 1, 4));
    assert_eq!(second.id.get(), 3);

    let page = store.ranked_page(0, 10).unwrap();
    let rows: Vec<(&str, u64)> =
        page.entries.iter().map(|row| (row.record.name.as_str(), row.rank)).collect();
    assert_eq!(rows, [("first-80", 1), ("second-80", 2), ("fifty", 3), ("thirty", 4)]);
    assert_eq!(page.total_records, 4);
    assert_eq!(page.entries[0].record.timestamp.date(), "2026-03-01");
}

#[test]
fn ranked_page_reports_absolute_positions() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp.path().join("scores.sqlite"));
    for index in 0 .. 25 {
        store.submit(&new_score("p", index, index.unsigned_abs()), &RetentionPolicy::default()).unwrap();
    }
    let page = store.ranked_page(20, 10).unwrap();
    assert_eq!(page.total_records, 25);
    assert_eq!(page.entries.len(), 5);
    assert_eq!(page.entries[0].rank, 21);
    assert_eq!(page.entries[4].record.score, 0);
}

#[test]
fn compaction_at_default_ceiling_keeps_top_hundred() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scores.sqlite");
    let store = open_store(&path);
    // Each score repeats ten times, so the 100-row cut lands on a score boundary.
    seed_rows(&path, 10_000, |index| i64::try_from(index % 1_000).unwrap());
    assert_eq!(store.count().unwrap(), 10_000);

    let outcome = store.submit(&new_score("late", 999, 20_000), &RetentionPolicy::default()).unwrap();
    let report = outcome.compaction.expect("compaction");
    assert!(report.applied);
    assert_eq!(report.records_removed, 9_900);
    assert_eq!(report.table_size, 100);
    assert!(report.sequence_reset);
    assert_eq!(report.anomaly, None);
    assert_eq!(outcome.id.get(), 101);
    assert_eq!(outcome.rank, 1);
    assert_eq!(store.count().unwrap(), 101);

    let page = store.ranked_page(0, 200).unwrap();
    let first = &page.entries[0].record;
    assert_eq!(first.name, "seed-999");
    assert_eq!(first.id.get(), 1);
    assert_eq!(page.entries[10].record.name, "late");
    let lowest_kept = &page.entries[100].record;
    assert_eq!(lowest_kept.score, 990);
    let ids: Vec<i64> = page.entries.iter().map(|row| row.record.id.get()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (1 ..= 101).collect::<Vec<i64>>());
}

#[test]
fn compaction_breaks_ties_at_the_cut_by_timestamp_not_id() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scores.sqlite");
    let store = open_store(&path);
    let connection = Connection::open(&path).unwrap();
    // The latest 40 carries the lowest id.
    let rows = [
        (1, "p1", 40, 900),
        (2, "p2", 90, 100),
        (3, "p3", 80, 200),
        (4, "p4", 40, 300),
        (5, "p5", 40, 400),
        (6, "p6", 10, 500),
    ];
    for (id, name, score, millis) in rows {
        connection
            .execute(
                "INSERT INTO scores (id, name, score, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, score, stamp(millis).as_str()],
            )
            .unwrap();
    }
    drop(connection);

    let policy = RetentionPolicy::new(6, 3).unwrap();
    let outcome = store.submit(&new_score("new", 5, 1_000), &policy).unwrap();
    let report = outcome.compaction.expect("compaction");
    assert!(report.applied);
    assert_eq!(report.records_removed, 3);
    assert_eq!(outcome.id.get(), 4);

    let page = store.ranked_page(0, 10).unwrap();
    let names: Vec<&str> = page.entries.iter().map(|row| row.record.name.as_str()).collect();
    assert_eq!(names, vec!["p2", "p3", "p4", "new"]);
}

#[test]
fn readiness_requires_the_scores_table() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scores.sqlite");
    let store = open_store(&path);
    store.readiness().unwrap();

    let connection = Connection::open(&path).unwrap();
    connection.execute_batch("DROP TABLE scores;").unwrap();
    drop(connection);
    assert!(store.readiness().is_err());

    store.initialize().unwrap();
    store.readiness().unwrap();
}

#[test]
fn compaction_skips_when_staging_fails_and_insert_still_proceeds() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scores.sqlite");
    let store = open_store(&path);
    let policy = RetentionPolicy::new(4, 2).unwrap();
    for index in 0 .. 4 {
        store.submit(&new_score("p", index, index.unsigned_abs()), &policy).unwrap();
    }
    let connection = Connection::open(&path).unwrap();
    connection.execute_batch("DROP TABLE scores_compaction_stage;").unwrap();
    drop(connection);

    let outcome = store.submit(&new_score("next", 100, 50), &policy).unwrap();
    let report = outcome.compaction.expect("compaction report");
    assert!(!report.applied);
    assert_eq!(report.table_size, 4);
    assert_eq!(report.records_removed, 0);
    assert!(report.anomaly.is_some());
    assert_eq!(store.count().unwrap(), 5);

    store.initialize().unwrap();
    let recovered = store.submit(&new_score("again", 1, 60), &policy).unwrap();
    assert!(recovered.compaction.expect("compaction").applied);
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn concurrent_submissions_compact_once() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(open_store(&temp.path().join("scores.sqlite")));
    let policy = RetentionPolicy::new(20, 5).unwrap();
    let handles: Vec<_> = (0 .. 4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut compactions = 0_u32;
                for index in 0 .. 10_u64 {
                    let millis = worker * 100 + index;
                    let score = i64::try_from(millis).unwrap();
                    let outcome = store.submit(&new_score("w", score, millis), &policy).unwrap();
                    if outcome.compaction.is_some() {
                        compactions += 1;
                    }
                }
                compactions
            })
        })
        .collect();
    let compactions: u32 = handles.into_iter().map(|handle| handle.join().unwrap()).sum();
    // Inserts 21 and 36 each find 20 rows and compact to 5.
    assert_eq!(compactions, 2);
    assert_eq!(store.count().unwrap(), 10);
}
