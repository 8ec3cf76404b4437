// crates/score-ledger-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Score Store
// Description: Durable ScoreStore backed by SQLite WAL.
// Purpose: Persist score records with atomic, best-effort compaction.
// Dependencies: score-ledger-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`ScoreStore`] using `SQLite`. A single
//! connection behind a mutex serializes writers, and every submission runs in
//! a `BEGIN IMMEDIATE` transaction so two submitters can never both observe the
//! table at capacity.
//!
//! Compaction stages the survivors into a holding table, empties `scores`,
//! resets the `AUTOINCREMENT` sequence, and re-inserts the survivors in
//! ranking order, all inside a savepoint. If any step fails the savepoint rolls
//! back and the submission proceeds with the table untouched.
//! Security posture: database contents are untrusted and read back through
//! typed column accessors only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use score_ledger_core::CompactionReport;
use score_ledger_core::NewScore;
use score_ledger_core::RankedPage;
use score_ledger_core::RankedScore;
use score_ledger_core::RecordTimestamp;
use score_ledger_core::RetentionPolicy;
use score_ledger_core::ScoreId;
use score_ledger_core::ScoreRecord;
use score_ledger_core::ScoreStore;
use score_ledger_core::StoreError;
use score_ledger_core::SubmitOutcome;
use score_ledger_core::submission_rank;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Tables and indexes owned by the store.
const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        score INTEGER NOT NULL CHECK (score >= 0),
        timestamp DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    );
    CREATE INDEX IF NOT EXISTS idx_scores_ranking
        ON scores (score DESC, timestamp ASC, id ASC);
    CREATE TABLE IF NOT EXISTS scores_compaction_stage (
        position INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        score INTEGER NOT NULL,
        timestamp DATETIME NOT NULL
    );";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` score store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding player names.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store data failed integrity checks.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used directly as a map_err adapter.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed score store.
#[derive(Clone)]
pub struct SqliteScoreStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Single serialized connection.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteScoreStore {
    /// Opens an `SQLite`-backed score store and initializes its schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Runs `operation` with exclusive access to the connection.
    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        operation(&mut guard)
    }

    /// Stores a submission inside one immediate transaction.
    fn submit_in_tx(
        connection: &mut Connection,
        score: &NewScore,
        policy: &RetentionPolicy,
    ) -> Result<SubmitOutcome, SqliteStoreError> {
        let mut tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_error)?;
        let count = count_rows(&tx)?;
        let compaction = if policy.requires_compaction(count) {
            Some(
                compact(&mut tx, count, policy)
                    .unwrap_or_else(|err| CompactionReport::skipped(count, err.to_string())),
            )
        } else {
            None
        };
        tx.execute(
            "INSERT INTO scores (name, score, timestamp) VALUES (?1, ?2, ?3)",
            params![score.name, score.score, score.timestamp.as_str()],
        )
        .map_err(db_error)?;
        let id = tx.last_insert_rowid();
        let greater: i64 = tx
            .query_row("SELECT COUNT(*) FROM scores WHERE score > ?1", params![score.score], |row| {
                row.get(0)
            })
            .map_err(db_error)?;
        tx.commit().map_err(db_error)?;
        Ok(SubmitOutcome {
            id: ScoreId::new(id),
            rank: submission_rank(to_count(greater)?),
            compaction,
        })
    }

    /// Reads one ranked slice and the total count in a single snapshot.
    fn ranked_page_in_tx(
        connection: &mut Connection,
        offset: u64,
        limit: u64,
    ) -> Result<RankedPage, SqliteStoreError> {
        let tx = connection.transaction().map_err(db_error)?;
        let entries = {
            let mut stmt = tx
                .prepare(
                    "SELECT id, name, score, timestamp,
                        ROW_NUMBER() OVER (ORDER BY score DESC, timestamp ASC, id ASC) AS position
                     FROM scores
                     ORDER BY score DESC, timestamp ASC, id ASC
                     LIMIT ?1 OFFSET ?2",
                )
                .map_err(db_error)?;
            let rows = stmt
                .query_map(params![to_sql_int(limit), to_sql_int(offset)], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map_err(db_error)?;
            let mut entries = Vec::new();
            for row in rows {
                let (id, name, score, timestamp, position) = row.map_err(db_error)?;
                entries.push(RankedScore {
                    rank: to_count(position)?,
                    record: ScoreRecord {
                        id: ScoreId::new(id),
                        name,
                        score,
                        timestamp: RecordTimestamp::from_stored(timestamp),
                    },
                });
            }
            entries
        };
        let total_records = count_rows(&tx)?;
        tx.commit().map_err(db_error)?;
        Ok(RankedPage {
            entries,
            total_records,
        })
    }
}

impl ScoreStore for SqliteScoreStore {
    fn initialize(&self) -> Result<(), StoreError> {
        self.with_connection(initialize_schema).map_err(StoreError::from)
    }

    fn submit(
        &self,
        score: &NewScore,
        policy: &RetentionPolicy,
    ) -> Result<SubmitOutcome, StoreError> {
        self.with_connection(|connection| Self::submit_in_tx(connection, score, policy))
            .map_err(StoreError::from)
    }

    fn ranked_page(&self, offset: u64, limit: u64) -> Result<RankedPage, StoreError> {
        self.with_connection(|connection| Self::ranked_page_in_tx(connection, offset, limit))
            .map_err(StoreError::from)
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.with_connection(|connection| count_rows(connection)).map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        // The scores table must answer a read, not just the connection.
        self.with_connection(|connection| count_rows(connection).map(|_| ()))
            .map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Compaction
// ============================================================================

/// Replaces the table contents with the top `retention_size` records.
///
/// Runs inside a savepoint; any error rolls the savepoint back and leaves the
/// enclosing transaction usable.
fn compact(
    tx: &mut Transaction<'_>,
    count: u64,
    policy: &RetentionPolicy,
) -> Result<CompactionReport, SqliteStoreError> {
    let retention = i64::try_from(policy.retention_size())
        .map_err(|_| SqliteStoreError::Invalid("retention_size too large".to_string()))?;
    let savepoint = tx.savepoint().map_err(db_error)?;
    savepoint.execute("DELETE FROM scores_compaction_stage", []).map_err(db_error)?;
    savepoint
        .execute(
            "INSERT INTO scores_compaction_stage (position, name, score, timestamp)
             SELECT ROW_NUMBER() OVER (ORDER BY score DESC, timestamp ASC, id ASC),
                    name, score, timestamp
             FROM scores
             ORDER BY score DESC, timestamp ASC, id ASC
             LIMIT ?1",
            params![retention],
        )
        .map_err(db_error)?;
    savepoint.execute("DELETE FROM scores", []).map_err(db_error)?;
    let (sequence_reset, anomaly) =
        match savepoint.execute("DELETE FROM sqlite_sequence WHERE name = 'scores'", []) {
            Ok(_) => (true, None),
            Err(err) => (false, Some(format!("sequence reset failed: {err}"))),
        };
    let retained = savepoint
        .execute(
            "INSERT INTO scores (name, score, timestamp)
             SELECT name, score, timestamp FROM scores_compaction_stage ORDER BY position",
            [],
        )
        .map_err(db_error)?;
    savepoint.execute("DELETE FROM scores_compaction_stage", []).map_err(db_error)?;
    savepoint.commit().map_err(db_error)?;
    let table_size = u64::try_from(retained).unwrap_or(u64::MAX);
    Ok(CompactionReport {
        applied: true,
        records_removed: count.saturating_sub(table_size),
        table_size,
        sequence_reset,
        anomaly,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.execute_batch(SCHEMA_SQL).map_err(db_error)?;
    tx.commit().map_err(db_error)?;
    Ok(())
}

/// Counts stored records.
fn count_rows(connection: &Connection) -> Result<u64, SqliteStoreError> {
    let count: i64 = connection
        .query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))
        .map_err(db_error)?;
    to_count(count)
}

/// Converts an `SQLite` integer into a non-negative count.
fn to_count(value: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(value)
        .map_err(|_| SqliteStoreError::Corrupt(format!("negative count from sqlite: {value}")))
}

/// Converts a count into an `SQLite` integer, saturating at `i64::MAX`.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
