// crates/score-ledger-core/src/core/clock.rs
// ============================================================================
// Module: Score Ledger Time Model
// Description: Record timestamps and the clocks that assign them.
// Purpose: Keep insertion time explicit, sortable, and injectable.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are used only as a ranking tie-breaker, so their textual form
//! must sort the same way as the instants they represent. The ledger never
//! reads wall-clock time directly; it asks an injected [`LedgerClock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed-width UTC layout, compatible with `SQLite` `strftime('%Y-%m-%d %H:%M:%f')`.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
/// Length of the `YYYY-MM-DD` date prefix.
const DATE_PREFIX_LEN: usize = 10;

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// Insertion time of a score record.
///
/// # Invariants
/// - Values produced by [`RecordTimestamp::from_datetime`] are fixed width, so
///   lexical order equals chronological order.
/// - Values read back from a store are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTimestamp(String);

impl RecordTimestamp {
    /// Formats a UTC instant into the canonical record layout.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] when the instant cannot be formatted.
    pub fn from_datetime(value: OffsetDateTime) -> Result<Self, TimeError> {
        let utc = value.to_offset(time::UtcOffset::UTC);
        utc.format(TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|err| TimeError::Format(err.to_string()))
    }

    /// Wraps a timestamp read back from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the timestamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `YYYY-MM-DD` portion of the timestamp.
    #[must_use]
    pub fn date(&self) -> &str {
        self.0.get(.. DATE_PREFIX_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Display for RecordTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Timestamp formatting errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The instant could not be rendered.
    #[error("timestamp formatting failed: {0}")]
    Format(String),
}

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Source of record insertion times.
pub trait LedgerClock {
    /// Returns the timestamp for a record inserted now.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] when the current instant cannot be rendered.
    fn now(&self) -> Result<RecordTimestamp, TimeError>;
}

/// Wall-clock UTC time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl LedgerClock for SystemClock {
    fn now(&self) -> Result<RecordTimestamp, TimeError> {
        RecordTimestamp::from_datetime(OffsetDateTime::now_utc())
    }
}

/// Deterministic clock that advances one millisecond per reading.
///
/// Useful for tests and replays where tie-breaks on insertion time must be
/// reproducible.
#[derive(Debug)]
pub struct StepClock {
    /// First instant returned.
    origin: OffsetDateTime,
    /// Milliseconds elapsed since `origin`.
    elapsed_ms: AtomicI64,
}

impl StepClock {
    /// Creates a clock whose first reading is `origin`.
    #[must_use]
    pub const fn starting_at(origin: OffsetDateTime) -> Self {
        Self {
            origin,
            elapsed_ms: AtomicI64::new(0),
        }
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::starting_at(OffsetDateTime::UNIX_EPOCH)
    }
}

impl LedgerClock for StepClock {
    fn now(&self) -> Result<RecordTimestamp, TimeError> {
        let step = self.elapsed_ms.fetch_add(1, Ordering::SeqCst);
        let instant = self
            .origin
            .checked_add(Duration::milliseconds(step))
            .ok_or_else(|| TimeError::Format("step clock overflow".to_string()))?;
        RecordTimestamp::from_datetime(instant)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
