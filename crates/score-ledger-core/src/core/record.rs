// crates/score-ledger-core/src/core/record.rs
// ============================================================================
// Module: Score Records
// Description: Persisted score records and their ranked views.
// Purpose: Provide the single entity stored by the ledger.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ScoreRecord`] is created once by a submission and never updated. It is
//! destroyed only by compaction. Ranks are derived at read time and carried
//! alongside records in [`RankedScore`], never stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::clock::RecordTimestamp;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Store-assigned record identifier.
///
/// # Invariants
/// - Unique within the ledger at any instant.
/// - Meaningful only for insertion order; compaction may renumber survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreId(i64);

impl ScoreId {
    /// Creates a new score identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ScoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// A persisted score record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Store-assigned identifier.
    pub id: ScoreId,
    /// Trimmed, length-bounded player name.
    pub name: String,
    /// Non-negative score.
    pub score: i64,
    /// Insertion time.
    pub timestamp: RecordTimestamp,
}

/// A validated record awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    /// Trimmed, length-bounded player name.
    pub name: String,
    /// Non-negative score.
    pub score: i64,
    /// Insertion time assigned by the ledger clock.
    pub timestamp: RecordTimestamp,
}

/// A record annotated with its 1-based position in the leaderboard ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedScore {
    /// Row position in the `score DESC, timestamp ASC, id ASC` ordering.
    pub rank: u64,
    /// Ranked record.
    pub record: ScoreRecord,
}
