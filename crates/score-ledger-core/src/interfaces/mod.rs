// crates/score-ledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: Score Ledger Interfaces
// Description: Backend-agnostic traits for storage and origin checks.
// Purpose: Define the seams between the ledger service and its collaborators.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The ledger service owns the rules; collaborators own persistence and
//! request provenance. [`ScoreStore`] implementations must run the capacity
//! check, optional compaction, insert, and rank computation of one submission
//! atomically with respect to other submissions. [`OriginPolicy`]
//! implementations are pure predicates with no side effects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::CompactionReport;
use crate::core::NewScore;
use crate::core::RankedScore;
use crate::core::RetentionPolicy;
use crate::core::ScoreId;

// ============================================================================
// SECTION: Score Store
// ============================================================================

/// Score store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("score store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("score store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("score store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("score store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("score store error: {0}")]
    Store(String),
}

/// Result of a single stored submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Identifier assigned to the new record.
    pub id: ScoreId,
    /// `1 + count(records with a strictly greater score)` after the insert.
    pub rank: u64,
    /// Present when the submission found the store at capacity.
    pub compaction: Option<CompactionReport>,
}

/// One slice of the ranked leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPage {
    /// Rows in leaderboard order, ranks relative to the full ordering.
    pub entries: Vec<RankedScore>,
    /// Total records in the store.
    pub total_records: u64,
}

/// Durable (or in-memory) home of score records.
pub trait ScoreStore {
    /// Creates the backing schema when absent. Must be idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema cannot be created or is
    /// incompatible.
    fn initialize(&self) -> Result<(), StoreError>;

    /// Compacts when at capacity, inserts the record, and ranks it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert or rank query fails. Compaction
    /// failures are reported in [`SubmitOutcome::compaction`] instead.
    fn submit(&self, score: &NewScore, policy: &RetentionPolicy)
    -> Result<SubmitOutcome, StoreError>;

    /// Returns `limit` ranked rows starting at zero-based `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn ranked_page(&self, offset: u64, limit: u64) -> Result<RankedPage, StoreError>;

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the count fails.
    fn count(&self) -> Result<u64, StoreError>;

    /// Reports store readiness for health checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Origin Policy
// ============================================================================

/// Provenance headers of an incoming write request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    /// `Referer` header value, if any.
    pub referer: Option<String>,
    /// `Origin` header value, if any.
    pub origin: Option<String>,
}

/// Decides whether a write request may proceed.
pub trait OriginPolicy {
    /// Returns true when the request provenance is acceptable.
    fn is_origin_allowed(&self, referer: Option<&str>, origin: Option<&str>) -> bool;

    /// Returns a short label for startup logs.
    fn label(&self) -> &'static str;
}
