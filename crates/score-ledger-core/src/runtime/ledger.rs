// crates/score-ledger-core/src/runtime/ledger.rs
// ============================================================================
// Module: Score Ledger Service
// Description: Submission and leaderboard operations over a score store.
// Purpose: Apply provenance, validation, and retention rules in one place.
// Dependencies: crate::{core, interfaces}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`ScoreLedger`] is the service every transport calls. Submissions pass
//! through the origin policy, then validation, then receive a clock timestamp
//! before the store performs the atomic capacity check, compaction, insert,
//! and rank computation. Leaderboard queries resolve lenient parameters into
//! bounded requests and return either a bare list or a paginated view.
//!
//! Security posture: submission bodies are untrusted; no store access occurs
//! until the origin check and validation succeed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::CompactionReport;
use crate::core::LeaderboardLimits;
use crate::core::LeaderboardQuery;
use crate::core::LeaderboardRequest;
use crate::core::LedgerClock;
use crate::core::NewScore;
use crate::core::Pagination;
use crate::core::RankedScore;
use crate::core::RetentionPolicy;
use crate::core::ScoreId;
use crate::core::SystemClock;
use crate::core::TimeError;
use crate::core::ValidationError;
use crate::core::submission::DEFAULT_MAX_NAME_LENGTH;
use crate::core::validate_submission;
use crate::interfaces::RequestOrigin;
use crate::interfaces::ScoreStore;
use crate::interfaces::StoreError;
use crate::runtime::access::SharedOriginPolicy;
use crate::runtime::store::SharedScoreStore;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Tunable ledger rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Capacity ceiling and retention size.
    pub retention: RetentionPolicy,
    /// Maximum stored name length, in characters.
    pub max_name_length: usize,
    /// Leaderboard page size bounds.
    pub leaderboard: LeaderboardLimits,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::default(),
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            leaderboard: LeaderboardLimits::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Ledger operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Submission body failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Origin policy rejected the request.
    #[error("Unauthorized")]
    Unauthorized,
    /// Store operation failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
    /// Clock could not produce a timestamp.
    #[error(transparent)]
    Clock(#[from] TimeError),
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Identifier of the new record.
    pub id: ScoreId,
    /// `1 + count(records with a strictly greater score)`.
    pub rank: u64,
    /// Stored name.
    pub name: String,
    /// Stored score.
    pub score: i64,
    /// Present when the submission triggered compaction.
    pub compaction: Option<CompactionReport>,
}

/// Leaderboard query result in the requested shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardView {
    /// Top rows as a bare list.
    Top(Vec<RankedScore>),
    /// One page plus pagination metadata.
    Page {
        /// Rows on the page.
        entries: Vec<RankedScore>,
        /// Page metadata.
        pagination: Pagination,
    },
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Leaderboard service over a score store.
#[derive(Clone)]
pub struct ScoreLedger {
    /// Backing store.
    store: SharedScoreStore,
    /// Provenance gate for submissions.
    origin_policy: SharedOriginPolicy,
    /// Timestamp source.
    clock: Arc<dyn LedgerClock + Send + Sync>,
    /// Ledger rules.
    settings: LedgerSettings,
}

impl ScoreLedger {
    /// Creates a ledger using wall-clock timestamps.
    #[must_use]
    pub fn new(
        store: SharedScoreStore,
        origin_policy: SharedOriginPolicy,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            store,
            origin_policy,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn LedgerClock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the origin policy label.
    #[must_use]
    pub fn access_label(&self) -> &'static str {
        self.origin_policy.label()
    }

    /// Creates the store schema when absent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when initialization fails.
    pub fn initialize(&self) -> Result<(), LedgerError> {
        self.store.initialize()?;
        Ok(())
    }

    /// Checks store readiness.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the store is unavailable.
    pub fn readiness(&self) -> Result<(), LedgerError> {
        self.store.readiness()?;
        Ok(())
    }

    /// Applies the origin policy to a write request.
    ///
    /// Transports call this before reading or parsing the request body.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] when the policy rejects the
    /// request provenance.
    pub fn authorize(&self, origin: &RequestOrigin) -> Result<(), LedgerError> {
        let allowed = self
            .origin_policy
            .is_origin_allowed(origin.referer.as_deref(), origin.origin.as_deref());
        if !allowed {
            return Err(LedgerError::Unauthorized);
        }
        Ok(())
    }

    /// Validates and stores a submission, compacting first when at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] when the origin policy rejects
    /// the request, [`LedgerError::Validation`] for malformed bodies, and
    /// [`LedgerError::Storage`] when the write fails.
    pub fn submit(
        &self,
        origin: &RequestOrigin,
        body: &Value,
    ) -> Result<SubmissionReceipt, LedgerError> {
        self.authorize(origin)?;
        let valid = validate_submission(body, self.settings.max_name_length)?;
        let record = NewScore {
            name: valid.name,
            score: valid.score,
            timestamp: self.clock.now()?,
        };
        let outcome = self.store.submit(&record, &self.settings.retention)?;
        Ok(SubmissionReceipt {
            id: outcome.id,
            rank: outcome.rank,
            name: record.name,
            score: record.score,
            compaction: outcome.compaction,
        })
    }

    /// Returns ranked rows in the shape selected by the query.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the read fails.
    pub fn leaderboard(&self, query: &LeaderboardQuery) -> Result<LeaderboardView, LedgerError> {
        match self.settings.leaderboard.resolve(query) {
            LeaderboardRequest::Top {
                limit,
            } => {
                let page = self.store.ranked_page(0, limit)?;
                Ok(LeaderboardView::Top(page.entries))
            }
            LeaderboardRequest::Page(request) => {
                let page = self.store.ranked_page(request.offset(), request.page_size)?;
                Ok(LeaderboardView::Page {
                    entries: page.entries,
                    pagination: Pagination::new(request, page.total_records),
                })
            }
        }
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the count fails.
    pub fn record_count(&self) -> Result<u64, LedgerError> {
        Ok(self.store.count()?)
    }
}
