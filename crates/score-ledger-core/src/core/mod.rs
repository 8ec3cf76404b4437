// crates/score-ledger-core/src/core/mod.rs
// ============================================================================
// Module: Score Ledger Core Types
// Description: Canonical score records, validation, ranking, and retention.
// Purpose: Provide stable types shared by every store and transport.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Core types define what a score record is, how a raw submission becomes a
//! valid one, how records are ordered, and when the ledger compacts itself.
//! These types are the source of truth for the HTTP and CLI surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod ranking;
pub mod record;
pub mod retention;
pub mod submission;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::LedgerClock;
pub use clock::RecordTimestamp;
pub use clock::StepClock;
pub use clock::SystemClock;
pub use clock::TimeError;
pub use ranking::DEFAULT_MAX_PAGE_SIZE;
pub use ranking::DEFAULT_PAGE_SIZE;
pub use ranking::LeaderboardLimits;
pub use ranking::LeaderboardQuery;
pub use ranking::LeaderboardRequest;
pub use ranking::PageRequest;
pub use ranking::Pagination;
pub use ranking::ranking_order;
pub use ranking::submission_rank;
pub use record::NewScore;
pub use record::RankedScore;
pub use record::ScoreId;
pub use record::ScoreRecord;
pub use retention::CompactionReport;
pub use retention::DEFAULT_CAPACITY_CEILING;
pub use retention::DEFAULT_RETENTION_SIZE;
pub use retention::RetentionPolicy;
pub use retention::RetentionPolicyError;
pub use submission::DEFAULT_MAX_NAME_LENGTH;
pub use submission::ValidSubmission;
pub use submission::ValidationError;
pub use submission::validate_submission;
