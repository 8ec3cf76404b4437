// crates/score-ledger-core/src/lib.rs
// ============================================================================
// Module: Score Ledger Core Library
// Description: Public API surface for the Score Ledger core.
// Purpose: Expose score types, interfaces, and the ledger service.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Score Ledger core owns the leaderboard domain: submission validation,
//! ranking and pagination rules, capacity-bounded retention, and the
//! [`ScoreLedger`] service that ties them to a pluggable [`ScoreStore`].
//! It is transport-agnostic; HTTP and CLI surfaces call into the same
//! service so every entry point shares one set of rules.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::OriginPolicy;
pub use interfaces::RankedPage;
pub use interfaces::RequestOrigin;
pub use interfaces::ScoreStore;
pub use interfaces::StoreError;
pub use interfaces::SubmitOutcome;
pub use runtime::AllowAllOrigins;
pub use runtime::HostAllowList;
pub use runtime::InMemoryScoreStore;
pub use runtime::LeaderboardView;
pub use runtime::LedgerError;
pub use runtime::LedgerSettings;
pub use runtime::ScoreLedger;
pub use runtime::SharedOriginPolicy;
pub use runtime::SharedScoreStore;
pub use runtime::SubmissionReceipt;
