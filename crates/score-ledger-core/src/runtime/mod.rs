// crates/score-ledger-core/src/runtime/mod.rs
// ============================================================================
// Module: Score Ledger Runtime
// Description: Ledger service, origin policies, and in-memory storage.
// Purpose: Execute submissions and leaderboard queries against a store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime wires validated input to a [`ScoreStore`](crate::ScoreStore).
//! [`ScoreLedger`] is the only type transports need: it checks provenance,
//! validates, timestamps, and delegates the atomic write to the store.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod ledger;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AllowAllOrigins;
pub use access::HostAllowList;
pub use access::SharedOriginPolicy;
pub use ledger::LeaderboardView;
pub use ledger::LedgerError;
pub use ledger::LedgerSettings;
pub use ledger::ScoreLedger;
pub use ledger::SubmissionReceipt;
pub use store::InMemoryScoreStore;
pub use store::SharedScoreStore;
