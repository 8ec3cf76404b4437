// crates/score-ledger-http/src/lib.rs
// ============================================================================
// Module: Score Ledger HTTP Library
// Description: HTTP transport for the score ledger.
// Purpose: Serve submit, leaderboard, and schema init endpoints with CORS.
// Dependencies: score-ledger-core, score-ledger-config, axum, tokio
// ============================================================================

//! ## Overview
//! `score-ledger-http` exposes [`score_ledger_core::ScoreLedger`] over HTTP.
//! It owns the wire payloads, the error-to-status mapping, JSON-lines audit
//! logging, and server bootstrap from [`score_ledger_config::LedgerConfig`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod api;
pub mod audit;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use api::ApiError;
pub use api::LeaderboardEntry;
pub use api::LeaderboardResponse;
pub use api::SubmitResponse;
pub use audit::FileAuditSink;
pub use audit::LedgerAuditSink;
pub use audit::LedgerCompactionEvent;
pub use audit::LedgerRequestEvent;
pub use audit::LedgerStartupEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use server::LedgerServer;
pub use server::ServerError;
pub use server::build_store;
