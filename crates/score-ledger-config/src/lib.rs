// crates/score-ledger-config/src/lib.rs
// ============================================================================
// Module: Score Ledger Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for score-ledger.toml semantics.
// Dependencies: score-ledger-core, serde, toml
// ============================================================================

//! ## Overview
//! `score-ledger-config` defines the canonical configuration model for
//! Score Ledger. It provides strict, fail-closed validation and a canonical
//! example file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
