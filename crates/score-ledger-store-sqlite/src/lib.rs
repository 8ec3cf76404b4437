// crates/score-ledger-store-sqlite/src/lib.rs
// ============================================================================
// Module: Score Ledger SQLite Store
// Description: Durable SQLite-backed ScoreStore implementation.
// Purpose: Provide persistent score storage with transactional compaction.
// Dependencies: score-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! Score Ledger `SQLite` store provides the durable backend for the ledger. It
//! owns schema creation, schema version checks, and the stage-then-swap
//! compaction that keeps the table below its capacity ceiling.

pub mod store;

pub use store::SqliteScoreStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
