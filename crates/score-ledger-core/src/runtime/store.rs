// crates/score-ledger-core/src/runtime/store.rs
// ============================================================================
// Module: Score Store Implementations
// Description: In-memory store and the shared store wrapper.
// Purpose: Provide a process-local backend and a cloneable store handle.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryScoreStore`] keeps records behind a single mutex, so each
//! submission's capacity check, compaction, insert, and rank run as one
//! critical section. It mirrors the durable store's semantics, including
//! identifier renumbering on compaction, and is intended for tests and demos.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::CompactionReport;
use crate::core::NewScore;
use crate::core::RankedScore;
use crate::core::RetentionPolicy;
use crate::core::ScoreId;
use crate::core::ScoreRecord;
use crate::core::ranking_order;
use crate::core::submission_rank;
use crate::interfaces::RankedPage;
use crate::interfaces::ScoreStore;
use crate::interfaces::StoreError;
use crate::interfaces::SubmitOutcome;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable contents of the in-memory store.
#[derive(Debug)]
struct InMemoryState {
    /// Records in insertion order.
    rows: Vec<ScoreRecord>,
    /// Next identifier to assign.
    next_id: i64,
}

impl Default for InMemoryState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

/// In-memory score store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScoreStore {
    /// Shared store contents.
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryScoreStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Converts a row count into the store's count type.
fn row_count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Keeps the top `retention` rows and renumbers them from one.
fn compact_rows(state: &mut InMemoryState, policy: &RetentionPolicy) -> CompactionReport {
    let before = row_count(state.rows.len());
    state.rows.sort_by(ranking_order);
    let keep = usize::try_from(policy.retention_size()).unwrap_or(usize::MAX);
    state.rows.truncate(keep);
    let mut next_id = 1_i64;
    for row in &mut state.rows {
        row.id = ScoreId::new(next_id);
        next_id = next_id.saturating_add(1);
    }
    state.next_id = next_id;
    let after = row_count(state.rows.len());
    CompactionReport {
        applied: true,
        records_removed: before.saturating_sub(after),
        table_size: after,
        sequence_reset: true,
        anomaly: None,
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn initialize(&self) -> Result<(), StoreError> {
        let _guard =
            self.state.lock().map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        Ok(())
    }

    fn submit(
        &self,
        score: &NewScore,
        policy: &RetentionPolicy,
    ) -> Result<SubmitOutcome, StoreError> {
        let mut guard =
            self.state.lock().map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        let compaction = if policy.requires_compaction(row_count(guard.rows.len())) {
            Some(compact_rows(&mut guard, policy))
        } else {
            None
        };
        let id = ScoreId::new(guard.next_id);
        guard.next_id = guard
            .next_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Store("identifier space exhausted".to_string()))?;
        guard.rows.push(ScoreRecord {
            id,
            name: score.name.clone(),
            score: score.score,
            timestamp: score.timestamp.clone(),
        });
        let greater = guard.rows.iter().filter(|row| row.score > score.score).count();
        Ok(SubmitOutcome {
            id,
            rank: submission_rank(row_count(greater)),
            compaction,
        })
    }

    fn ranked_page(&self, offset: u64, limit: u64) -> Result<RankedPage, StoreError> {
        let guard =
            self.state.lock().map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        let mut ordered: Vec<&ScoreRecord> = guard.rows.iter().collect();
        ordered.sort_by(|left, right| ranking_order(left, right));
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let entries = ordered
            .into_iter()
            .enumerate()
            .skip(skip)
            .take(take)
            .map(|(index, record)| RankedScore {
                rank: row_count(index).saturating_add(1),
                record: record.clone(),
            })
            .collect();
        Ok(RankedPage {
            entries,
            total_records: row_count(guard.rows.len()),
        })
    }

    fn count(&self) -> Result<u64, StoreError> {
        let guard =
            self.state.lock().map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        Ok(row_count(guard.rows.len()))
    }
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Cloneable handle over any thread-safe score store.
#[derive(Clone)]
pub struct SharedScoreStore {
    /// Wrapped store implementation.
    inner: Arc<dyn ScoreStore + Send + Sync>,
}

impl SharedScoreStore {
    /// Wraps a score store in a shared handle.
    #[must_use]
    pub fn from_store(store: impl ScoreStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl ScoreStore for SharedScoreStore {
    fn initialize(&self) -> Result<(), StoreError> {
        self.inner.initialize()
    }

    fn submit(
        &self,
        score: &NewScore,
        policy: &RetentionPolicy,
    ) -> Result<SubmitOutcome, StoreError> {
        self.inner.submit(score, policy)
    }

    fn ranked_page(&self, offset: u64, limit: u64) -> Result<RankedPage, StoreError> {
        self.inner.ranked_page(offset, limit)
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
