// crates/score-ledger-core/src/core/retention.rs
// ============================================================================
// Module: Retention Policy
// Description: Capacity ceiling and compaction reporting.
// Purpose: Bound ledger cardinality while keeping the best records.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Once the ledger holds `capacity_ceiling` records, the next submission first
//! compacts it down to the top `retention_size` records in leaderboard order.
//! Compaction is best effort: a failure is reported as an anomaly and the
//! triggering insert still proceeds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Record count that triggers compaction.
pub const DEFAULT_CAPACITY_CEILING: u64 = 10_000;
/// Records kept by compaction.
pub const DEFAULT_RETENTION_SIZE: u64 = 100;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Validated retention thresholds.
///
/// # Invariants
/// - `1 <= retention_size < capacity_ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionPolicy {
    /// Record count that triggers compaction.
    capacity_ceiling: u64,
    /// Records kept by compaction.
    retention_size: u64,
}

/// Retention policy construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetentionPolicyError {
    /// Retention size is zero.
    #[error("retention_size must be at least 1")]
    EmptyRetention,
    /// Ceiling does not exceed the retention size.
    #[error("capacity_ceiling ({ceiling}) must exceed retention_size ({retention})")]
    CeilingTooLow {
        /// Requested ceiling.
        ceiling: u64,
        /// Requested retention size.
        retention: u64,
    },
}

impl RetentionPolicy {
    /// Builds a policy after checking its thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`RetentionPolicyError`] when the thresholds are inconsistent.
    pub const fn new(
        capacity_ceiling: u64,
        retention_size: u64,
    ) -> Result<Self, RetentionPolicyError> {
        if retention_size == 0 {
            return Err(RetentionPolicyError::EmptyRetention);
        }
        if capacity_ceiling <= retention_size {
            return Err(RetentionPolicyError::CeilingTooLow {
                ceiling: capacity_ceiling,
                retention: retention_size,
            });
        }
        Ok(Self {
            capacity_ceiling,
            retention_size,
        })
    }

    /// Returns the compaction trigger.
    #[must_use]
    pub const fn capacity_ceiling(&self) -> u64 {
        self.capacity_ceiling
    }

    /// Returns the number of records kept by compaction.
    #[must_use]
    pub const fn retention_size(&self) -> u64 {
        self.retention_size
    }

    /// Returns true when a ledger holding `count` records must compact.
    #[must_use]
    pub const fn requires_compaction(&self, count: u64) -> bool {
        count >= self.capacity_ceiling
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            capacity_ceiling: DEFAULT_CAPACITY_CEILING,
            retention_size: DEFAULT_RETENTION_SIZE,
        }
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Outcome of a compaction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionReport {
    /// True when survivors replaced the previous table contents.
    pub applied: bool,
    /// Rows deleted by compaction.
    pub records_removed: u64,
    /// Rows present after compaction, before the triggering insert.
    pub table_size: u64,
    /// True when the identifier sequence restarted.
    pub sequence_reset: bool,
    /// Non-fatal problem encountered while compacting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<String>,
}

impl CompactionReport {
    /// Reports a compaction that rolled back and left `table_size` rows.
    #[must_use]
    pub fn skipped(table_size: u64, anomaly: impl Into<String>) -> Self {
        Self {
            applied: false,
            records_removed: 0,
            table_size,
            sequence_reset: false,
            anomaly: Some(anomaly.into()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use super::RetentionPolicy;
    use super::RetentionPolicyError;

    #[test]
    fn default_policy_triggers_at_ten_thousand() {
        let policy = RetentionPolicy::default();
        assert!(!policy.requires_compaction(9_999));
        assert!(policy.requires_compaction(10_000));
        assert_eq!(policy.retention_size(), 100);
    }

    #[test]
    fn inconsistent_thresholds_are_rejected() {
        assert_eq!(RetentionPolicy::new(10, 0), Err(RetentionPolicyError::EmptyRetention));
        assert!(matches!(
            RetentionPolicy::new(5, 5),
            Err(RetentionPolicyError::CeilingTooLow { .. })
        ));
    }
}
