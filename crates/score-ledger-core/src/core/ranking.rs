// crates/score-ledger-core/src/core/ranking.rs
// ============================================================================
// Module: Ranking and Pagination
// Description: Leaderboard ordering, rank derivation, and page arithmetic.
// Purpose: Keep ordering rules identical across queries and compaction.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A single total order, `score DESC, timestamp ASC, id ASC`, ranks the
//! leaderboard and selects compaction survivors. Two rank notions coexist:
//! the submission rank counts strictly greater scores, while leaderboard rows
//! carry their 1-based position in the total order.
//!
//! Query parameters are parsed leniently: unparseable values fall back to
//! defaults, and every size is clamped into `1..=max_page_size`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::core::record::ScoreRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of rows per page or simple query.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Default upper bound for `limit` and `pageSize`.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

// ============================================================================
// SECTION: Ordering
// ============================================================================

/// Compares two records in leaderboard order.
#[must_use]
pub fn ranking_order(left: &ScoreRecord, right: &ScoreRecord) -> Ordering {
    right
        .score
        .cmp(&left.score)
        .then_with(|| left.timestamp.cmp(&right.timestamp))
        .then_with(|| left.id.cmp(&right.id))
}

/// Returns the submission rank given the count of strictly greater scores.
#[must_use]
pub const fn submission_rank(strictly_greater: u64) -> u64 {
    strictly_greater.saturating_add(1)
}

// ============================================================================
// SECTION: Query Parameters
// ============================================================================

/// Raw leaderboard query string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    /// Row count for the simple shape.
    pub limit: Option<String>,
    /// 1-based page number for the paginated shape.
    pub page: Option<String>,
    /// Rows per page for the paginated shape.
    pub page_size: Option<String>,
}

impl LeaderboardQuery {
    /// Returns true when the paginated response shape is requested.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.page.is_some() || self.page_size.is_some()
    }
}

/// Page size bounds applied to leaderboard queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardLimits {
    /// Size used when the caller omits one.
    pub default_page_size: u64,
    /// Largest size a caller may request.
    pub max_page_size: u64,
}

impl Default for LeaderboardLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl LeaderboardLimits {
    /// Resolves raw parameters into a bounded request.
    #[must_use]
    pub fn resolve(&self, query: &LeaderboardQuery) -> LeaderboardRequest {
        if query.is_paginated() {
            let page = parse_positive(query.page.as_deref()).unwrap_or(1);
            let page_size = self.clamp(parse_positive(query.page_size.as_deref()));
            return LeaderboardRequest::Page(PageRequest {
                page,
                page_size,
            });
        }
        LeaderboardRequest::Top {
            limit: self.clamp(parse_positive(query.limit.as_deref())),
        }
    }

    /// Clamps a requested size into `1..=max_page_size`.
    fn clamp(&self, requested: Option<u64>) -> u64 {
        let ceiling = self.max_page_size.max(1);
        requested.unwrap_or(self.default_page_size).clamp(1, ceiling)
    }
}

/// Parses a numeric parameter, flooring values below one.
fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let value = raw?.trim().parse::<i64>().ok()?;
    Some(u64::try_from(value).unwrap_or(0).max(1))
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// A bounded leaderboard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardRequest {
    /// Top `limit` rows, returned as a bare list.
    Top {
        /// Number of rows.
        limit: u64,
    },
    /// One page of rows with pagination metadata.
    Page(PageRequest),
}

/// A single page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u64,
    /// Rows per page.
    pub page_size: u64,
}

impl PageRequest {
    /// Returns the zero-based row offset of the first row on the page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Pagination metadata returned with a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    /// Rows per page.
    pub page_size: u64,
    /// Records in the ledger.
    pub total_records: u64,
    /// `ceil(total_records / page_size)`, zero when empty.
    pub total_pages: u64,
    /// True when a later page exists.
    pub has_next: bool,
    /// True when an earlier page exists.
    pub has_previous: bool,
}

impl Pagination {
    /// Computes pagination metadata for a request over `total_records`.
    #[must_use]
    pub const fn new(request: PageRequest, total_records: u64) -> Self {
        let page_size = if request.page_size == 0 { 1 } else { request.page_size };
        let total_pages = total_records.div_ceil(page_size);
        Self {
            page: request.page,
            page_size,
            total_records,
            total_pages,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
