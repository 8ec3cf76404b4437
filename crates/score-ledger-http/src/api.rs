// crates/score-ledger-http/src/api.rs
// ============================================================================
// Module: Ledger API Payloads
// Description: JSON response bodies and error mapping for the HTTP surface.
// Purpose: Keep wire shapes separate from core domain types.
// Dependencies: axum, score-ledger-core, serde
// ============================================================================

//! ## Overview
//! Wire representations of ledger results. Field names are camelCase to match
//! the browser client. [`ApiError`] is the single error boundary: every
//! handler failure becomes a status code plus `{error, details?}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use score_ledger_core::CompactionReport;
use score_ledger_core::LeaderboardView;
use score_ledger_core::LedgerError;
use score_ledger_core::Pagination;
use score_ledger_core::RankedScore;
use score_ledger_core::SubmissionReceipt;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Confirmation message for accepted submissions.
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Score submitted successfully!";
/// Plain-text body returned by schema initialization.
pub const INIT_SUCCESS_MESSAGE: &str = "Database initialized successfully";

// ============================================================================
// SECTION: Response Bodies
// ============================================================================

/// Compaction summary attached to a submit response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupInfo {
    /// Rows deleted by compaction.
    pub records_removed: u64,
    /// Table size after compaction, before the new insert.
    pub table_size: u64,
    /// Whether the id sequence restarted.
    pub sequence_reset: bool,
    /// Non-fatal problem observed during compaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<String>,
}

impl From<CompactionReport> for CleanupInfo {
    fn from(report: CompactionReport) -> Self {
        Self {
            records_removed: report.records_removed,
            table_size: report.table_size,
            sequence_reset: report.sequence_reset,
            anomaly: report.anomaly,
        }
    }
}

/// Body returned by `POST /api/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: &'static str,
    /// Submission rank among all stored scores.
    pub rank: u64,
    /// Identifier of the new record.
    pub id: i64,
    /// Present only when the submission triggered compaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_info: Option<CleanupInfo>,
}

impl From<SubmissionReceipt> for SubmitResponse {
    fn from(receipt: SubmissionReceipt) -> Self {
        Self {
            success: true,
            message: SUBMIT_SUCCESS_MESSAGE,
            rank: receipt.rank,
            id: receipt.id.get(),
            cleanup_info: receipt.compaction.map(CleanupInfo::from),
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// Record identifier.
    pub id: i64,
    /// 1-based position in the full ordering.
    pub rank: u64,
    /// Player name.
    pub name: String,
    /// Score value.
    pub score: i64,
    /// Insertion timestamp.
    pub timestamp: String,
    /// `YYYY-MM-DD` portion of the timestamp.
    pub date: String,
}

impl From<RankedScore> for LeaderboardEntry {
    fn from(ranked: RankedScore) -> Self {
        let date = ranked.record.timestamp.date().to_string();
        Self {
            id: ranked.record.id.get(),
            rank: ranked.rank,
            name: ranked.record.name,
            score: ranked.record.score,
            timestamp: ranked.record.timestamp.as_str().to_string(),
            date,
        }
    }
}

/// Paginated leaderboard envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginatedResponse {
    /// Always `true`.
    pub success: bool,
    /// Rows on the page.
    pub data: Vec<LeaderboardEntry>,
    /// Page metadata.
    pub pagination: Pagination,
}

/// Body returned by `GET /api/leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LeaderboardResponse {
    /// Bare array of top rows.
    Top(Vec<LeaderboardEntry>),
    /// Page plus metadata.
    Page(PaginatedResponse),
}

impl From<LeaderboardView> for LeaderboardResponse {
    fn from(view: LeaderboardView) -> Self {
        match view {
            LeaderboardView::Top(entries) => {
                Self::Top(entries.into_iter().map(LeaderboardEntry::from).collect())
            }
            LeaderboardView::Page {
                entries,
                pagination,
            } => Self::Page(PaginatedResponse {
                success: true,
                data: entries.into_iter().map(LeaderboardEntry::from).collect(),
                pagination,
            }),
        }
    }
}

/// Body returned by `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Liveness label.
    pub status: &'static str,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Normalized error label carried in response extensions for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Primary message.
    error: String,
    /// Underlying cause, when useful to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// HTTP-facing error with status, message, and audit label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Response status.
    status: StatusCode,
    /// Primary message.
    error: String,
    /// Underlying cause.
    details: Option<String>,
    /// Audit label.
    kind: &'static str,
}

impl ApiError {
    /// Builds an error without details.
    fn new(status: StatusCode, kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
            kind,
        }
    }

    /// 400 for bodies that are not valid JSON.
    #[must_use]
    pub fn invalid_json() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_json", "Invalid JSON body")
    }

    /// 413 for bodies over the configured limit.
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "Request body too large")
    }

    /// 405 for unsupported methods on a known path.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method not allowed")
    }

    /// 404 for unknown paths.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "Not Found")
    }

    /// Maps a failed submission.
    #[must_use]
    pub fn from_submit(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(err) => {
                Self::new(StatusCode::BAD_REQUEST, "validation", err.to_string())
            }
            LedgerError::Unauthorized => {
                Self::new(StatusCode::FORBIDDEN, "unauthorized", "Unauthorized")
            }
            LedgerError::Storage(_) | LedgerError::Clock(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: "Failed to submit score".to_string(),
                details: Some(err.to_string()),
                kind: "storage",
            },
        }
    }

    /// Maps a failed read or schema operation.
    #[must_use]
    pub fn from_storage(err: &LedgerError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage", err.to_string())
    }

    /// 503 when the store fails its readiness check.
    #[must_use]
    pub fn unavailable(err: &LedgerError) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: "Service unavailable".to_string(),
            details: Some(err.to_string()),
            kind: "unavailable",
        }
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the audit label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorKind(self.kind));
        response
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
