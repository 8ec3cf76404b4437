// crates/score-ledger-http/src/audit.rs
// ============================================================================
// Module: Ledger Audit Logging
// Description: Structured audit events for leaderboard request handling.
// Purpose: Emit JSON-lines audit records without a logging framework.
// Dependencies: score-ledger-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Audit event payloads and sinks for the HTTP transport. Events are plain
//! serializable structs written as one JSON object per line, so deployments
//! can route them to any collector. Submission bodies are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use score_ledger_core::CompactionReport;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label for a handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request succeeded.
    Ok,
    /// Request was rejected or failed.
    Error,
}

impl RequestOutcome {
    /// Classifies an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        if status < 400 { Self::Ok } else { Self::Error }
    }
}

/// Per-request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRequestEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// Response status code.
    pub status: u16,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Handling latency in milliseconds.
    pub latency_ms: u128,
}

/// Compaction audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerCompactionEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Whether the table was rewritten.
    pub applied: bool,
    /// Rows deleted by compaction.
    pub records_removed: u64,
    /// Table size after compaction, before the triggering insert.
    pub table_size: u64,
    /// Whether the id sequence restarted.
    pub sequence_reset: bool,
    /// Non-fatal problem observed during compaction.
    pub anomaly: Option<String>,
}

/// Server startup audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStartupEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Bound socket address.
    pub bind: String,
    /// Store backend label.
    pub store_type: &'static str,
    /// Origin policy label.
    pub access_mode: &'static str,
}

/// Inputs required to construct a request audit event.
pub struct LedgerRequestEventParams {
    /// HTTP method.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// Response status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Handling latency in milliseconds.
    pub latency_ms: u128,
}

/// Inputs required to construct a startup audit event.
pub struct LedgerStartupEventParams {
    /// Bound socket address.
    pub bind: String,
    /// Store backend label.
    pub store_type: &'static str,
    /// Origin policy label.
    pub access_mode: &'static str,
}

/// Returns the current time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

impl LedgerRequestEvent {
    /// Creates a new request audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: LedgerRequestEventParams) -> Self {
        Self {
            event: "ledger_request",
            timestamp_ms: now_ms(),
            method: params.method,
            path: params.path,
            status: params.status,
            outcome: RequestOutcome::from_status(params.status),
            error_kind: params.error_kind,
            latency_ms: params.latency_ms,
        }
    }
}

impl LedgerCompactionEvent {
    /// Creates a compaction audit event from a store report.
    #[must_use]
    pub fn new(report: &CompactionReport) -> Self {
        Self {
            event: "ledger_compaction",
            timestamp_ms: now_ms(),
            applied: report.applied,
            records_removed: report.records_removed,
            table_size: report.table_size,
            sequence_reset: report.sequence_reset,
            anomaly: report.anomaly.clone(),
        }
    }
}

impl LedgerStartupEvent {
    /// Creates a startup audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: LedgerStartupEventParams) -> Self {
        Self {
            event: "ledger_startup",
            timestamp_ms: now_ms(),
            bind: params.bind,
            store_type: params.store_type,
            access_mode: params.access_mode,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for ledger events.
pub trait LedgerAuditSink: Send + Sync {
    /// Record a request event.
    fn record_request(&self, event: &LedgerRequestEvent);

    /// Record a compaction event.
    fn record_compaction(&self, _event: &LedgerCompactionEvent) {}

    /// Record a startup event.
    fn record_startup(&self, _event: &LedgerStartupEvent) {}
}

/// Writes one serialized event line, ignoring sink failures.
fn write_event<W: Write, E: Serialize>(writer: &mut W, event: &E) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(writer, "{payload}");
        let _ = writer.flush();
    }
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl LedgerAuditSink for StderrAuditSink {
    fn record_request(&self, event: &LedgerRequestEvent) {
        write_event(&mut io::stderr(), event);
    }

    fn record_compaction(&self, event: &LedgerCompactionEvent) {
        write_event(&mut io::stderr(), event);
    }

    fn record_startup(&self, event: &LedgerStartupEvent) {
        write_event(&mut io::stderr(), event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LedgerAuditSink for FileAuditSink {
    fn record_request(&self, event: &LedgerRequestEvent) {
        if let Ok(mut file) = self.file.lock() {
            write_event(&mut *file, event);
        }
    }

    fn record_compaction(&self, event: &LedgerCompactionEvent) {
        if let Ok(mut file) = self.file.lock() {
            write_event(&mut *file, event);
        }
    }

    fn record_startup(&self, event: &LedgerStartupEvent) {
        if let Ok(mut file) = self.file.lock() {
            write_event(&mut *file, event);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl LedgerAuditSink for NoopAuditSink {
    fn record_request(&self, _event: &LedgerRequestEvent) {}

    fn record_compaction(&self, _event: &LedgerCompactionEvent) {}

    fn record_startup(&self, _event: &LedgerStartupEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only audit assertions."
    )]

    use score_ledger_core::CompactionReport;
    use serde_json::Value;

    use super::FileAuditSink;
    use super::LedgerAuditSink;
    use super::LedgerCompactionEvent;
    use super::LedgerRequestEvent;
    use super::LedgerRequestEventParams;
    use super::RequestOutcome;

    #[test]
    fn request_event_classifies_outcome_from_status() {
        let event = LedgerRequestEvent::new(LedgerRequestEventParams {
            method: "POST".to_string(),
            path: "/api/submit".to_string(),
            status: 403,
            error_kind: Some("unauthorized"),
            latency_ms: 2,
        });
        assert_eq!(event.event, "ledger_request");
        assert_eq!(event.outcome, RequestOutcome::Error);
        assert_eq!(RequestOutcome::from_status(200), RequestOutcome::Ok);
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("audit.jsonl");
        let sink = FileAuditSink::new(&path).expect("open sink");
        let report = CompactionReport {
            applied: true,
            records_removed: 9_900,
            table_size: 100,
            sequence_reset: true,
            anomaly: None,
        };
        sink.record_compaction(&LedgerCompactionEvent::new(&report));
        sink.record_request(&LedgerRequestEvent::new(LedgerRequestEventParams {
            method: "GET".to_string(),
            path: "/api/leaderboard".to_string(),
            status: 200,
            error_kind: None,
            latency_ms: 1,
        }));
        let content = std::fs::read_to_string(&path).expect("read audit log");
        let lines: Vec<Value> =
            content.lines().map(|line| serde_json::from_str(line).expect("json line")).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "ledger_compaction");
        assert_eq!(lines[0]["records_removed"], 9_900);
        assert_eq!(lines[1]["outcome"], "ok");
    }
}
