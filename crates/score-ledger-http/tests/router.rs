// crates/score-ledger-http/tests/router.rs
// =============================================================================
// Module: Router Tests
// Description: Drive the axum router with oneshot requests.
// Purpose: Validate status codes, wire shapes, CORS, and audit records.
// =============================================================================

//! ## Overview
//! In-process router tests for score-ledger-http, plus one socket round trip
//! through [`LedgerServer::serve_listener`].

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
    reason = "Test-only router assertions."
)]

use std::sync::Arc;
use std::sync::Mutex;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::Response;
use http_body_util::BodyExt;
use score_ledger_config::LedgerConfig;
use score_ledger_core::AllowAllOrigins;
use score_ledger_core::LedgerSettings;
use score_ledger_core::NewScore;
use score_ledger_core::RankedPage;
use score_ledger_core::RetentionPolicy;
use score_ledger_core::ScoreLedger;
use score_ledger_core::ScoreStore;
use score_ledger_core::SharedScoreStore;
use score_ledger_core::StoreError;
use score_ledger_core::SubmitOutcome;
use score_ledger_http::LedgerAuditSink;
use score_ledger_http::LedgerCompactionEvent;
use score_ledger_http::LedgerRequestEvent;
use score_ledger_http::LedgerServer;
use score_ledger_http::NoopAuditSink;
use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tower::ServiceExt;

// ============================================================================
// SECTION: Helpers
// ============================================================================

#[derive(Default)]
struct RecordingSink {
    requests: Mutex<Vec<LedgerRequestEvent>>,
    compactions: Mutex<Vec<LedgerCompactionEvent>>,
}

impl LedgerAuditSink for RecordingSink {
    fn record_request(&self, event: &LedgerRequestEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn record_compaction(&self, event: &LedgerCompactionEvent) {
        self.compactions.lock().unwrap().push(event.clone());
    }
}

/// Store that accepts schema init but fails every later call.
struct DetachedStore;

impl ScoreStore for DetachedStore {
    fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn submit(&self, _: &NewScore, _: &RetentionPolicy) -> Result<SubmitOutcome, StoreError> {
        Err(StoreError::Io("disk detached".to_string()))
    }

    fn ranked_page(&self, _: u64, _: u64) -> Result<RankedPage, StoreError> {
        Err(StoreError::Io("disk detached".to_string()))
    }

    fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::Io("disk detached".to_string()))
    }

    fn readiness(&self) -> Result<(), StoreError> {
        Err(StoreError::Io("disk detached".to_string()))
    }
}

fn build_server(content: &str) -> LedgerServer {
    let config = LedgerConfig::from_toml(content).expect("config");
    LedgerServer::from_config(config).expect("server").with_audit_sink(Arc::new(NoopAuditSink))
}

fn router(content: &str) -> Router {
    build_server(content).router()
}

fn submit_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("response")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.expect("body").to_bytes().to_vec()
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(app, request).await;
    let status = response.status();
    let bytes = body_bytes(response).await;
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

async fn submit(app: &Router, name: &str, score: i64) -> Value {
    let body = json!({"name": name, "score": score}).to_string();
    let (status, value) = send_json(app, submit_request(&body)).await;
    assert_eq!(status, StatusCode::OK, "unexpected body {value}");
    value
}

async fn record_count(app: &Router) -> u64 {
    let (_, value) = send_json(app, get_request("/api/leaderboard?page=1&pageSize=1")).await;
    value["pagination"]["totalRecords"].as_u64().expect("total records")
}

// ============================================================================
// SECTION: Submission
// ============================================================================

#[tokio::test]
async fn invalid_submissions_return_400_without_writing() {
    let app = router("");
    submit(&app, "seed", 10).await;
    let cases = [
        (r#"{"name":"","score":5}"#, "Name is required"),
        (r#"{"name":"A","score":-1}"#, "must not be negative"),
        (r#"{"score":"abc"}"#, "Name is required"),
        (r#"{"name":"A","score":"abc"}"#, "Valid score is required"),
        (r#"[1,2]"#, "object"),
    ];
    for (body, needle) in cases {
        let (status, value) = send_json(&app, submit_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        let message = value["error"].as_str().expect("error message");
        assert!(message.contains(needle), "{message} missing {needle}");
    }
    assert_eq!(record_count(&app).await, 1);
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = router("");
    let (status, value) = send_json(&app, submit_request("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"], "Invalid JSON body");
}

#[tokio::test]
async fn oversized_body_returns_413() {
    let app = router("[server]\nmax_body_bytes = 64");
    let body = json!({"name": "x".repeat(200), "score": 1}).to_string();
    let response = send(&app, submit_request(&body)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn submit_reports_rank_from_strictly_greater_scores() {
    let app = router("");
    let first = submit(&app, "a", 50).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "Score submitted successfully!");
    assert_eq!(first["rank"], 1);
    submit(&app, "b", 80).await;
    let tied = submit(&app, "c", 80).await;
    assert_eq!(tied["rank"], 1);
    assert!(tied.get("cleanupInfo").is_none());
    let last = submit(&app, "d", 30).await;
    assert_eq!(last["rank"], 4);

    let (status, value) = send_json(&app, get_request("/api/leaderboard")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = value.as_array().expect("array response");
    let names: Vec<&str> = rows.iter().map(|row| row["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["b", "c", "a", "d"]);
    let ranks: Vec<u64> = rows.iter().map(|row| row["rank"].as_u64().unwrap()).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    let timestamp = rows[0]["timestamp"].as_str().unwrap();
    assert_eq!(rows[0]["date"].as_str().unwrap(), &timestamp[.. 10]);
}

#[tokio::test]
async fn submission_at_capacity_compacts_and_reports_cleanup() {
    let sink = Arc::new(RecordingSink::default());
    let app = build_server("[retention]\ncapacity_ceiling = 6\nretention_size = 3")
        .with_audit_sink(Arc::clone(&sink) as Arc<dyn LedgerAuditSink>)
        .router();
    for (index, score) in [10, 60, 20, 50, 30, 40].into_iter().enumerate() {
        let reply = submit(&app, &format!("p{index}"), score).await;
        assert!(reply.get("cleanupInfo").is_none());
    }
    let reply = submit(&app, "late", 5).await;
    assert_eq!(reply["cleanupInfo"]["recordsRemoved"], 3);
    assert_eq!(reply["cleanupInfo"]["tableSize"], 3);
    assert_eq!(reply["cleanupInfo"]["sequenceReset"], true);
    assert_eq!(reply["id"], 4);
    assert_eq!(reply["rank"], 4);

    let (_, value) = send_json(&app, get_request("/api/leaderboard")).await;
    let scores: Vec<i64> =
        value.as_array().unwrap().iter().map(|row| row["score"].as_i64().unwrap()).collect();
    assert_eq!(scores, vec![60, 50, 40, 5]);
    assert_eq!(sink.compactions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn host_allow_list_rejects_unknown_provenance() {
    let app = router("[access]\nmode = \"host_allow_list\"\nallowed_hosts = [\"plgames.cl\"]");
    let body = r#"{"name":"ana","score":3}"#;
    let (status, value) = send_json(&app, submit_request(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(value["error"], "Unauthorized");

    let mut request = submit_request(body);
    request.headers_mut().insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::FORBIDDEN);

    let mut request = submit_request(body);
    request.headers_mut().insert(header::REFERER, "https://www.plgames.cl/game".parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn disallowed_origin_is_rejected_before_the_body_is_read() {
    let config = concat!(
        "[server]\nmax_body_bytes = 64\n",
        "[access]\nmode = \"host_allow_list\"\nallowed_hosts = [\"plgames.cl\"]",
    );
    let app = router(config);
    let mut request = submit_request("{not json");
    request.headers_mut().insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    let (status, value) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(value["error"], "Unauthorized");

    let mut request = submit_request(&"x".repeat(200));
    request.headers_mut().insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::FORBIDDEN);

    let mut request = submit_request("{not json");
    request.headers_mut().insert(header::ORIGIN, "https://plgames.cl".parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(record_count(&app).await, 0);
}

// ============================================================================
// SECTION: Leaderboard
// ============================================================================

#[tokio::test]
async fn pagination_envelope_reports_page_metadata() {
    let app = router("");
    for index in 0 .. 25 {
        submit(&app, &format!("p{index}"), index).await;
    }
    let (status, value) =
        send_json(&app, get_request("/api/leaderboard?page=3&pageSize=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"].as_array().unwrap().len(), 5);
    assert_eq!(value["data"][0]["rank"], 21);
    let pagination = &value["pagination"];
    assert_eq!(pagination["page"], 3);
    assert_eq!(pagination["pageSize"], 10);
    assert_eq!(pagination["totalRecords"], 25);
    assert_eq!(pagination["totalPages"], 3);
    assert_eq!(pagination["hasNext"], false);
    assert_eq!(pagination["hasPrevious"], true);
}

#[tokio::test]
async fn leaderboard_limit_is_lenient_and_bounded() {
    let app = router("");
    for index in 0 .. 12 {
        submit(&app, &format!("p{index}"), index).await;
    }
    let (_, value) = send_json(&app, get_request("/api/leaderboard?limit=abc")).await;
    assert_eq!(value.as_array().unwrap().len(), 10);
    let (_, value) = send_json(&app, get_request("/api/leaderboard?limit=0")).await;
    assert_eq!(value.as_array().unwrap().len(), 1);
    let (_, value) = send_json(&app, get_request("/api/leaderboard?limit=500")).await;
    assert_eq!(value.as_array().unwrap().len(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sqlite_backed_router_serves_from_worker_threads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.sqlite");
    let content = format!("[store]\ntype = \"sqlite\"\npath = {:?}", path.display().to_string());
    let app = router(&content);
    submit(&app, "ana", 12).await;
    submit(&app, "bo", 30).await;
    let (_, value) = send_json(&app, get_request("/api/leaderboard?limit=5")).await;
    let names: Vec<&str> =
        value.as_array().unwrap().iter().map(|row| row["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["bo", "ana"]);
}

// ============================================================================
// SECTION: Schema Init
// ============================================================================

#[tokio::test]
async fn init_db_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.sqlite");
    let content = format!("[store]\ntype = \"sqlite\"\npath = {:?}", path.display().to_string());
    let app = router(&content);
    for _ in 0 .. 2 {
        let response = send(&app, get_request("/api/init-db")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        let body = body_bytes(response).await;
        assert_eq!(body, b"Database initialized successfully");
    }
    submit(&app, "ana", 1).await;
    assert_eq!(record_count(&app).await, 1);
}

// ============================================================================
// SECTION: Routing, CORS, Audit
// ============================================================================

#[tokio::test]
async fn wrong_method_returns_405() {
    let app = router("");
    let (status, value) = send_json(&app, get_request("/api/submit")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(value, json!({"error": "Method not allowed"}));
    let request =
        Request::builder().method("POST").uri("/api/leaderboard").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::METHOD_NOT_ALLOWED);
    let request =
        Request::builder().method("DELETE").uri("/api/init-db").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_paths_return_404_except_options() {
    let app = router("");
    assert_eq!(send(&app, get_request("/api/nope")).await.status(), StatusCode::NOT_FOUND);
    let request = Request::builder().method("OPTIONS").uri("/anything").body(Body::empty()).unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let app = router("");
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/submit")
        .header(header::ORIGIN, "https://www.plgames.cl")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let strict = router("[server.cors]\nallowed_origins = [\"https://www.plgames.cl\"]");
    let mut request = get_request("/api/leaderboard");
    request.headers_mut().insert(header::ORIGIN, "https://other.example".parse().unwrap());
    let response = send(&strict, request).await;
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router("");
    let (status, value) = send_json(&app, get_request("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!({"status": "ok"}));
}

#[tokio::test]
async fn health_reports_503_when_store_is_unavailable() {
    let ledger = ScoreLedger::new(
        SharedScoreStore::from_store(DetachedStore),
        Arc::new(AllowAllOrigins),
        LedgerSettings::default(),
    );
    let app = build_server("").with_ledger(ledger).router();
    let (status, value) = send_json(&app, get_request("/api/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(value["error"], "Service unavailable");
    assert!(value["details"].as_str().unwrap().contains("disk detached"));

    let (status, _) = send_json(&app, get_request("/api/leaderboard")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn audit_sink_records_each_request_with_error_kind() {
    let sink = Arc::new(RecordingSink::default());
    let app = build_server("")
        .with_audit_sink(Arc::clone(&sink) as Arc<dyn LedgerAuditSink>)
        .router();
    submit(&app, "ana", 9).await;
    let _ = send(&app, submit_request(r#"{"name":"","score":1}"#)).await;
    let _ = send(&app, get_request("/missing")).await;
    let requests = sink.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].status, 200);
    assert_eq!(requests[0].error_kind, None);
    assert_eq!(requests[1].path, "/api/submit");
    assert_eq!(requests[1].error_kind, Some("validation"));
    assert_eq!(requests[2].error_kind, Some("not_found"));
}

// ============================================================================
// SECTION: Socket Serving
// ============================================================================

#[tokio::test]
async fn serve_listener_answers_over_tcp_and_shuts_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = build_server("");
    let handle = tokio::spawn(async move {
        server
            .serve_listener(listener, async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write request");
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    let text = String::from_utf8_lossy(&raw);
    assert!(text.starts_with("HTTP/1.1 200"), "response: {text}");
    assert!(text.contains(r#"{"status":"ok"}"#), "response: {text}");

    shutdown_tx.send(()).expect("signal shutdown");
    handle.await.expect("join").expect("clean shutdown");
}
