// crates/score-ledger-http/src/server.rs
// ============================================================================
// Module: Ledger HTTP Server
// Description: axum router, handlers, CORS, and server bootstrap.
// Purpose: Expose submit, leaderboard, and schema init over HTTP.
// Dependencies: score-ledger-core, score-ledger-config, axum, tokio, tower-http
// ============================================================================

//! ## Overview
//! [`LedgerServer`] wires configuration into a [`ScoreLedger`] and serves it
//! on an axum router. Every handler failure is mapped through
//! [`ApiError`]; every response is recorded by the audit middleware.
//! Security posture: request bodies and headers are untrusted. Bodies are
//! size-limited before parsing and the origin policy runs before validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Query;
use axum::extract::Request;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::MethodRouter;
use axum::routing::get;
use axum::routing::post;
use score_ledger_config::CorsConfig;
use score_ledger_config::LedgerConfig;
use score_ledger_config::ServerAuditConfig;
use score_ledger_config::StoreConfig;
use score_ledger_config::StoreType;
use score_ledger_core::InMemoryScoreStore;
use score_ledger_core::LeaderboardQuery;
use score_ledger_core::RequestOrigin;
use score_ledger_core::ScoreLedger;
use score_ledger_core::SharedScoreStore;
use score_ledger_store_sqlite::SqliteScoreStore;
use serde_json::Value;
use tower_http::cors::AllowOrigin;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;

use crate::api::ApiError;
use crate::api::ErrorKind;
use crate::api::HealthResponse;
use crate::api::INIT_SUCCESS_MESSAGE;
use crate::api::LeaderboardResponse;
use crate::api::SubmitResponse;
use crate::audit::FileAuditSink;
use crate::audit::LedgerAuditSink;
use crate::audit::LedgerCompactionEvent;
use crate::audit::LedgerRequestEvent;
use crate::audit::LedgerRequestEventParams;
use crate::audit::LedgerStartupEvent;
use crate::audit::LedgerStartupEventParams;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;

// ============================================================================
// SECTION: Ledger Server
// ============================================================================

/// HTTP server instance.
pub struct LedgerServer {
    /// Server configuration.
    config: LedgerConfig,
    /// Ledger service shared by all handlers.
    ledger: ScoreLedger,
    /// Audit sink for request and lifecycle events.
    audit: Arc<dyn LedgerAuditSink>,
}

impl LedgerServer {
    /// Builds a server from configuration, opening and initializing the store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the store or
    /// audit sink cannot be opened.
    pub fn from_config(config: LedgerConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let settings =
            config.ledger_settings().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_store(&config.store)?;
        let ledger = ScoreLedger::new(store, config.access.origin_policy(), settings);
        ledger.initialize().map_err(|err| ServerError::Init(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        Ok(Self {
            config,
            ledger,
            audit,
        })
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn LedgerAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the ledger service, keeping transport settings.
    #[must_use]
    pub fn with_ledger(mut self, ledger: ScoreLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Builds the axum router with CORS, body limits, and auditing.
    #[must_use]
    pub fn router(&self) -> Router {
        let max_body_bytes = self.config.server.max_body_bytes;
        let state = Arc::new(ServerState {
            ledger: self.ledger.clone(),
            audit: Arc::clone(&self.audit),
            max_body_bytes,
        });
        Router::new()
            .route("/api/init-db", endpoint(get(handle_init_db)))
            .route("/api/submit", endpoint(post(handle_submit)))
            .route("/api/leaderboard", endpoint(get(handle_leaderboard)))
            .route("/api/health", endpoint(get(handle_health)))
            .fallback(handle_fallback)
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .layer(middleware::from_fn_with_state(Arc::clone(&state), audit_requests))
            .layer(build_cors_layer(&self.config.server.cors))
            .with_state(state)
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        self.serve_listener(listener, shutdown_signal()).await
    }

    /// Serves on an already-bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when serving fails.
    pub async fn serve_listener<F>(
        self,
        listener: tokio::net::TcpListener,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local: SocketAddr = listener
            .local_addr()
            .map_err(|_| ServerError::Transport("http listener has no address".to_string()))?;
        self.audit.record_startup(&LedgerStartupEvent::new(LedgerStartupEventParams {
            bind: local.to_string(),
            store_type: self.config.store.store_type.label(),
            access_mode: self.ledger.access_label(),
        }));
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the score store selected by configuration.
///
/// # Errors
///
/// Returns [`ServerError`] when the store configuration is incomplete or the
/// store cannot be opened.
pub fn build_store(config: &StoreConfig) -> Result<SharedScoreStore, ServerError> {
    let store = match config.store_type {
        StoreType::Memory => SharedScoreStore::from_store(InMemoryScoreStore::new()),
        StoreType::Sqlite => {
            let sqlite_config = config
                .sqlite_config()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let store = SqliteScoreStore::new(sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedScoreStore::from_store(store)
        }
    };
    Ok(store)
}

/// Builds the audit sink selected by configuration.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn LedgerAuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

// ============================================================================
// SECTION: Router Plumbing
// ============================================================================

/// Shared server state for handlers.
struct ServerState {
    /// Ledger service.
    ledger: ScoreLedger,
    /// Audit sink.
    audit: Arc<dyn LedgerAuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Shared state handle type.
type SharedState = Arc<ServerState>;

/// Adds the OPTIONS and 405 handlers every endpoint shares.
fn endpoint(route: MethodRouter<SharedState>) -> MethodRouter<SharedState> {
    route.options(handle_preflight).fallback(handle_method_not_allowed)
}

/// Builds the CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age_seconds));
    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Records one audit event per handled request.
async fn audit_requests(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let error_kind = response.extensions().get::<ErrorKind>().map(|kind| kind.0);
    state.audit.record_request(&LedgerRequestEvent::new(LedgerRequestEventParams {
        method,
        path,
        status: response.status().as_u16(),
        error_kind,
        latency_ms: started.elapsed().as_millis(),
    }));
    response
}

/// Runs a store-bound operation, shifting to a blocking context when available.
fn call_with_blocking<T>(operation: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(operation)
        }
        _ => operation(),
    }
}

/// Extracts submission provenance headers.
fn request_origin(headers: &HeaderMap) -> RequestOrigin {
    RequestOrigin {
        referer: header_text(headers, &header::REFERER),
        origin: header_text(headers, &header::ORIGIN),
    }
}

/// Returns a header value when present and visible ASCII.
fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `GET /api/init-db`.
async fn handle_init_db(State(state): State<SharedState>) -> Result<&'static str, ApiError> {
    call_with_blocking(|| state.ledger.initialize()).map_err(|err| ApiError::from_storage(&err))?;
    Ok(INIT_SUCCESS_MESSAGE)
}

/// Handles `POST /api/submit`.
async fn handle_submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let origin = request_origin(&headers);
    state.ledger.authorize(&origin).map_err(ApiError::from_submit)?;
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large()
        } else {
            ApiError::invalid_json()
        }
    })?;
    if bytes.len() > state.max_body_bytes {
        return Err(ApiError::payload_too_large());
    }
    let payload: Value = serde_json::from_slice(&bytes).map_err(|_| ApiError::invalid_json())?;
    let receipt = call_with_blocking(|| state.ledger.submit(&origin, &payload))
        .map_err(ApiError::from_submit)?;
    if let Some(report) = &receipt.compaction {
        state.audit.record_compaction(&LedgerCompactionEvent::new(report));
    }
    Ok(Json(SubmitResponse::from(receipt)))
}

/// Handles `GET /api/leaderboard`.
async fn handle_leaderboard(
    State(state): State<SharedState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let view = call_with_blocking(|| state.ledger.leaderboard(&query))
        .map_err(|err| ApiError::from_storage(&err))?;
    Ok(Json(LeaderboardResponse::from(view)))
}

/// Handles `GET /api/health`: 200 when the store answers, 503 otherwise.
async fn handle_health(
    State(state): State<SharedState>,
) -> Result<Json<HealthResponse>, ApiError> {
    call_with_blocking(|| state.ledger.readiness())
        .map_err(|err| ApiError::unavailable(&err))?;
    Ok(Json(HealthResponse {
        status: "ok",
    }))
}

/// Answers OPTIONS requests that are not CORS preflights.
async fn handle_preflight() -> StatusCode {
    StatusCode::OK
}

/// Rejects unsupported methods on known paths.
async fn handle_method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Answers unknown paths: OPTIONS succeeds, everything else is 404.
async fn handle_fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        ApiError::not_found().into_response()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
