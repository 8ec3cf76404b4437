// crates/score-ledger-config/src/config.rs
// ============================================================================
// Module: Score Ledger Configuration
// Description: Configuration loading and validation for Score Ledger.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: score-ledger-core, score-ledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file yields a loopback server over
//! an in-memory store. Invalid combinations fail closed at load time rather
//! than at first request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use score_ledger_core::AllowAllOrigins;
use score_ledger_core::DEFAULT_CAPACITY_CEILING;
use score_ledger_core::DEFAULT_MAX_NAME_LENGTH;
use score_ledger_core::DEFAULT_MAX_PAGE_SIZE;
use score_ledger_core::DEFAULT_PAGE_SIZE;
use score_ledger_core::DEFAULT_RETENTION_SIZE;
use score_ledger_core::HostAllowList;
use score_ledger_core::LeaderboardLimits;
use score_ledger_core::LedgerSettings;
use score_ledger_core::RetentionPolicy;
use score_ledger_core::SharedOriginPolicy;
use score_ledger_store_sqlite::SqliteStoreConfig;
use score_ledger_store_sqlite::SqliteStoreMode;
use score_ledger_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "score-ledger.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SCORE_LEDGER_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8787";
/// Default request body limit in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Upper bound for the request body limit.
const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default CORS preflight cache lifetime.
const DEFAULT_CORS_MAX_AGE_SECONDS: u64 = 3_600;
/// Maximum number of CORS origins.
const MAX_CORS_ORIGINS: usize = 64;
/// Maximum number of allow-listed hosts.
const MAX_ALLOWED_HOSTS: usize = 64;
/// Maximum length of a host or origin entry.
const MAX_HOST_LENGTH: usize = 253;
/// Upper bound for `max_name_length`.
const MAX_NAME_LENGTH_LIMIT: usize = 256;
/// Upper bound for `max_page_size`.
const MAX_PAGE_SIZE_LIMIT: u64 = 1_000;
/// Default busy timeout for `SQLite` connections.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Score Ledger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Score store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Capacity and retention configuration.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Leaderboard paging configuration.
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    /// Submission origin policy configuration.
    #[serde(default)]
    pub access: AccessConfig,
}

impl LedgerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.retention.validate()?;
        self.leaderboard.validate()?;
        self.access.validate()?;
        Ok(())
    }

    /// Returns the ledger rules described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the retention thresholds are inconsistent.
    pub fn ledger_settings(&self) -> Result<LedgerSettings, ConfigError> {
        Ok(LedgerSettings {
            retention: self.retention.policy()?,
            max_name_length: self.retention.max_name_length,
            leaderboard: self.leaderboard.limits(),
        })
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Cross-origin resource sharing configuration.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            cors: CorsConfig::default(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind must be non-empty".to_string()));
        }
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes exceeds limit ({MAX_MAX_BODY_BYTES})"
            )));
        }
        self.cors.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// Cross-origin resource sharing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,
    /// Preflight cache lifetime in seconds.
    #[serde(default = "default_cors_max_age_seconds")]
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_cors_origins(),
            max_age_seconds: default_cors_max_age_seconds(),
        }
    }
}

impl CorsConfig {
    /// Returns true when any origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin.trim() == "*")
    }

    /// Validates CORS configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::Invalid(
                "server.cors.allowed_origins must be non-empty".to_string(),
            ));
        }
        if self.allowed_origins.len() > MAX_CORS_ORIGINS {
            return Err(ConfigError::Invalid(format!(
                "server.cors.allowed_origins exceeds max entries ({MAX_CORS_ORIGINS})"
            )));
        }
        if self.allows_any_origin() {
            if self.allowed_origins.len() > 1 {
                return Err(ConfigError::Invalid(
                    "server.cors.allowed_origins wildcard must be the only entry".to_string(),
                ));
            }
            return Ok(());
        }
        for origin in &self.allowed_origins {
            let trimmed = origin.trim();
            let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
            if !has_scheme || trimmed.len() > MAX_HOST_LENGTH || trimmed.ends_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "server.cors.allowed_origins entry is not an origin: {trimmed}"
                )));
            }
        }
        Ok(())
    }
}

/// Audit logging configuration for ledger requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Score store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use `SQLite`-backed durable store.
    Sqlite,
}

impl StoreType {
    /// Returns the config label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Score store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` store configuration, if the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_store_path(path)
            }
        }
    }
}

// ============================================================================
// SECTION: Retention
// ============================================================================

/// Capacity and retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Record count that triggers compaction.
    #[serde(default = "default_capacity_ceiling")]
    pub capacity_ceiling: u64,
    /// Records kept by compaction.
    #[serde(default = "default_retention_size")]
    pub retention_size: u64,
    /// Maximum stored name length, in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            capacity_ceiling: default_capacity_ceiling(),
            retention_size: default_retention_size(),
            max_name_length: default_max_name_length(),
        }
    }
}

impl RetentionConfig {
    /// Builds the retention policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the thresholds are inconsistent.
    pub fn policy(&self) -> Result<RetentionPolicy, ConfigError> {
        RetentionPolicy::new(self.capacity_ceiling, self.retention_size)
            .map_err(|err| ConfigError::Invalid(format!("retention: {err}")))
    }

    /// Validates retention configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.policy()?;
        if self.max_name_length == 0 || self.max_name_length > MAX_NAME_LENGTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "retention.max_name_length must be between 1 and {MAX_NAME_LENGTH_LIMIT}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Leaderboard
// ============================================================================

/// Leaderboard paging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    /// Rows returned when the caller omits a size.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Largest size a caller may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl LeaderboardConfig {
    /// Returns the leaderboard limits.
    #[must_use]
    pub const fn limits(&self) -> LeaderboardLimits {
        LeaderboardLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }

    /// Validates leaderboard configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 || self.max_page_size > MAX_PAGE_SIZE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "leaderboard.max_page_size must be between 1 and {MAX_PAGE_SIZE_LIMIT}"
            )));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(
                "leaderboard.default_page_size must be between 1 and max_page_size".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Access
// ============================================================================

/// Submission origin policy modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Accept submissions from any origin.
    #[default]
    AllowAll,
    /// Accept submissions only from listed hosts and their subdomains.
    HostAllowList,
}

/// Submission origin policy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// Policy mode.
    #[serde(default)]
    pub mode: AccessMode,
    /// Hosts accepted by `host_allow_list`.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl AccessConfig {
    /// Builds the configured origin policy.
    #[must_use]
    pub fn origin_policy(&self) -> SharedOriginPolicy {
        match self.mode {
            AccessMode::AllowAll => Arc::new(AllowAllOrigins),
            AccessMode::HostAllowList => Arc::new(HostAllowList::new(&self.allowed_hosts)),
        }
    }

    /// Validates access configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            AccessMode::AllowAll => {
                if !self.allowed_hosts.is_empty() {
                    return Err(ConfigError::Invalid(
                        "allow_all access must not set allowed_hosts".to_string(),
                    ));
                }
            }
            AccessMode::HostAllowList => {
                if self.allowed_hosts.is_empty() {
                    return Err(ConfigError::Invalid(
                        "host_allow_list access requires allowed_hosts".to_string(),
                    ));
                }
                if self.allowed_hosts.len() > MAX_ALLOWED_HOSTS {
                    return Err(ConfigError::Invalid(format!(
                        "access.allowed_hosts exceeds max entries ({MAX_ALLOWED_HOSTS})"
                    )));
                }
                for host in &self.allowed_hosts {
                    validate_host(host)?;
                }
            }
        }
        Ok(())
    }
}

/// Validates a bare host name entry.
fn validate_host(host: &str) -> Result<(), ConfigError> {
    let trimmed = host.trim().trim_matches('.');
    if trimmed.is_empty() || trimmed.len() > MAX_HOST_LENGTH {
        return Err(ConfigError::Invalid(
            "access.allowed_hosts entry is empty or too long".to_string(),
        ));
    }
    if trimmed.contains("://") || trimmed.contains('/') || trimmed.contains(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "access.allowed_hosts entry must be a bare host: {trimmed}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading config.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the `SQLite` store path.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    validate_path_string("store.path", &path.to_string_lossy())?;
    if path.is_dir() {
        return Err(ConfigError::Invalid("store.path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default CORS origins.
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Returns the default CORS preflight lifetime.
const fn default_cors_max_age_seconds() -> u64 {
    DEFAULT_CORS_MAX_AGE_SECONDS
}

/// Returns the default audit logging flag.
const fn default_audit_enabled() -> bool {
    true
}

/// Returns the default `SQLite` busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Returns the default capacity ceiling.
const fn default_capacity_ceiling() -> u64 {
    DEFAULT_CAPACITY_CEILING
}

/// Returns the default retention size.
const fn default_retention_size() -> u64 {
    DEFAULT_RETENTION_SIZE
}

/// Returns the default maximum name length.
const fn default_max_name_length() -> usize {
    DEFAULT_MAX_NAME_LENGTH
}

/// Returns the default page size.
const fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Returns the default maximum page size.
const fn default_max_page_size() -> u64 {
    DEFAULT_MAX_PAGE_SIZE
}
