// crates/score-ledger-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starter config for operators and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Score Ledger configuration. The output is static,
//! covers every section, and must always pass validation.

/// Returns a canonical example `score-ledger.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8787"
max_body_bytes = 65536

[server.cors]
allowed_origins = ["*"]
max_age_seconds = 3600

[server.audit]
enabled = true
# path = "score-ledger-audit.jsonl"

[store]
type = "sqlite"
path = "scores.sqlite"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[retention]
capacity_ceiling = 10000
retention_size = 100
max_name_length = 30

[leaderboard]
default_page_size = 10
max_page_size = 100

[access]
mode = "allow_all"
# mode = "host_allow_list"
# allowed_hosts = ["plgames.cl"]
"#,
    )
}
