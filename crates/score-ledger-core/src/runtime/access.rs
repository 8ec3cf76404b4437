// crates/score-ledger-core/src/runtime/access.rs
// ============================================================================
// Module: Origin Policies
// Description: Built-in request provenance predicates.
// Purpose: Gate score submissions by the origin of the calling page.
// Dependencies: url
// ============================================================================

//! ## Overview
//! [`AllowAllOrigins`] accepts every request. [`HostAllowList`] accepts a
//! request only when its `Origin` (or, when absent, `Referer`) parses as a URL
//! whose host equals a listed host or is a subdomain of one. Matching ignores
//! scheme, port, and case. Requests carrying neither header are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use url::Url;

use crate::interfaces::OriginPolicy;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shared, thread-safe origin policy.
pub type SharedOriginPolicy = Arc<dyn OriginPolicy + Send + Sync>;

/// Accepts every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllOrigins;

impl OriginPolicy for AllowAllOrigins {
    fn is_origin_allowed(&self, _referer: Option<&str>, _origin: Option<&str>) -> bool {
        true
    }

    fn label(&self) -> &'static str {
        "allow_all"
    }
}

/// Accepts requests from listed hosts and their subdomains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAllowList {
    /// Lowercased hosts without surrounding dots.
    hosts: Vec<String>,
}

impl HostAllowList {
    /// Builds an allow list from host names.
    #[must_use]
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|host| host.as_ref().trim().trim_matches('.').to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        Self {
            hosts,
        }
    }

    /// Returns true when `host` equals or is a subdomain of a listed host.
    fn matches_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.hosts.iter().any(|allowed| {
            host == *allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl OriginPolicy for HostAllowList {
    fn is_origin_allowed(&self, referer: Option<&str>, origin: Option<&str>) -> bool {
        let Some(candidate) = origin.or(referer) else {
            return false;
        };
        let Ok(url) = Url::parse(candidate.trim()) else {
            return false;
        };
        url.host_str().is_some_and(|host| self.matches_host(host))
    }

    fn label(&self) -> &'static str {
        "host_allow_list"
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
