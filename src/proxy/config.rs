// Forwarder configuration: where to send requests and which headers survive.

use reqwest::header::HeaderName;
use std::env;
use std::time::Duration;

/// Used when `UPSTREAM_ORIGIN` is not set
pub const DEFAULT_UPSTREAM_ORIGIN: &str = "http://localhost:8000";

pub const UPSTREAM_ORIGIN_ENV: &str = "UPSTREAM_ORIGIN";
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_MS";
pub const HEADER_ALLOWLIST_ENV: &str = "PROXY_HEADER_ALLOWLIST";

/// Inbound headers copied to the upstream request by default
pub const DEFAULT_HEADER_ALLOWLIST: &[&str] = &["authorization", "x-requested-with"];

#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Scheme + host (+ optional base path) of the backend
    pub upstream_origin: String,

    /// Inbound headers forwarded upstream; everything else is dropped
    pub header_allowlist: Vec<HeaderName>,

    /// Whole-request timeout. `None` leaves it to the hosting platform.
    pub timeout: Option<Duration>,
}

impl ForwarderConfig {
    pub fn new(upstream_origin: impl Into<String>) -> Self {
        ForwarderConfig {
            upstream_origin: upstream_origin.into(),
            header_allowlist: parse_header_allowlist(&DEFAULT_HEADER_ALLOWLIST.join(",")),
            timeout: None,
        }
    }

    pub fn with_header_allowlist(mut self, allowlist: Vec<HeaderName>) -> Self {
        self.header_allowlist = allowlist;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read the forwarder settings from the process environment.
    ///
    /// Missing or unparsable values fall back to defaults; this never fails.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream_origin = lookup(UPSTREAM_ORIGIN_ENV)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_ORIGIN.to_string());

        let header_allowlist = lookup(HEADER_ALLOWLIST_ENV)
            .map(|s| parse_header_allowlist(&s))
            .unwrap_or_else(|| parse_header_allowlist(&DEFAULT_HEADER_ALLOWLIST.join(",")));

        let timeout = lookup(UPSTREAM_TIMEOUT_ENV)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        ForwarderConfig {
            upstream_origin,
            header_allowlist,
            timeout,
        }
    }

    /// `origin + path (+ "?" + query)`, path and query kept byte for byte
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let origin = self.upstream_origin.trim_end_matches('/');
        let mut url = String::with_capacity(origin.len() + path.len() + 16);

        url.push_str(origin);
        if !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);

        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }

        url
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UPSTREAM_ORIGIN)
    }
}

/// Comma-separated header names; invalid names are dropped with a warning
pub fn parse_header_allowlist(raw: &str) -> Vec<HeaderName> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|name| match HeaderName::from_bytes(name.to_lowercase().as_bytes()) {
            Ok(header) => Some(header),
            Err(_) => {
                tracing::warn!(header = name, "ignoring invalid header name in allowlist");
                None
            }
        })
        .collect()
}
