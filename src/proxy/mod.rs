// 🔀 Reverse Proxy - thin pass-through to the posting backend
//
// One forwarder, parameterized by origin, header allowlist and timeout.
// It knows nothing about payloads: bodies go out and come back as bytes.

pub mod config;
pub mod cors;
pub mod error;
pub mod forwarder;

#[cfg(test)]
pub(crate) mod test_support;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

pub use config::{ForwarderConfig, DEFAULT_UPSTREAM_ORIGIN};
pub use error::{ErrorEnvelope, ProxyError};
pub use forwarder::Forwarder;

/// Inbound request as seen by the forwarder
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,

    /// Full inbound path, e.g. `/api/kol/list`
    pub path: String,

    /// Raw query string without the leading `?`
    pub query: Option<String>,

    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ProxyRequest {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Response handed back to the hosting runtime
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}
