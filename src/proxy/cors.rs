// Permissive CORS headers written on every proxy response, errors included.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS";

#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_headers: HeaderValue,
}

impl CorsHeaders {
    /// `Content-Type` is always allowed; the forwarded allowlist is appended.
    pub fn new(header_allowlist: &[HeaderName]) -> Self {
        let mut names = vec!["Content-Type".to_string()];
        for name in header_allowlist {
            if name.as_str() != "content-type" {
                names.push(name.as_str().to_string());
            }
        }

        // Valid header names are always valid header values
        let allow_headers = HeaderValue::from_str(&names.join(", "))
            .unwrap_or_else(|_| HeaderValue::from_static("Content-Type"));

        CorsHeaders { allow_headers }
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }
}
