use super::config::ForwarderConfig;
use super::cors::CorsHeaders;
use super::error::ProxyError;
use super::{ProxyRequest, ProxyResponse};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use std::time::Instant;
use tracing::Instrument;

/// Reverse proxy to a single upstream origin.
///
/// One upstream attempt per inbound request, no retries. The whole upstream
/// body is buffered before it is relayed.
pub struct Forwarder {
    config: ForwarderConfig,
    client: reqwest::Client,
    cors: CorsHeaders,
}

impl Forwarder {
    pub fn new(config: ForwarderConfig) -> Result<Self, ProxyError> {
        // The backend is always addressed directly, never through HTTP_PROXY
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ProxyError::Client)?;

        let cors = CorsHeaders::new(&config.header_allowlist);

        Ok(Forwarder {
            config,
            client,
            cors,
        })
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Relay `request` and always produce a response.
    ///
    /// Transport failures become a `500` carrying `{ error, message }`.
    pub async fn forward(&self, request: ProxyRequest) -> ProxyResponse {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "proxy",
            %request_id,
            method = %request.method,
            path = %request.path
        );

        async move {
            match self.try_forward(request).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::error!(
                        target_url = err.target().unwrap_or("<none>"),
                        error = %err,
                        "proxy request failed"
                    );
                    self.error_response(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Relay `request`, surfacing transport failures to the caller.
    pub async fn try_forward(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        if request.method == Method::OPTIONS {
            tracing::debug!("answering preflight locally");
            return Ok(self.preflight_response());
        }

        let target = self
            .config
            .target_url(&request.path, request.query.as_deref());
        let url = Url::parse(&target).map_err(|e| ProxyError::InvalidTarget {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(self.upstream_headers(&request.headers));

        if let Some(body) = upstream_body(&request.method, &request.body) {
            builder = builder.body(body);
        }

        tracing::debug!(target_url = %target, "forwarding upstream");
        let started = Instant::now();

        let upstream = builder
            .send()
            .await
            .map_err(|e| ProxyError::from_reqwest(&target, e))?;

        let status = upstream.status();
        let content_type = upstream
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        let body = upstream
            .bytes()
            .await
            .map_err(|e| ProxyError::from_reqwest(&target, e))?;

        tracing::info!(
            target_url = %target,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "relayed upstream response"
        );

        let mut headers = HeaderMap::new();
        self.cors.apply(&mut headers);
        headers.insert(CONTENT_TYPE, content_type);

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }

    /// Allowlisted inbound headers plus a fixed JSON content type
    fn upstream_headers(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for name in &self.config.header_allowlist {
            for value in inbound.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn preflight_response(&self) -> ProxyResponse {
        let mut headers = HeaderMap::new();
        self.cors.apply(&mut headers);

        ProxyResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::new(),
        }
    }

    fn error_response(&self, err: &ProxyError) -> ProxyResponse {
        let mut headers = HeaderMap::new();
        self.cors.apply(&mut headers);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = serde_json::to_vec(&err.envelope()).unwrap_or_default();

        ProxyResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers,
            body: Bytes::from(body),
        }
    }
}

/// Body sent upstream for `method`.
///
/// GET and HEAD never carry one, nor does an empty inbound body. A body that
/// is already JSON goes out untouched; anything else is sent as a JSON string.
pub fn upstream_body(method: &Method, body: &Bytes) -> Option<Bytes> {
    if *method == Method::GET || *method == Method::HEAD {
        return None;
    }

    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }

    if serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok() {
        return Some(body.clone());
    }

    let text = String::from_utf8_lossy(body);
    serde_json::to_vec(&text).ok().map(Bytes::from)
}

// ============================================================================
// TESTS
// ============================================================================
