// 🌐 HTTP surface - classifier endpoints plus the `/api` reverse proxy
//
// The proxy routes write their own CORS headers (preflight included), so the
// tower-http CORS layer only wraps the local endpoints.

use crate::catalog::StockEntry;
use crate::classifier::{SelectionMode, TopicClassifier};
use crate::proxy::{Forwarder, ProxyRequest, ProxyResponse};
use crate::tags::StockTag;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{any, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<TopicClassifier>,
    pub forwarder: Arc<Forwarder>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(classifier: TopicClassifier, forwarder: Forwarder) -> Self {
        AppState {
            classifier: Arc::new(classifier),
            forwarder: Arc::new(forwarder),
            started_at: Utc::now(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(rejection) => rejection.status(),
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub upstream: String,
    pub started_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub mode: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub manual_codes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagsResponse {
    pub tags: Vec<StockTag>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "OK".to_string(),
        version: crate::VERSION.to_string(),
        upstream: state.forwarder.config().upstream_origin.clone(),
        started_at: state.started_at,
        timestamp: Utc::now(),
    }))
}

/// POST /classify - Tags for one topic title
async fn classify_title(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TagsResponse>>, AppError> {
    let Json(req) = payload?;
    let tags = state.classifier.classify(&req.title);

    Ok(Json(ApiResponse::ok(TagsResponse { tags })))
}

/// POST /tags/select - Trending, manual or mixed tag list
async fn select_tags(
    State(state): State<AppState>,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TagsResponse>>, AppError> {
    let Json(req) = payload?;
    let mode: SelectionMode = req.mode.parse().map_err(AppError::BadRequest)?;
    let tags = state.classifier.select(mode, &req.title, &req.manual_codes);

    Ok(Json(ApiResponse::ok(TagsResponse { tags })))
}

/// GET /catalog/:code - Catalog lookup
async fn catalog_entry(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<StockEntry>>, AppError> {
    state
        .classifier
        .catalog_entry(&code)
        .cloned()
        .map(|entry| Json(ApiResponse::ok(entry)))
        .ok_or_else(|| AppError::NotFound(format!("stock code {}", code)))
}

/// ANY /api/*path - Relay to the upstream backend
async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = ProxyRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(|q| q.to_string()),
        headers,
        body,
    };

    into_response(state.forwarder.forward(request).await)
}

fn into_response(proxied: ProxyResponse) -> Response {
    let mut response = Response::new(Body::from(proxied.body));
    *response.status_mut() = proxied.status;
    *response.headers_mut() = proxied.headers;
    response
}

// ============================================================================
// Router
// ============================================================================

pub fn create_app(state: AppState) -> Router {
    let local_routes = Router::new()
        .route("/health", get(health_check))
        .route("/classify", post(classify_title))
        .route("/tags/select", post(select_tags))
        .route("/catalog/:code", get(catalog_entry))
        .layer(CorsLayer::permissive());

    let proxy_routes = Router::new()
        .route("/api", any(proxy))
        .route("/api/*path", any(proxy))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .merge(local_routes)
        .merge(proxy_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::{echo_upstream, spawn_upstream};
    use crate::proxy::ForwarderConfig;
    use crate::tags::TagOrigin;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn app(origin: &str) -> Router {
        let classifier = TopicClassifier::builtin().unwrap();
        let forwarder = Forwarder::new(ForwarderConfig::new(origin)).unwrap();
        create_app(AppState::new(classifier, forwarder))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app("http://backend.test")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["upstream"], "http://backend.test");
    }

    #[tokio::test]
    async fn test_classify_endpoint() {
        let response = app("http://backend.test")
            .oneshot(post_json("/classify", r#"{"title":"台積電 大盤"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let tags: Vec<StockTag> = serde_json::from_value(json["data"]["tags"].clone()).unwrap();
        let codes: Vec<&str> = tags.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["2330", "2317", "2454"]);
    }

    #[tokio::test]
    async fn test_select_mixed_endpoint() {
        let response = app("http://backend.test")
            .oneshot(post_json(
                "/tags/select",
                r#"{"mode":"mixed","title":"長榮","manual_codes":["2603","2330"]}"#,
            ))
            .await
            .unwrap();

        let json = body_json(response).await;
        let tags: Vec<StockTag> = serde_json::from_value(json["data"]["tags"].clone()).unwrap();

        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].code, "2603");
        assert_eq!(tags[0].origin, TagOrigin::Trending);
        assert_eq!(tags[1].code, "2603");
        assert_eq!(tags[1].origin, TagOrigin::Manual);
    }

    #[tokio::test]
    async fn test_select_rejects_unknown_mode() {
        let response = app("http://backend.test")
            .oneshot(post_json("/tags/select", r#"{"mode":"auto","title":"x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_catalog_lookup() {
        let router = app("http://backend.test");

        let response = router
            .clone()
            .oneshot(Request::get("/catalog/2881").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["name"], "富邦金");

        let response = router
            .oneshot(Request::get("/catalog/0000").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_routes_are_proxied() {
        let hits = Arc::new(AtomicUsize::new(0));
        let origin = spawn_upstream(echo_upstream(hits.clone())).await;

        let response = app(&origin)
            .oneshot(
                Request::get("/api/dashboard/kols?limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let json = body_json(response).await;
        assert_eq!(json["uri"], "/api/dashboard/kols?limit=10");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_api_preflight_answered_locally() {
        let hits = Arc::new(AtomicUsize::new(0));
        let origin = spawn_upstream(echo_upstream(hits.clone())).await;

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/posts")
            .header("origin", "http://dashboard.test")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(&origin).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(response.headers().contains_key("access-control-allow-methods"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_large_api_body_is_relayed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let origin = spawn_upstream(echo_upstream(hits.clone())).await;

        // Well past axum's 2 MB extractor default
        let payload = format!("\"{}\"", "a".repeat(3 * 1024 * 1024));
        let response = app(&origin)
            .oneshot(post_json("/api/posts", &payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let json = body_json(response).await;
        assert_eq!(json["body_len"], payload.len());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_envelope() {
        let response = app("http://backend.test")
            .oneshot(post_json("/classify", r#"{"title": "台積電""#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_error_envelope() {
        let request = Request::builder()
            .method("POST")
            .uri("/tags/select")
            .body(Body::from(r#"{"mode":"trending","title":"長榮"}"#))
            .unwrap();
        let response = app("http://backend.test").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_field_type_keeps_extractor_status() {
        let response = app("http://backend.test")
            .oneshot(post_json("/classify", r#"{"title": 42}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["success"], false);
    }
}
