// src/api/mod.rs

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::core::models::ScanRequest;
use crate::core::scanner::{parse_target, run_scan};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<ScanConfig>,
}

/// Body of `POST /scan`. Every scan flag defaults to `false`.
#[derive(Debug, Deserialize)]
pub struct ScanRequestBody {
    pub url: String,
    #[serde(default)]
    pub scan_ssl: bool,
    #[serde(default)]
    pub scan_cms: bool,
    #[serde(default)]
    pub scan_headers: bool,
    #[serde(default)]
    pub scan_cdn: bool,
    #[serde(default)]
    pub scan_dns: bool,
    #[serde(default)]
    pub scan_all: bool,
}

/// Routes of the API server, with permissive CORS and request tracing.
pub fn router(config: ScanConfig) -> Router {
    let state = ApiState { config: Arc::new(config) };
    Router::new()
        .route("/scan", post(scan))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

pub async fn scan(State(state): State<ApiState>, Json(body): Json<ScanRequestBody>) -> Response {
    let url = match parse_target(&body.url) {
        Ok(url) => url,
        Err(e) => {
            warn!(url = %body.url, error = %e, "Rejected scan request.");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"detail": e.to_string()})),
            )
                .into_response();
        }
    };

    let request = ScanRequest {
        url,
        ssl: body.scan_ssl,
        cms: body.scan_cms,
        headers: body.scan_headers,
        cdn: body.scan_cdn,
        dns: body.scan_dns,
        all: body.scan_all,
    };
    info!(url = %request.url, all = request.all, "Scan requested.");
    Json(run_scan(&request, &state.config).await).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    async fn call(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(ScanConfig::default()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_scan(body: serde_json::Value) -> Request<Body> {
        Request::post("/scan")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (status, body) = call(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn scan_without_flags_returns_only_the_url() {
        let (status, body) = call(post_scan(serde_json::json!({"url": "https://example.com"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"url": "https://example.com/"}));
    }

    #[tokio::test]
    async fn relative_url_is_a_500_with_detail() {
        let (status, body) = call(post_scan(serde_json::json!({"url": "example.com"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid URL 'example.com'"));
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let (status, body) = call(post_scan(serde_json::json!({"url": "ftp://example.com"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("ftp"));
    }
}
