//! Axum HTTP boundary for the extraction pipeline.
//!
//! - `POST /scrape`  extract links from `{ "url": ... }`
//! - `GET  /links`   stored links of the caller, newest first
//! - `GET  /health`  liveness
//!
//! The credential travels as `Authorization: Bearer <token>`. Dropping a
//! connection drops the handler future, which aborts whatever remote call is
//! in flight.

use crate::config::{ServerConfig, ServiceConfig};
use crate::error::ExtractionError;
use crate::identity::HttpIdentityVerifier;
use crate::orchestrator::{ExtractionRequest, Extractor};
use crate::renderers::WebDriverRenderer;
use crate::results::{ErrorResponse, HistoryResponse, ScrapeRequest, ScrapeResponse};
use crate::store::RestLinkStore;
use crate::utils::bearer_token;
use axum::{
    Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Largest history page a caller may ask for
pub const MAX_HISTORY_LIMIT: usize = 500;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub extractor: Extractor,
    pub default_query_limit: usize,
}

/// Query parameters of `GET /links`
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Build the real clients from configuration and serve until shutdown
pub async fn run_server(config: ServiceConfig) -> Result<(), Box<dyn Error>> {
    let extractor = Extractor::new(
        Arc::new(HttpIdentityVerifier::new(&config.identity)?),
        Arc::new(WebDriverRenderer::new(config.render.clone())),
        Arc::new(RestLinkStore::new(&config.store)?),
    );
    let state = AppState {
        extractor,
        default_query_limit: config.store.default_query_limit,
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    ::log::info!("Listening on {}", listener.local_addr()?);
    ::log::info!("  POST /scrape");
    ::log::info!("  GET  /links");
    ::log::info!("  GET  /health");

    axum::serve(listener, build_app(state, &config.server)).await?;
    Ok(())
}

pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(handle_health))
        .route("/scrape", post(handle_scrape))
        .route("/links", get(handle_links))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ));

    if !config.cors_origins.is_empty() {
        let allow_origin = if config.cors_origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            AllowOrigin::list(origins)
        };
        app = app.layer(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        );
    }

    app
}

/// GET /health
pub async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /scrape
pub async fn handle_scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => {
            ::log::debug!("Rejecting scrape body: {}", e);
            return error_response(&ExtractionError::Validation(
                "expected a JSON body like {\"url\": \"...\"}".to_string(),
            ));
        }
    };

    let request = ExtractionRequest::new(body.url, credential(&headers).map(str::to_string));
    match state.extractor.extract(request).await {
        Ok(outcome) => Json(ScrapeResponse {
            data: outcome.links,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /links
pub async fn handle_links(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(state.default_query_limit)
        .clamp(1, MAX_HISTORY_LIMIT);

    match state.extractor.history(credential(&headers), limit).await {
        Ok(records) => Json(HistoryResponse { data: records }).into_response(),
        Err(e) => {
            ::log::warn!("History lookup failed: {}", e);
            error_response(&e)
        }
    }
}

fn credential(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
}

fn error_response(error: &ExtractionError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse {
        error: error.public_message(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::orchestrator::tests::{FakeIdentity, FakeRenderer};
    use crate::store::MemoryLinkStore;
    use std::sync::atomic::Ordering;

    fn state_with(renderer: Arc<FakeRenderer>) -> AppState {
        AppState {
            extractor: Extractor::new(
                Arc::new(FakeIdentity::new()),
                renderer,
                Arc::new(MemoryLinkStore::new()),
            ),
            default_query_limit: 50,
        }
    }

    fn authorized() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer valid-token"),
        );
        headers
    }

    fn scrape_body(url: &str) -> Result<Json<ScrapeRequest>, JsonRejection> {
        Ok(Json(ScrapeRequest {
            url: url.to_string(),
        }))
    }

    async fn json_of(response: Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_scrape_success_shape() {
        let renderer = Arc::new(FakeRenderer::html(
            r##"<a href="/about">About</a><a href="#top">Top</a>"##,
        ));
        let response = handle_scrape(
            State(state_with(renderer)),
            authorized(),
            scrape_body("https://example.com"),
        )
        .await;

        let (status, body) = json_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "data": [{ "href": "https://example.com/about", "title": "About" }]
            })
        );
    }

    #[tokio::test]
    async fn test_scrape_without_credential_is_401() {
        let renderer = Arc::new(FakeRenderer::html("<a href='/x'>X</a>"));
        let response = handle_scrape(
            State(state_with(renderer.clone())),
            HeaderMap::new(),
            scrape_body("https://example.com"),
        )
        .await;

        let (status, body) = json_of(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "authentication failed");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scrape_missing_url_is_400() {
        let renderer = Arc::new(FakeRenderer::html("<a href='/x'>X</a>"));
        let response =
            handle_scrape(State(state_with(renderer)), authorized(), scrape_body("")).await;

        let (status, body) = json_of(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("URL is required"));
    }

    #[tokio::test]
    async fn test_scrape_render_failure_is_502() {
        let renderer = Arc::new(FakeRenderer::failing(RenderError::Status {
            status: 500,
            message: "<html>internal trace</html>".into(),
        }));
        let response = handle_scrape(
            State(state_with(renderer)),
            authorized(),
            scrape_body("https://example.com"),
        )
        .await;

        let (status, body) = json_of(response).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("500"));
        assert!(!message.contains("internal trace"));
    }

    #[tokio::test]
    async fn test_links_returns_history() {
        let state = state_with(Arc::new(FakeRenderer::html(
            "<a href='/one'>One</a><a href='/two'>Two</a>",
        )));
        handle_scrape(
            State(state.clone()),
            authorized(),
            scrape_body("https://example.com"),
        )
        .await;

        let response = handle_links(
            State(state),
            authorized(),
            Query(HistoryQuery { limit: Some(1) }),
        )
        .await;

        let (status, body) = json_of(response).await;
        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["user_id"], "user-1");
    }

    #[tokio::test]
    async fn test_health() {
        let response = handle_health().await.into_response();
        let (status, body) = json_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
