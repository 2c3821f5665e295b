use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::{ChatRequest, ChatResponse, ErrorResponse, ScrapeResponse, ScrapeSource, ScrapingParams};
use crate::pipeline::ChatTurnOrchestrator;

const INVALID_BODY: &str = "Invalid request body";

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<ChatTurnOrchestrator>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checked_at: String,
}

pub fn router(orchestrator: Arc<ChatTurnOrchestrator>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/scrape", post(scrape))
        .route("/health", get(health))
        .with_state(AppState { orchestrator })
}

pub async fn serve(bind_address: &str, orchestrator: Arc<ChatTurnOrchestrator>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🚀 Product discovery API listening on {}", bind_address);

    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected chat request body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(INVALID_BODY, rejection.body_text())),
        )
    })?;

    match state.orchestrator.handle(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                error!("Chat turn failed: {}", e);
            } else {
                warn!("Rejected chat request: {}", e);
            }
            Err((status, Json(e.to_response())))
        }
    }
}

async fn scrape(
    State(state): State<AppState>,
    body: Result<Json<ScrapingParams>, JsonRejection>,
) -> (StatusCode, Json<ScrapeResponse>) {
    let params = match body {
        Ok(Json(params)) => params,
        Err(rejection) => {
            warn!("Rejected scrape request body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ScrapeResponse::error(INVALID_BODY, Some(rejection.body_text()))),
            );
        }
    };

    let response = state.orchestrator.discovery().discover(&params).await;
    let status = if response.source == ScrapeSource::Error {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        checked_at: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DelayPolicy, ScrapingConfig};
    use crate::fetcher::{FetchError, PageFetcher, PageRequest};
    use crate::pipeline::ProductDiscovery;
    use crate::processor::TextFeatureExtractor;
    use crate::storage::InMemoryChatStore;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    struct OfflineFetcher;

    #[async_trait]
    impl PageFetcher for OfflineFetcher {
        async fn fetch(&self, _request: &PageRequest) -> Result<String, FetchError> {
            Err(FetchError::Network("offline".to_string()))
        }
    }

    fn app() -> Router {
        let discovery = ProductDiscovery::new(Arc::new(OfflineFetcher), &ScrapingConfig::default())
            .with_delay_policy(DelayPolicy::none());
        let orchestrator = ChatTurnOrchestrator::new(
            TextFeatureExtractor::pattern_only().unwrap(),
            discovery,
            Arc::new(InMemoryChatStore::new()),
        );
        router(Arc::new(orchestrator))
    }

    async fn post_json(uri: &str, body: &str) -> (StatusCode, Value) {
        post(uri, Some("application/json"), body).await
    }

    async fn post(uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_endpoint_success() {
        let (status, body) =
            post_json("/api/chat", r#"{"message":"Show me samsung phones under 30000","user_id":"u1"}"#)
                .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["extracted_features"]["intent"], "search_products");
        assert_eq!(body["extracted_features"]["entities"]["price_range"]["max"], 30000);
        assert!(body["chat_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_chat_endpoint_validation() {
        let (status, body) = post_json("/api/chat", r#"{"user_id":"u1"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());
        assert!(body["details"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_malformed_chat_bodies_get_error_payload() {
        for body in ["not json", r#"{"message":5,"user_id":"u1"}"#] {
            let (status, payload) = post_json("/api/chat", body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
            assert_eq!(payload["success"], false);
            assert_eq!(payload["error"], "Invalid request body");
            assert!(!payload["details"].as_str().unwrap().is_empty());
        }

        let (status, payload) =
            post("/api/chat", None, r#"{"message":"iphone 15","user_id":"u1"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_scrape_body_gets_error_source() {
        let (status, payload) = post_json("/api/scrape", r#"{"keywords":["iphone"]}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["source"], "error");
        assert_eq!(payload["message"], "Invalid request body");
        assert_eq!(payload["total_found"], 0);
        assert!(payload["last_error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_scrape_endpoint() {
        let (status, body) =
            post_json("/api/scrape", r#"{"keywords":"iphone 15","max_price":70000}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "intelligent_mock");
        assert_eq!(body["scraping_attempted"], true);
        assert!(body["last_error"].as_str().unwrap().contains("offline"));

        let (status, body) = post_json("/api/scrape", r#"{"keywords":""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["source"], "error");
    }

    #[tokio::test]
    async fn test_health() {
        let Json(payload) = health().await;
        assert_eq!(payload.status, "ok");
    }
}
