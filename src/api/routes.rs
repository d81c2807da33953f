//! API Routes

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    call_tool_handler, health_handler, list_resources_handler, list_tools_handler,
    read_resource_handler, stats_handler, AppState,
};

/// Builds the router with every endpoint, CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools", get(list_tools_handler))
        .route("/tools/:name", post(call_tool_handler))
        .route("/resources", get(list_resources_handler))
        .route("/resources/read", get(read_resource_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::cache::{CacheConfig, CacheStore};
    use crate::error::TransportError;
    use crate::gateway::{FetchGateway, RetryPolicy};
    use crate::tools::ToolRegistry;
    use crate::upstream::{Transport, UpstreamRequest};

    struct NoUpstream;

    #[async_trait]
    impl Transport for NoUpstream {
        async fn call(&self, _request: &UpstreamRequest) -> Result<Value, TransportError> {
            Err(TransportError::Status {
                status: 400,
                body: "unavailable in tests".to_string(),
            })
        }
    }

    fn create_test_app() -> Router {
        let cache = Arc::new(CacheStore::new(CacheConfig::default()));
        let gateway = Arc::new(FetchGateway::new(cache, Arc::new(NoUpstream), RetryPolicy::default()));
        let state = AppState::new(gateway, ToolRegistry::with_default_tools(), "test server");
        create_router(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "test server");
    }

    #[tokio::test]
    async fn test_list_tools_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["tools"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_list_resources_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/resources").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["templates"].as_array().unwrap().len(), 4);
        assert_eq!(
            json["templates"][1]["uri_template"],
            "bill://xml/{biennium}/{chamber}/{bill_number}"
        );
    }

    #[tokio::test]
    async fn test_read_pdf_resource() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/resources/read?uri=bill%3A%2F%2Fpdf%2F2025-26%2FHouse%2F1234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["uri"], "bill://pdf/2025-26/House/1234");
        assert_eq!(json["contents"]["mime_type"], "application/pdf");
    }

    #[tokio::test]
    async fn test_read_invalid_resource_is_bad_request() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/resources/read?uri=bill%3A%2F%2Fxml%2F2025-26%2Fhouse%2F1234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Invalid chamber: house"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_bad_request() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tools/repeal_bill")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"arguments": {}}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Unknown tool: repeal_bill");
    }

    #[tokio::test]
    async fn test_upstream_rejection_is_bad_gateway() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tools/get_committees")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"arguments":{"biennium":"2025-26"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
