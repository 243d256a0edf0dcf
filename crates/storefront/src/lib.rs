//! Bejaus Sessions storefront library.
//!
//! This crate provides the storefront BFF as a library, allowing it to be
//! tested in-process and served by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod square;
pub mod state;

use axum::{Router, body::Body, http::Request};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the storefront router with its middleware stack.
///
/// Sentry layers are added by the binary so tests run without a hub.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let cors_layer = middleware::create_cors_layer(state.config());

    routes::routes()
        .layer(session_layer)
        .layer(cors_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    fn test_app() -> Router {
        let mut config = StorefrontConfig::default();
        config.square.simulated_delay = Duration::ZERO;
        app(AppState::new(config).unwrap())
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = test_app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_health_and_ping() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));

        let (status, body) = get("/api/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "pong");
    }

    #[tokio::test]
    async fn test_products() {
        let (status, body) = get("/api/products?category=clothing&sort=price").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["bejaus-tshirt", "bejaus-hoodie"]);

        let (status, body) = get("/api/products/bejaus-vinyl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "vinyl");

        let (status, body) = get("/api/products/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_square_config_is_public_only() {
        let (status, body) = get("/api/square-config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["environment"], "sandbox");
        assert!(body.get("accessToken").is_none());
        assert!(body["applicationId"].is_string());
    }

    #[tokio::test]
    async fn test_unconfigured_proxies() {
        let (status, body) = get("/api/youtube-videos").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Configuration error");

        let (status, _) = get("/api/square-products").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let (status, body) = get("/api/cart").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["itemCount"], 0);
        assert_eq!(body["cart"]["items"], serde_json::json!([]));
    }
}
