//! CORS for the site's own origin.
//!
//! The frontend calls the API with the session cookie, so only the
//! configured origin is allowed and credentials are enabled.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use crate::config::StorefrontConfig;

/// CORS layer allowing the configured base URL.
///
/// Falls back to same-origin only when the base URL is not a valid origin.
#[must_use]
pub fn create_cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let origin = config.base_url.trim_end_matches('/');
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, base_url = %config.base_url, "Invalid base URL, CORS disabled");
            layer
        }
    }
}
