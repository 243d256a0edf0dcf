//! HTTP route handlers for the storefront BFF.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /api/ping               - Ping
//!
//! # Catalog
//! GET  /api/products           - Product listing (?category=&sort=)
//! GET  /api/products/{id}      - Product detail
//!
//! # Cart (session-scoped)
//! GET  /api/cart               - Cart and order summary
//! POST /api/cart/add           - Add to cart
//! POST /api/cart/update        - Set line quantity
//! POST /api/cart/remove        - Remove line
//! POST /api/cart/clear         - Empty cart
//!
//! # Checkout
//! POST /api/checkout           - Pay for the session cart
//!
//! # Square
//! POST /api/square-payment     - Submit a tokenized payment
//! GET  /api/square-config      - Public payment form settings
//! GET  /api/square-products    - Merch from the Square catalog
//!
//! # Proxies
//! POST /api/subscribe          - Newsletter sign-up
//! GET  /api/youtube-videos     - Channel video listing
//! ```

pub mod cart;
pub mod checkout;
pub mod newsletter;
pub mod products;
pub mod square;
pub mod videos;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .route("/square-payment", post(square::payment))
        .route("/square-config", get(square::config))
        .route("/square-products", get(square::products))
        .route("/subscribe", post(newsletter::subscribe))
        .route("/youtube-videos", get(videos::index))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}
