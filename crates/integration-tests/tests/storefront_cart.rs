//! Integration tests for the session cart.
//!
//! Every request goes through a real socket with the session cookie, so the
//! cart read back is the one restored from the session snapshot.

use bejaus_core::ProductId;
use bejaus_integration_tests::TestContext;
use bejaus_storefront::catalog::{Catalog, products};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("Body is not JSON")
}

// ============================================================================
// Merge & Totals
// ============================================================================

#[tokio::test]
async fn test_same_product_and_size_merges() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .add_to_cart(json!({
            "productId": "bejaus-tshirt",
            "quantity": 1,
            "selectedSize": "M",
            "selectedColor": "Beige",
        }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .add_to_cart(json!({
            "productId": "bejaus-tshirt",
            "quantity": 1,
            "selectedSize": "M",
            "selectedColor": "Forest Green",
        }))
        .await;
    let body = body(resp).await;

    let items = body["cart"]["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    // Color of the first add is kept.
    assert_eq!(items[0]["selectedColor"], "Beige");
    assert_eq!(body["cart"]["itemCount"], 2);
    assert_eq!(body["cart"]["total"].as_f64(), Some(50.0));
    assert_eq!(body["summary"]["shipping"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_different_sizes_are_separate_lines() {
    let ctx = TestContext::new().await;

    for size in ["M", "L"] {
        let resp = ctx
            .add_to_cart(json!({"productId": "bejaus-tshirt", "selectedSize": size}))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart = ctx.cart().await;
    assert_eq!(cart["cart"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(cart["cart"]["itemCount"], 2);
}

#[tokio::test]
async fn test_shipping_below_threshold() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(json!({"productId": "bejaus-cap"})).await;
    let cart = ctx.cart().await;

    assert_eq!(cart["summary"]["subtotal"].as_f64(), Some(20.0));
    assert_eq!(cart["summary"]["shipping"].as_f64(), Some(5.99));
    assert_eq!(cart["summary"]["total"].as_f64(), Some(25.99));
    assert_eq!(
        cart["summary"]["remainingForFreeShipping"].as_f64(),
        Some(30.0)
    );
}

// ============================================================================
// Update, Remove & Clear
// ============================================================================

#[tokio::test]
async fn test_update_remove_and_clear() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(json!({"productId": "bejaus-coffee", "quantity": 2}))
        .await;
    ctx.add_to_cart(json!({"productId": "bejaus-vinyl"})).await;

    let resp = ctx
        .post(
            "/api/cart/update",
            &json!({"productId": "bejaus-coffee", "quantity": 5}),
        )
        .await;
    let cart = body(resp).await;
    assert_eq!(cart["cart"]["itemCount"], 6);
    assert_eq!(cart["cart"]["total"].as_f64(), Some(95.0));

    // Zero removes the line.
    let resp = ctx
        .post(
            "/api/cart/update",
            &json!({"productId": "bejaus-coffee", "quantity": 0}),
        )
        .await;
    let cart = body(resp).await;
    assert_eq!(cart["cart"]["itemCount"], 1);

    let resp = ctx
        .post("/api/cart/remove", &json!({"productId": "bejaus-vinyl"}))
        .await;
    let cart = body(resp).await;
    assert_eq!(cart["cart"]["items"], json!([]));

    ctx.add_to_cart(json!({"productId": "bejaus-tote"})).await;
    let resp = ctx.post("/api/cart/clear", &json!({})).await;
    let cart = body(resp).await;
    assert_eq!(cart["cart"]["itemCount"], 0);
    assert_eq!(cart["cart"]["total"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_remove_missing_line_is_noop() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(json!({"productId": "bejaus-hoodie", "selectedSize": "S"}))
        .await;
    let resp = ctx
        .post(
            "/api/cart/remove",
            &json!({"productId": "bejaus-hoodie", "selectedSize": "XL"}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await["cart"]["itemCount"], 1);
}

#[tokio::test]
async fn test_carts_are_per_visitor() {
    let alice = TestContext::new().await;
    let bob = TestContext {
        client: reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("client"),
        base_url: alice.base_url.clone(),
    };

    alice
        .add_to_cart(json!({"productId": "bejaus-vinyl"}))
        .await;

    assert_eq!(alice.cart().await["cart"]["itemCount"], 1);
    assert_eq!(bob.cart().await["cart"]["itemCount"], 0);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_add_validation() {
    let ctx = TestContext::new().await;

    let cases = [
        (json!({"productId": "nope"}), StatusCode::NOT_FOUND),
        (json!({"productId": "bejaus-tshirt"}), StatusCode::BAD_REQUEST),
        (
            json!({"productId": "bejaus-tshirt", "selectedSize": "XXL"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"productId": "bejaus-tshirt", "selectedSize": "M", "selectedColor": "Pink"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"productId": "bejaus-cap", "quantity": 0}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"productId": "bejaus-cap", "quantity": 26}),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (request, expected) in cases {
        let resp = ctx.add_to_cart(request.clone()).await;
        assert_eq!(resp.status(), expected, "request: {request}");
        let body = body(resp).await;
        assert_eq!(body["success"], false);
    }

    // Nothing was added along the way.
    assert_eq!(ctx.cart().await["cart"]["itemCount"], 0);
}

#[tokio::test]
async fn test_stock_counts_existing_line() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .add_to_cart(json!({"productId": "bejaus-cap", "quantity": 20}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .add_to_cart(json!({"productId": "bejaus-cap", "quantity": 6}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await["message"], "Only 25 left in stock.");

    let resp = ctx
        .post(
            "/api/cart/update",
            &json!({"productId": "bejaus-cap", "quantity": 30}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.cart().await["cart"]["itemCount"], 20);
}

#[tokio::test]
async fn test_update_unknown_product() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(json!({"productId": "bejaus-vinyl"})).await;

    let resp = ctx
        .post(
            "/api/cart/update",
            &json!({"productId": "bejaus-mug", "quantity": 3}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(resp).await["success"], false);

    // Zero still goes through and leaves the cart alone.
    let resp = ctx
        .post(
            "/api/cart/update",
            &json!({"productId": "bejaus-mug", "quantity": 0}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cart = ctx.cart().await;
    assert_eq!(cart["cart"]["itemCount"], 1);
    assert_eq!(cart["cart"]["items"][0]["product"]["id"], "bejaus-vinyl");
}

#[tokio::test]
async fn test_update_sold_out_product() {
    let mut sold_out = products().remove(0);
    sold_out.id = ProductId::new("bejaus-sold-out");
    sold_out.in_stock = false;
    let ctx = TestContext::with_catalog(Catalog::new(vec![sold_out])).await;

    let resp = ctx
        .post(
            "/api/cart/update",
            &json!({"productId": "bejaus-sold-out", "quantity": 2, "selectedSize": "M"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(resp).await["message"],
        "Camiseta Bejaus Sessions is out of stock."
    );
    assert_eq!(ctx.cart().await["cart"]["itemCount"], 0);
}

#[tokio::test]
async fn test_negative_quantity_is_rejected() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .add_to_cart(json!({"productId": "bejaus-cap", "quantity": -1}))
        .await;
    assert!(resp.status().is_client_error());
    assert_eq!(ctx.cart().await["cart"]["itemCount"], 0);
}
