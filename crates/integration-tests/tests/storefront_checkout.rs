//! Integration tests for checkout and the payment endpoints.

use std::sync::Arc;
use std::time::Duration;

use bejaus_integration_tests::{
    CountingProcessor, DecliningProcessor, GatedProcessor, StallingProcessor, TestContext,
    UnreachableProcessor, ok_token,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("Body is not JSON")
}

async fn fill_cart(ctx: &TestContext) -> Value {
    let resp = ctx
        .add_to_cart(json!({"productId": "bejaus-tshirt", "quantity": 2, "selectedSize": "M"}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    ctx.cart().await
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_successful_checkout_clears_cart() {
    let ctx = TestContext::new().await;
    fill_cart(&ctx).await;

    let resp = ctx.checkout().await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body(resp).await;
    assert_eq!(body["success"], true);
    assert!(
        body["transactionId"]
            .as_str()
            .is_some_and(|id| id.starts_with("txn_"))
    );
    assert!(
        body["receipt"]["receiptNumber"]
            .as_str()
            .is_some_and(|r| r.starts_with("RCP-"))
    );
    // 2 x 25.00, free shipping.
    assert_eq!(body["receipt"]["amount"].as_f64(), Some(50.0));
    assert_eq!(body["receipt"]["currency"], "EUR");

    assert_eq!(ctx.cart().await["cart"]["itemCount"], 0);
}

#[tokio::test]
async fn test_next_checkout_starts_fresh() {
    let ctx = TestContext::new().await;

    fill_cart(&ctx).await;
    assert_eq!(ctx.checkout().await.status(), StatusCode::OK);

    fill_cart(&ctx).await;
    assert_eq!(ctx.checkout().await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_declined_checkout_preserves_cart() {
    let ctx = TestContext::with_processor(Arc::new(DecliningProcessor("declined"))).await;
    let before = fill_cart(&ctx).await;

    let resp = ctx.checkout().await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "declined");

    assert_eq!(ctx.cart().await, before);

    // A failed attempt can be retried.
    assert_eq!(ctx.checkout().await.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_unreachable_processor_preserves_cart() {
    let ctx = TestContext::with_processor(Arc::new(UnreachableProcessor)).await;
    let before = fill_cart(&ctx).await;

    let resp = ctx.checkout().await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let message = body(resp).await["message"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(!message.contains("connection refused"));

    assert_eq!(ctx.cart().await, before);
}

#[tokio::test]
async fn test_tokenization_error_preserves_cart() {
    let ctx = TestContext::new().await;
    let before = fill_cart(&ctx).await;

    let resp = ctx
        .post(
            "/api/checkout",
            &json!({
                "tokenResult": {
                    "status": "INVALID_CARD",
                    "errors": [{"detail": "Card number is invalid"}],
                },
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body(resp).await["message"], "Card number is invalid");

    assert_eq!(ctx.cart().await, before);
}

#[tokio::test]
async fn test_empty_cart_checkout() {
    let ctx = TestContext::new().await;

    let resp = ctx.checkout().await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await["message"], "Your cart is empty.");
}

#[tokio::test]
async fn test_invalid_email_checkout() {
    let ctx = TestContext::new().await;
    let before = fill_cart(&ctx).await;

    let mut request = ok_token("cnon:ok");
    request["email"] = json!("not-an-email");
    let resp = ctx.post("/api/checkout", &request).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.cart().await, before);
}

#[tokio::test]
async fn test_second_submit_while_in_flight_is_rejected() {
    let processor = Arc::new(GatedProcessor::default());
    let ctx = Arc::new(TestContext::with_processor(processor.clone()).await);
    fill_cart(&ctx).await;

    let first = tokio::spawn({
        let ctx = Arc::clone(&ctx);
        async move { ctx.checkout().await.status() }
    });

    processor.entered.notified().await;
    let resp = ctx.checkout().await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
        body(resp).await["message"],
        "Your payment is already being processed."
    );

    processor.release.notify_one();
    assert_eq!(first.await.expect("checkout task"), StatusCode::OK);
    assert_eq!(ctx.cart().await["cart"]["itemCount"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_submits_charge_once() {
    let processor = Arc::new(CountingProcessor::default());
    let ctx = TestContext::with_processor(processor.clone()).await;

    for round in 1..=10 {
        fill_cart(&ctx).await;

        let (a, b) = tokio::join!(ctx.checkout(), ctx.checkout());
        let mut statuses = [a.status(), b.status()];
        statuses.sort();

        assert_eq!(statuses[0], StatusCode::OK, "round {round}: {statuses:?}");
        assert!(
            matches!(statuses[1], StatusCode::CONFLICT | StatusCode::BAD_REQUEST),
            "round {round}: {statuses:?}"
        );
        assert_eq!(processor.submissions(), round);
        assert_eq!(ctx.cart().await["cart"]["itemCount"], 0);
    }
}

#[tokio::test]
async fn test_abandoned_checkout_does_not_lock_session() {
    let ctx = TestContext::with_processor(Arc::new(StallingProcessor::default())).await;
    fill_cart(&ctx).await;

    let abandoned = ctx
        .client
        .post(format!("{}/api/checkout", ctx.base_url))
        .json(&ok_token("cnon:card-nonce-ok"))
        .timeout(Duration::from_millis(300))
        .send()
        .await;
    assert!(abandoned.is_err_and(|e| e.is_timeout()));

    // The server drops the handler once it sees the closed connection.
    let mut status = StatusCode::CONFLICT;
    for _ in 0..50 {
        let resp = ctx.checkout().await;
        status = resp.status();
        if status != StatusCode::CONFLICT {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.cart().await["cart"]["itemCount"], 0);
}

// ============================================================================
// Payment endpoint
// ============================================================================

#[tokio::test]
async fn test_square_payment_simulated() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            "/api/square-payment",
            &json!({
                "sourceId": "cnon:card-nonce-ok",
                "amount": 2599,
                "currency": "EUR",
                "items": [{"id": "bejaus-cap", "name": "Gorra Bejaus Sessions", "quantity": 1, "price": 2000}],
                "customer": {"email": "buyer@example.com"},
            }),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["receipt"]["amount"].as_f64(), Some(25.99));
}

#[tokio::test]
async fn test_square_payment_validation() {
    let ctx = TestContext::new().await;

    for request in [
        json!({"sourceId": "", "amount": 100, "currency": "EUR"}),
        json!({"sourceId": "cnon:ok", "amount": 0, "currency": "EUR"}),
    ] {
        let resp = ctx.post("/api/square-payment", &request).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_square_payment_declined() {
    let ctx = TestContext::with_processor(Arc::new(DecliningProcessor("CARD_DECLINED"))).await;

    let resp = ctx
        .post(
            "/api/square-payment",
            &json!({"sourceId": "cnon:ok", "amount": 100, "currency": "EUR"}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await["error"], "CARD_DECLINED");
}
