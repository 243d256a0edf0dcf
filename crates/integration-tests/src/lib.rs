//! Integration tests for the Bejaus Sessions storefront.
//!
//! Each test serves the storefront router on an ephemeral local port and
//! talks to it through a cookie-keeping `reqwest` client, so the session
//! cart survives across requests exactly as it does for a browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bejaus-integration-tests
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bejaus_core::checkout::{
    PaymentProcessor, PaymentRequest, PaymentResponse, ProcessorError, Receipt,
};
use bejaus_storefront::catalog::Catalog;
use bejaus_storefront::config::StorefrontConfig;
use bejaus_storefront::square::SimulatedProcessor;
use bejaus_storefront::state::AppState;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::sync::Notify;

/// A running storefront plus a client holding one visitor's session.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Storefront with the simulated processor and no artificial delay.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn new() -> Self {
        let state = AppState::new(test_config()).expect("Failed to build state");
        Self::serve(state).await
    }

    /// Storefront submitting payments to `processor`.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_processor(processor: Arc<dyn PaymentProcessor>) -> Self {
        let state = AppState::with_payment_processor(test_config(), processor)
            .expect("Failed to build state");
        Self::serve(state).await
    }

    /// Storefront serving `catalog` with the simulated processor.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_catalog(catalog: Catalog) -> Self {
        let processor = Arc::new(SimulatedProcessor::new(Duration::ZERO));
        let state = AppState::with_catalog(test_config(), catalog, processor)
            .expect("Failed to build state");
        Self::serve(state).await
    }

    async fn serve(state: AppState) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let app = bejaus_storefront::app(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{addr}"),
        }
    }

    /// GET `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("GET failed")
    }

    /// POST `body` as JSON to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    /// Add a product to the session cart and return the response.
    pub async fn add_to_cart(&self, body: Value) -> Response {
        self.post("/api/cart/add", &body).await
    }

    /// Current cart body (`{ cart, summary }`).
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    pub async fn cart(&self) -> Value {
        self.get("/api/cart")
            .await
            .json()
            .await
            .expect("Cart body is not JSON")
    }

    /// POST a checkout with a successful widget token.
    pub async fn checkout(&self) -> Response {
        self.post("/api/checkout", &ok_token("cnon:card-nonce-ok"))
            .await
    }
}

/// Checkout body carrying a successful tokenize result.
#[must_use]
pub fn ok_token(token: &str) -> Value {
    json!({
        "tokenResult": { "status": "OK", "token": token },
        "email": "buyer@example.com",
    })
}

fn test_config() -> StorefrontConfig {
    let mut config = StorefrontConfig::default();
    config.square.simulated_delay = Duration::ZERO;
    config
}

fn receipt(request: &PaymentRequest) -> Receipt {
    Receipt {
        receipt_number: "RCP-TEST".to_string(),
        amount: Decimal::new(request.amount, 2),
        currency: request.currency.clone(),
    }
}

/// Declines every payment with the given message.
pub struct DecliningProcessor(pub &'static str);

#[async_trait]
impl PaymentProcessor for DecliningProcessor {
    async fn submit(&self, _request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError> {
        Ok(PaymentResponse::failed(self.0))
    }
}

/// Fails every submission at the transport level.
pub struct UnreachableProcessor;

#[async_trait]
impl PaymentProcessor for UnreachableProcessor {
    async fn submit(&self, _request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError> {
        Err(ProcessorError::Transport("connection refused".to_string()))
    }
}

/// Holds each submission until released, then approves it.
#[derive(Default)]
pub struct GatedProcessor {
    /// Signalled when a submission reaches the processor.
    pub entered: Notify,
    /// Notify once to let the held submission finish.
    pub release: Notify,
}

#[async_trait]
impl PaymentProcessor for GatedProcessor {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(PaymentResponse {
            success: true,
            transaction_id: Some("txn_gated".to_string()),
            receipt: Some(receipt(request)),
            error: None,
        })
    }
}

/// Counts submissions and approves each after a short delay.
#[derive(Default)]
pub struct CountingProcessor {
    submissions: AtomicUsize,
}

impl CountingProcessor {
    /// Submissions received so far.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for CountingProcessor {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError> {
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(PaymentResponse {
            success: true,
            transaction_id: Some(format!("txn_{n}")),
            receipt: Some(receipt(request)),
            error: None,
        })
    }
}

/// Never answers the first submission; approves every later one.
#[derive(Default)]
pub struct StallingProcessor {
    submissions: AtomicUsize,
}

#[async_trait]
impl PaymentProcessor for StallingProcessor {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError> {
        if self.submissions.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(PaymentResponse {
            success: true,
            transaction_id: Some("txn_after_stall".to_string()),
            receipt: Some(receipt(request)),
            error: None,
        })
    }
}
