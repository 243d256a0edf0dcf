//! Square Connect API client and payment processors.
//!
//! # Architecture
//!
//! - [`SquareClient`] talks to the Payments and Catalog APIs with a bearer
//!   access token (server-side only)
//! - [`SimulatedProcessor`] stands in when no access token is configured and
//!   approves every payment after a short delay
//! - Both implement [`PaymentProcessor`], so checkout never knows which one
//!   it is using
//! - Catalog listings are cached via `moka` (5 minute TTL)

mod simulated;
pub mod types;

pub use simulated::SimulatedProcessor;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bejaus_core::checkout::{
    PaymentConfirmation, PaymentProcessor, PaymentRequest, PaymentResponse, ProcessorError,
    Receipt,
};
use bejaus_core::{Product, ProductCategory, ProductId, TransactionId};
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::SquareConfig;
use types::{
    CatalogListResponse, CatalogObject, CreatePaymentBody, CreatePaymentResponse, ErrorEnvelope,
    Money, Payment,
};

/// Square API version pinned for every request.
const SQUARE_VERSION: &str = "2025-01-23";

/// Errors that can occur when interacting with the Square API.
#[derive(Debug, Error)]
pub enum SquareError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for the Square Payments and Catalog APIs.
#[derive(Clone)]
pub struct SquareClient {
    inner: Arc<SquareClientInner>,
}

struct SquareClientInner {
    client: reqwest::Client,
    base_url: String,
    location_id: String,
    merch_category_id: String,
    catalog_cache: Cache<String, Arc<Vec<Product>>>,
}

impl SquareClient {
    /// Create a new Square API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SquareConfig, access_token: &SecretString) -> Result<Self, SquareError> {
        let mut headers = HeaderMap::new();

        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", access_token.expose_secret()))
                .map_err(|e| SquareError::Parse(format!("Invalid access token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert("Square-Version", HeaderValue::from_static(SQUARE_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let catalog_cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(SquareClientInner {
                client,
                base_url: config.environment.api_base_url().to_string(),
                location_id: config.location_id.clone(),
                merch_category_id: config.merch_category_id.clone(),
                catalog_cache,
            }),
        })
    }

    /// Charge a payment source.
    ///
    /// A fresh UUID idempotency key is generated per call.
    ///
    /// # Errors
    ///
    /// Returns [`SquareError::Api`] with Square's first error detail when the
    /// payment is refused, and other variants on transport or parse failures.
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, SquareError> {
        let url = format!("{}/v2/payments", self.inner.base_url);
        let body = CreatePaymentBody {
            source_id: &request.source_id,
            idempotency_key: uuid::Uuid::new_v4().to_string(),
            amount_money: Money {
                amount: request.amount,
                currency: request.currency.clone(),
            },
            location_id: &self.inner.location_id,
            buyer_email_address: request.customer_email().map(bejaus_core::Email::as_str),
            note: format!("Bejaus Sessions order - {} items", request.items.len()),
        };

        let response = self.inner.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }

        let parsed: CreatePaymentResponse =
            serde_json::from_str(&text).map_err(|e| SquareError::Parse(e.to_string()))?;

        match parsed.payment {
            Some(payment) => Ok(payment),
            None => Err(SquareError::Api {
                status: status.as_u16(),
                message: first_error_message(&parsed.errors)
                    .unwrap_or_else(|| "Payment processing failed".to_string()),
            }),
        }
    }

    /// List catalog items in the merch category as products.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list_merch_products(&self) -> Result<Arc<Vec<Product>>, SquareError> {
        let cache_key = self.inner.merch_category_id.clone();

        if let Some(products) = self.inner.catalog_cache.get(&cache_key).await {
            debug!("Cache hit for merch products");
            return Ok(products);
        }

        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut query = vec![("types", "ITEM,IMAGE")];
            if let Some(cursor) = cursor.as_deref() {
                query.push(("cursor", cursor));
            }

            let response = self
                .inner
                .client
                .get(format!("{}/v2/catalog/list", self.inner.base_url))
                .query(&query)
                .send()
                .await?;
            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(api_error(status.as_u16(), &text));
            }

            let page: CatalogListResponse =
                serde_json::from_str(&text).map_err(|e| SquareError::Parse(e.to_string()))?;
            objects.extend(page.objects);

            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        let products = Arc::new(merch_products(&objects, &self.inner.merch_category_id));
        debug!(count = products.len(), "Fetched merch products");

        self.inner
            .catalog_cache
            .insert(cache_key, Arc::clone(&products))
            .await;

        Ok(products)
    }
}

#[async_trait]
impl PaymentProcessor for SquareClient {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError> {
        match self.create_payment(request).await {
            Ok(payment) => Ok(PaymentResponse::succeeded(confirmation_for(payment, request))),
            // Square refused the charge; the detail is meant for the buyer.
            Err(SquareError::Api { status, message }) if status < 500 => {
                tracing::warn!(status, %message, "Square declined payment");
                Ok(PaymentResponse::failed(message))
            }
            Err(SquareError::Api { status, message }) => Err(ProcessorError::Transport(format!(
                "Square returned {status}: {message}"
            ))),
            Err(SquareError::Http(e)) => Err(ProcessorError::Transport(e.to_string())),
            Err(SquareError::Parse(e)) => Err(ProcessorError::InvalidResponse(e)),
        }
    }
}

/// Turn a created payment into a confirmation, filling gaps from the request.
fn confirmation_for(payment: Payment, request: &PaymentRequest) -> PaymentConfirmation {
    let money = payment.amount_money.unwrap_or_else(|| Money {
        amount: request.amount,
        currency: request.currency.clone(),
    });
    PaymentConfirmation {
        transaction_id: Some(TransactionId::new(payment.id)),
        receipt: Receipt {
            receipt_number: payment
                .receipt_number
                .unwrap_or_else(|| format!("RCP-{}", chrono::Utc::now().timestamp_millis())),
            amount: Decimal::new(money.amount, 2),
            currency: money.currency,
        },
    }
}

/// Build an `Api` error from a non-success body, preferring Square's detail.
fn api_error(status: u16, body: &str) -> SquareError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| first_error_message(&envelope.errors))
        .unwrap_or_else(|| body.to_string());
    SquareError::Api { status, message }
}

fn first_error_message(errors: &[types::ApiError]) -> Option<String> {
    errors.first().map(|e| {
        e.detail
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("{}: {}", e.category, e.code))
    })
}

/// Keep items in `category_id` and map them to products.
///
/// The first image id is resolved against the listed IMAGE objects; the
/// price comes from the first variation (minor units).
fn merch_products(objects: &[CatalogObject], category_id: &str) -> Vec<Product> {
    let images: HashMap<&str, &str> = objects
        .iter()
        .filter(|obj| obj.object_type == "IMAGE")
        .filter_map(|obj| Some((obj.id.as_str(), obj.image_data.as_ref()?.url.as_str())))
        .collect();

    objects
        .iter()
        .filter(|obj| obj.object_type == "ITEM")
        .filter_map(|obj| Some((obj, obj.item_data.as_ref()?)))
        .filter(|(_, item)| item.categories.iter().any(|c| c.id == category_id))
        .map(|(obj, item)| {
            let price_minor = item
                .variations
                .first()
                .and_then(|v| v.item_variation_data.as_ref())
                .and_then(|v| v.price_money.as_ref())
                .map_or(0, |m| m.amount);
            let images = item
                .image_ids
                .first()
                .and_then(|id| images.get(id.as_str()))
                .map(|url| vec![(*url).to_string()])
                .unwrap_or_default();

            Product {
                id: ProductId::new(obj.id.clone()),
                name: item.name.clone(),
                description: item.description.clone().unwrap_or_default(),
                price: Decimal::new(price_minor, 2),
                images,
                category: ProductCategory::Merch,
                sizes: None,
                colors: None,
                // The catalog does not report inventory.
                in_stock: true,
                stock_count: None,
                featured: false,
            }
        })
        .collect()
}
