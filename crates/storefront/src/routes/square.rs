//! Square payment endpoints used by the browser payment form.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bejaus_core::Product;
use bejaus_core::checkout::{PaymentRequest, PaymentResponse};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Public settings the payment form needs. Never carries the access token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquarePublicConfig {
    pub application_id: String,
    pub location_id: String,
    pub environment: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SquareProducts {
    pub products: Vec<Product>,
}

/// Submit a tokenized payment.
///
/// Answers 200 with the receipt on success and 400 with
/// `{ success: false, error }` otherwise.
#[instrument(skip_all, fields(amount = request.amount, currency = %request.currency))]
pub async fn payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> impl IntoResponse {
    if request.source_id.trim().is_empty() {
        return failed("Missing payment source");
    }
    if request.amount <= 0 {
        return failed("Invalid payment amount");
    }

    match state.payments().submit(&request).await {
        Ok(response) if response.success => (StatusCode::OK, Json(response)),
        Ok(response) => {
            tracing::warn!(error = ?response.error, "Payment declined");
            (StatusCode::BAD_REQUEST, Json(response))
        }
        Err(e) => {
            tracing::error!(error = %e, "Payment processing failed");
            failed("Payment processing failed")
        }
    }
}

fn failed(message: &str) -> (StatusCode, Json<PaymentResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(PaymentResponse::failed(message)),
    )
}

/// Application id, location id and environment for the payment form.
#[instrument(skip(state))]
pub async fn config(State(state): State<AppState>) -> Json<SquarePublicConfig> {
    let square = &state.config().square;
    Json(SquarePublicConfig {
        application_id: square.application_id.clone(),
        location_id: square.location_id.clone(),
        environment: square.environment.as_str(),
    })
}

/// Merch items from the Square catalog.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Result<Json<SquareProducts>> {
    let client = state
        .square()
        .ok_or(AppError::NotConfigured("The Square catalog"))?;
    let products = client.list_merch_products().await?;
    Ok(Json(SquareProducts {
        products: (*products).clone(),
    }))
}
