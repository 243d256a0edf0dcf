//! Checkout route handler.
//!
//! The browser tokenizes the card with the payment widget and posts the raw
//! result here. The session is claimed in the in-flight registry before any
//! network call, so a second submit from another tab is turned away until the
//! first one has written its outcome back.

use axum::{Json, extract::State};
use bejaus_core::Email;
use bejaus_core::checkout::{CheckoutAttempt, CheckoutError, PaymentResponse, WidgetTokenResult};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::SessionCart;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub token_result: WidgetTokenResult,
    #[serde(default)]
    pub email: Option<String>,
}

/// Pay for the session cart.
///
/// On success the cart is emptied and the receipt returned. On failure the
/// cart is left as it was and the visitor may try again.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    mut cart: SessionCart,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<PaymentResponse>> {
    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;

    // A session without an ID has never stored a cart, so there is nothing
    // to charge and nothing to race.
    let _slot = match cart.session_id() {
        Some(id) => {
            let slot = state
                .in_flight()
                .acquire(id)
                .ok_or(CheckoutError::InProgress)?;
            cart.reload().await?;
            Some(slot)
        }
        None => None,
    };

    add_breadcrumb("checkout", "Checkout started", None);
    tracing::info!(items = cart.cart().items().len(), "Checkout started");

    let mut attempt = CheckoutAttempt::new();
    let outcome = bejaus_core::checkout::pay(
        &mut attempt,
        cart.engine_mut(),
        &request.token_result,
        state.payments(),
        email,
    )
    .await;
    cart.save().await?;

    let confirmation = outcome?;
    Ok(Json(PaymentResponse::succeeded(confirmation)))
}
