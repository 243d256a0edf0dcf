//! Boundary types for the tokenization widget and the payment processor.
//!
//! Both sides hand us loosely-shaped JSON. The types here accept that shape
//! and convert it into typed results before anything else looks at it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PaymentRequest;
use super::error::CheckoutError;
use crate::types::TransactionId;

/// Errors from the tokenization widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// The widget rejected the card details.
    #[error("{0}")]
    Rejected(String),

    /// The widget reported success but produced no token.
    #[error("tokenization produced no token")]
    MissingToken,

    /// The widget could not be used at all.
    #[error("payment form unavailable: {0}")]
    Unavailable(String),
}

/// Opaque, non-empty payment source token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PaymentToken(String);

impl PaymentToken {
    /// # Errors
    ///
    /// [`TokenizeError::MissingToken`] if the token is blank.
    pub fn new(token: impl Into<String>) -> Result<Self, TokenizeError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TokenizeError::MissingToken);
        }
        Ok(Self(token))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Produces a payment token from the mounted payment form.
#[async_trait]
pub trait PaymentTokenizer: Send + Sync {
    async fn tokenize(&self) -> Result<PaymentToken, TokenizeError>;
}

/// One validation error reported by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetTokenError {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Raw result of the browser widget's `tokenize()` call, as posted to us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetTokenResult {
    pub status: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub errors: Vec<WidgetTokenError>,
}

impl WidgetTokenResult {
    /// Status reported by the widget for a successful tokenization.
    pub const STATUS_OK: &'static str = "OK";

    /// Validate the widget output.
    ///
    /// # Errors
    ///
    /// [`TokenizeError::Rejected`] with the first error's detail (or message)
    /// for a non-OK status, [`TokenizeError::MissingToken`] for an OK status
    /// without a usable token.
    pub fn into_token(self) -> Result<PaymentToken, TokenizeError> {
        if self.status != Self::STATUS_OK {
            let detail = self
                .errors
                .into_iter()
                .find_map(|e| e.detail.or(e.message))
                .unwrap_or_else(|| "Tokenization failed".to_string());
            return Err(TokenizeError::Rejected(detail));
        }
        PaymentToken::new(self.token.unwrap_or_default())
    }
}

#[async_trait]
impl PaymentTokenizer for WidgetTokenResult {
    async fn tokenize(&self) -> Result<PaymentToken, TokenizeError> {
        self.clone().into_token()
    }
}

/// Transport-level failures talking to the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// The request did not complete (connection, timeout, ...).
    #[error("payment service unreachable: {0}")]
    Transport(String),

    /// The processor answered with something we could not read.
    #[error("unreadable payment service response: {0}")]
    InvalidResponse(String),
}

/// Submits payment requests.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError>;
}

/// Receipt for a completed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_number: String,
    /// Charged amount in major currency units.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// A validated successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    pub receipt: Receipt,
}

/// Payment submission response as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentResponse {
    /// Fallback message when a failed response carries none.
    pub const DEFAULT_FAILURE: &'static str = "Payment failed";

    #[must_use]
    pub fn succeeded(confirmation: PaymentConfirmation) -> Self {
        Self {
            success: true,
            transaction_id: confirmation.transaction_id.map(TransactionId::into_inner),
            receipt: Some(confirmation.receipt),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Validate the response.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Declined`] carrying the provider's message when
    /// `success` is false, [`CheckoutError::MalformedResponse`] when a
    /// success carries no receipt.
    pub fn into_result(self) -> Result<PaymentConfirmation, CheckoutError> {
        if !self.success {
            return Err(CheckoutError::Declined(
                self.error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| Self::DEFAULT_FAILURE.to_string()),
            ));
        }
        let receipt = self
            .receipt
            .ok_or_else(|| CheckoutError::MalformedResponse("success without receipt".to_string()))?;
        Ok(PaymentConfirmation {
            transaction_id: self.transaction_id.map(TransactionId::new),
            receipt,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_widget_ok() {
        let raw: WidgetTokenResult =
            serde_json::from_str(r#"{"status":"OK","token":"cnon:abc"}"#).unwrap();
        assert_eq!(raw.into_token().unwrap().as_str(), "cnon:abc");
    }

    #[test]
    fn test_widget_ok_without_token() {
        let raw: WidgetTokenResult = serde_json::from_str(r#"{"status":"OK"}"#).unwrap();
        assert_eq!(raw.into_token(), Err(TokenizeError::MissingToken));
    }

    #[test]
    fn test_widget_errors_surface_detail() {
        let raw: WidgetTokenResult = serde_json::from_str(
            r#"{"status":"Invalid","errors":[
                {"field":"cardNumber","message":"Invalid card"},
                {"detail":"Card number is not valid"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            raw.into_token(),
            Err(TokenizeError::Rejected("Invalid card".to_string()))
        );

        let bare: WidgetTokenResult = serde_json::from_str(r#"{"status":"Cancel"}"#).unwrap();
        assert_eq!(
            bare.into_token(),
            Err(TokenizeError::Rejected("Tokenization failed".to_string()))
        );
    }

    #[tokio::test]
    async fn test_widget_result_is_a_tokenizer() {
        let raw = WidgetTokenResult {
            status: "OK".to_string(),
            token: Some("tok".to_string()),
            errors: Vec::new(),
        };
        assert_eq!(raw.tokenize().await.unwrap().as_str(), "tok");
    }

    #[test]
    fn test_blank_token_rejected() {
        assert_eq!(PaymentToken::new("  "), Err(TokenizeError::MissingToken));
    }

    #[test]
    fn test_declined_response() {
        let raw: PaymentResponse =
            serde_json::from_str(r#"{"success":false,"error":"declined"}"#).unwrap();
        let err = raw.into_result().unwrap_err();
        assert_eq!(err.user_message(), "declined");
    }

    #[test]
    fn test_success_without_receipt_is_malformed() {
        let raw: PaymentResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(
            raw.into_result(),
            Err(CheckoutError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_success_roundtrip_through_wire() {
        let confirmation = PaymentConfirmation {
            transaction_id: Some(TransactionId::new("txn_1")),
            receipt: Receipt {
                receipt_number: "RCP-1".to_string(),
                amount: dec!(45.99),
                currency: "EUR".to_string(),
            },
        };
        let wire = serde_json::to_string(&PaymentResponse::succeeded(confirmation.clone())).unwrap();
        let parsed: PaymentResponse = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed.into_result().unwrap(), confirmation);
    }

    #[test]
    fn test_missing_fields_default_to_failure() {
        let raw: PaymentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(
            raw.into_result().unwrap_err().user_message(),
            PaymentResponse::DEFAULT_FAILURE
        );
    }
}
