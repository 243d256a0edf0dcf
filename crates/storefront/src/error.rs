//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error responses are JSON: `{ "success": false, "error": ..., "message": ... }`
//! where `error` is a short title and `message` is safe to show the visitor.
//! Checkout failures also carry `retryable`, telling the page whether to
//! offer the pay button again.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bejaus_core::checkout::CheckoutError;
use serde::Serialize;
use thiserror::Error;

use crate::services::{MailerLiteError, YouTubeError};
use crate::square::SquareError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Square API operation failed.
    #[error("Square error: {0}")]
    Square(#[from] SquareError),

    /// Newsletter sign-up failed.
    #[error("Newsletter error: {0}")]
    Newsletter(#[from] MailerLiteError),

    /// Video listing failed.
    #[error("Video error: {0}")]
    Videos(#[from] YouTubeError),

    /// Checkout attempt failed; the cart is untouched.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A provider the request needs has no credentials configured.
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Square(_) => StatusCode::BAD_GATEWAY,
            Self::Newsletter(MailerLiteError::AlreadySubscribed) => StatusCode::CONFLICT,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::AmountOutOfRange => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::InProgress
                | CheckoutError::AlreadyCompleted
                | CheckoutError::OutOfOrder(_) => StatusCode::CONFLICT,
                CheckoutError::Tokenization(_) | CheckoutError::Declined(_) => {
                    StatusCode::PAYMENT_REQUIRED
                }
                CheckoutError::Processor(_) | CheckoutError::MalformedResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Newsletter(_)
            | Self::Videos(_)
            | Self::Session(_)
            | Self::NotConfigured(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short title for the `error` field.
    const fn title(&self) -> &'static str {
        match self {
            Self::Square(_) => "External service error",
            Self::Newsletter(MailerLiteError::AlreadySubscribed) => "Already subscribed",
            Self::Newsletter(_) => "Subscription failed",
            Self::Videos(_) => "Failed to fetch YouTube videos",
            Self::Checkout(CheckoutError::Declined(_)) => "Payment declined",
            Self::Checkout(_) => "Checkout failed",
            Self::NotConfigured(_) => "Configuration error",
            Self::NotFound(_) => "Not found",
            Self::BadRequest(_) => "Invalid request",
            Self::Session(_) | Self::Internal(_) => "Internal server error",
        }
    }

    /// Don't expose internal error details to clients.
    fn public_message(&self) -> String {
        match self {
            Self::Square(_) => "The payment provider is unavailable, please try again.".to_string(),
            Self::Newsletter(MailerLiteError::AlreadySubscribed) => {
                "This email is already subscribed to our newsletter.".to_string()
            }
            Self::Newsletter(_) => {
                "We could not complete your subscription. Please try again.".to_string()
            }
            Self::Videos(_) => "Videos are unavailable right now.".to_string(),
            Self::Checkout(err) => err.user_message(),
            Self::NotConfigured(service) => format!("{service} is not available right now."),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Session(_) | Self::Internal(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }

    /// Whether the error points at our side rather than the visitor's input.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Square(_)
            | Self::Videos(_)
            | Self::Session(_)
            | Self::NotConfigured(_)
            | Self::Internal(_) => true,
            Self::Newsletter(err) => !matches!(err, MailerLiteError::AlreadySubscribed),
            Self::Checkout(err) => matches!(
                err,
                CheckoutError::Processor(_) | CheckoutError::MalformedResponse(_)
            ),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: self.title(),
            message: self.public_message(),
            retryable: match &self {
                Self::Checkout(err) => Some(err.is_retryable()),
                _ => None,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "bejaus-tshirt")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
