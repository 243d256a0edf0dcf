//! Checkout error type.

use thiserror::Error;

use super::attempt::CheckoutPhase;
use super::boundary::{ProcessorError, TokenizeError};

/// Message shown for failures whose details should not reach the buyer.
const RETRY_MESSAGE: &str =
    "We could not process your payment. Your cart has been kept, please try again.";

/// Why a checkout attempt did not succeed.
///
/// None of these leave the cart modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    /// A pay action arrived while the attempt was tokenizing or submitting.
    #[error("checkout already in progress")]
    InProgress,

    #[error("checkout already completed")]
    AlreadyCompleted,

    /// A transition was requested from the wrong phase.
    #[error("invalid checkout transition from {0:?}")]
    OutOfOrder(CheckoutPhase),

    #[error("tokenization failed: {0}")]
    Tokenization(#[from] TokenizeError),

    /// The processor answered with `success: false`.
    #[error("payment declined: {0}")]
    Declined(String),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// The processor answered `success: true` without the data we need.
    #[error("malformed payment response: {0}")]
    MalformedResponse(String),

    #[error("order amount out of range")]
    AmountOutOfRange,
}

impl CheckoutError {
    /// Text safe to show the buyer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Declined(message) | Self::Tokenization(TokenizeError::Rejected(message)) => {
                message.clone()
            }
            Self::Tokenization(_) => {
                "The payment form could not be processed. Please try again.".to_string()
            }
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::InProgress => "Your payment is already being processed.".to_string(),
            Self::AlreadyCompleted => "This order has already been paid.".to_string(),
            Self::OutOfOrder(_)
            | Self::Processor(_)
            | Self::MalformedResponse(_)
            | Self::AmountOutOfRange => RETRY_MESSAGE.to_string(),
        }
    }

    /// Whether pressing pay again may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::AlreadyCompleted | Self::EmptyCart)
    }
}
