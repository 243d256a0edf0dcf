//! Drives a checkout attempt against the cart engine.

use tracing::instrument;

use super::attempt::{CheckoutAttempt, CheckoutPhase};
use super::boundary::{PaymentConfirmation, PaymentProcessor, PaymentTokenizer};
use super::error::CheckoutError;
use super::PaymentRequest;
use crate::cart::{CartEngine, CartObserver};
use crate::types::Email;

/// Begin an attempt and run it. Convenience for callers that do not need to
/// publish the in-flight phase before the network calls start.
///
/// # Errors
///
/// See [`run`]; additionally the errors of [`CheckoutAttempt::begin`].
pub async fn pay<O, T, P>(
    attempt: &mut CheckoutAttempt,
    engine: &mut CartEngine<O>,
    tokenizer: &T,
    processor: &P,
    customer_email: Option<Email>,
) -> Result<PaymentConfirmation, CheckoutError>
where
    O: CartObserver,
    T: PaymentTokenizer + ?Sized,
    P: PaymentProcessor + ?Sized,
{
    attempt.begin()?;
    run(attempt, engine, tokenizer, processor, customer_email).await
}

/// Run an attempt that has already begun (phase `Tokenizing`).
///
/// On success the cart is cleared and the confirmation returned. On any
/// failure the attempt settles as failed and the cart is left exactly as it
/// was.
///
/// # Errors
///
/// [`CheckoutError::OutOfOrder`] if the attempt is not tokenizing; otherwise
/// whatever made the attempt fail.
#[instrument(skip_all, fields(items = engine.cart().items().len()))]
pub async fn run<O, T, P>(
    attempt: &mut CheckoutAttempt,
    engine: &mut CartEngine<O>,
    tokenizer: &T,
    processor: &P,
    customer_email: Option<Email>,
) -> Result<PaymentConfirmation, CheckoutError>
where
    O: CartObserver,
    T: PaymentTokenizer + ?Sized,
    P: PaymentProcessor + ?Sized,
{
    if attempt.phase() != CheckoutPhase::Tokenizing {
        return Err(CheckoutError::OutOfOrder(attempt.phase()));
    }

    match settle_attempt(attempt, engine, tokenizer, processor, customer_email).await {
        Ok(confirmation) => {
            engine.clear();
            tracing::info!(
                receipt = %confirmation.receipt.receipt_number,
                amount = %confirmation.receipt.amount,
                "Checkout succeeded, cart cleared"
            );
            Ok(confirmation)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Checkout failed, cart preserved");
            Err(e)
        }
    }
}

async fn settle_attempt<O, T, P>(
    attempt: &mut CheckoutAttempt,
    engine: &CartEngine<O>,
    tokenizer: &T,
    processor: &P,
    customer_email: Option<Email>,
) -> Result<PaymentConfirmation, CheckoutError>
where
    O: CartObserver,
    T: PaymentTokenizer + ?Sized,
    P: PaymentProcessor + ?Sized,
{
    if engine.cart().is_empty() {
        return attempt.settle(Err(CheckoutError::EmptyCart));
    }

    let token = attempt.tokenized(tokenizer.tokenize().await)?;

    let outcome = match PaymentRequest::from_cart(engine.cart(), &token, customer_email) {
        Ok(request) => {
            tracing::debug!(amount = request.amount, "Submitting payment");
            match processor.submit(&request).await {
                Ok(response) => response.into_result(),
                Err(e) => Err(CheckoutError::Processor(e)),
            }
        }
        Err(e) => Err(e),
    };

    attempt.settle(outcome)
}
