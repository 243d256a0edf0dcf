//! Stand-in processor used when no Square access token is configured.

use std::time::Duration;

use async_trait::async_trait;
use bejaus_core::TransactionId;
use bejaus_core::checkout::{
    CHECKOUT_CURRENCY, PaymentConfirmation, PaymentProcessor, PaymentRequest, PaymentResponse,
    ProcessorError, Receipt,
};
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Approves every payment after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    delay: Duration,
}

impl SimulatedProcessor {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, ProcessorError> {
        tokio::time::sleep(self.delay).await;

        let millis = chrono::Utc::now().timestamp_millis();
        let currency = if request.currency.is_empty() {
            CHECKOUT_CURRENCY.code().to_string()
        } else {
            request.currency.clone()
        };
        let amount = Decimal::new(request.amount, 2);

        tracing::info!(
            %amount,
            %currency,
            items = request.items.len(),
            customer = request.customer_email().map_or("anonymous", |e| e.as_str()),
            "Simulated payment processed"
        );

        Ok(PaymentResponse::succeeded(PaymentConfirmation {
            transaction_id: Some(TransactionId::new(format!(
                "txn_{millis}_{}",
                random_suffix()
            ))),
            receipt: Receipt {
                receipt_number: format!("RCP-{millis}"),
                amount,
                currency,
            },
        }))
    }
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .filter_map(|_| BASE36.choose(&mut rng).copied().map(char::from))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn request(amount: i64, currency: &str) -> PaymentRequest {
        PaymentRequest {
            source_id: "cnon:card-nonce-ok".to_string(),
            amount,
            currency: currency.to_string(),
            items: Vec::new(),
            customer: None,
        }
    }

    #[test]
    fn test_random_suffix_is_base36() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[tokio::test]
    async fn test_simulated_payment_succeeds() {
        let processor = SimulatedProcessor::new(Duration::ZERO);
        let response = processor.submit(&request(4599, "EUR")).await.unwrap();

        let confirmation = response.into_result().unwrap();
        let txn = confirmation.transaction_id.unwrap();
        assert!(txn.as_str().starts_with("txn_"));
        assert_eq!(txn.as_str().rsplit('_').next().unwrap().len(), SUFFIX_LEN);
        assert!(confirmation.receipt.receipt_number.starts_with("RCP-"));
        assert_eq!(confirmation.receipt.amount, dec!(45.99));
        assert_eq!(confirmation.receipt.currency, "EUR");
    }

    #[tokio::test]
    async fn test_missing_currency_defaults_to_eur() {
        let processor = SimulatedProcessor::new(Duration::ZERO);
        let response = processor.submit(&request(1200, "")).await.unwrap();
        assert_eq!(response.receipt.unwrap().currency, "EUR");
    }
}
