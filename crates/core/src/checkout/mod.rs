//! Checkout: from cart snapshot to settled payment.
//!
//! # Flow
//!
//! ```text
//! Idle ──begin──▶ Tokenizing ──token──▶ Submitting ──▶ Settled(Succeeded)
//!                     │                      │
//!                     └──widget error──▶ Settled(Failed) ◀──┘
//!                                            │
//!                                            └──begin (retry)──▶ Tokenizing
//! ```
//!
//! [`CheckoutAttempt`] is the per-attempt state machine. [`run`] drives an
//! attempt that has already begun: it tokenizes through a
//! [`PaymentTokenizer`], builds a [`PaymentRequest`] from the cart, submits it
//! through a [`PaymentProcessor`], validates the untrusted
//! [`PaymentResponse`], and clears the cart only on success.

mod attempt;
mod boundary;
mod error;
mod orchestrator;

pub use attempt::{CheckoutAttempt, CheckoutPhase, Settlement};
pub use boundary::{
    PaymentConfirmation, PaymentProcessor, PaymentResponse, PaymentToken, PaymentTokenizer,
    ProcessorError, Receipt, TokenizeError, WidgetTokenError, WidgetTokenResult,
};
pub use error::CheckoutError;
pub use orchestrator::{pay, run};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{CurrencyCode, Email, ProductId, to_minor_units};

/// Subtotals at or above this amount ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(50.00);

/// Flat shipping charge below the threshold, in minor units.
pub const SHIPPING_SURCHARGE_MINOR: i64 = 599;

/// Currency all checkouts are charged in.
pub const CHECKOUT_CURRENCY: CurrencyCode = CurrencyCode::EUR;

/// Shipping charge in minor units for a cart subtotal.
#[must_use]
pub fn shipping_minor_units(subtotal: Decimal) -> i64 {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        0
    } else {
        SHIPPING_SURCHARGE_MINOR
    }
}

/// Totals shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub item_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// How much more to spend for free shipping, if not yet reached.
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub remaining_for_free_shipping: Option<Decimal>,
}

impl OrderSummary {
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Self {
        let subtotal = cart.total();
        let shipping = Decimal::new(shipping_minor_units(subtotal), 2);
        let remaining = (subtotal < FREE_SHIPPING_THRESHOLD)
            .then(|| FREE_SHIPPING_THRESHOLD.saturating_sub(subtotal));
        Self {
            item_count: cart.item_count(),
            subtotal,
            shipping,
            total: subtotal.saturating_add(shipping),
            remaining_for_free_shipping: remaining,
        }
    }

    /// Amount to charge in minor units: rounded subtotal plus shipping.
    #[must_use]
    pub fn amount_minor_units(&self) -> Option<i64> {
        to_minor_units(self.subtotal)?.checked_add(shipping_minor_units(self.subtotal))
    }
}

/// One cart line as sent to the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLineItem {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price in minor units.
    pub price: i64,
}

/// Buyer details attached to a payment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Payment submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Opaque token produced by the tokenization widget.
    pub source_id: String,
    /// Total to charge in minor units, shipping included.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub items: Vec<PaymentLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerDetails>,
}

impl PaymentRequest {
    /// Build the request for a cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart and
    /// [`CheckoutError::AmountOutOfRange`] if an amount does not fit in
    /// minor units.
    pub fn from_cart(
        cart: &Cart,
        token: &PaymentToken,
        customer_email: Option<Email>,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let amount = OrderSummary::for_cart(cart)
            .amount_minor_units()
            .ok_or(CheckoutError::AmountOutOfRange)?;

        let items = cart
            .items()
            .iter()
            .map(|item| {
                Ok(PaymentLineItem {
                    id: item.product.id.clone(),
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    price: to_minor_units(item.product.price)
                        .ok_or(CheckoutError::AmountOutOfRange)?,
                })
            })
            .collect::<Result<Vec<_>, CheckoutError>>()?;

        Ok(Self {
            source_id: token.as_str().to_owned(),
            amount,
            currency: CHECKOUT_CURRENCY.code().to_owned(),
            items,
            customer: customer_email.map(|email| CustomerDetails {
                email: Some(email),
                ..CustomerDetails::default()
            }),
        })
    }

    /// Customer email, if one was supplied.
    #[must_use]
    pub fn customer_email(&self) -> Option<&Email> {
        self.customer.as_ref().and_then(|c| c.email.as_ref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cart::tests::{add, product};

    fn cart_with_total(total: Decimal) -> Cart {
        Cart::new().apply(add(&product("P1", total), 1, None, None))
    }

    #[test]
    fn test_shipping_threshold() {
        assert_eq!(shipping_minor_units(dec!(40.00)), 599);
        assert_eq!(shipping_minor_units(dec!(49.99)), 599);
        assert_eq!(shipping_minor_units(dec!(50.00)), 0);
        assert_eq!(shipping_minor_units(dec!(60.00)), 0);
    }

    #[test]
    fn test_scenario_e_amounts() {
        let token = PaymentToken::new("cnon:card-nonce-ok").unwrap();

        let below = PaymentRequest::from_cart(&cart_with_total(dec!(40.00)), &token, None).unwrap();
        assert_eq!(below.amount, 4000 + 599);

        let above = PaymentRequest::from_cart(&cart_with_total(dec!(60.00)), &token, None).unwrap();
        assert_eq!(above.amount, 6000);
    }

    #[test]
    fn test_request_lines_and_customer() {
        let tee = product("bejaus-tshirt", dec!(25));
        let coffee = product("bejaus-coffee", dec!(12.5));
        let cart = Cart::new()
            .apply(add(&tee, 2, Some("M"), None))
            .apply(add(&coffee, 1, None, None));
        let token = PaymentToken::new("tok").unwrap();
        let email = Email::parse("fan@bejaus.com").unwrap();

        let request = PaymentRequest::from_cart(&cart, &token, Some(email.clone())).unwrap();
        assert_eq!(request.source_id, "tok");
        assert_eq!(request.currency, "EUR");
        assert_eq!(request.amount, 6250);
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].price, 2500);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.items[1].price, 1250);
        assert_eq!(request.customer_email(), Some(&email));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sourceId"], serde_json::json!("tok"));
        assert_eq!(json["customer"]["email"], serde_json::json!("fan@bejaus.com"));
    }

    #[test]
    fn test_empty_cart_rejected() {
        let token = PaymentToken::new("tok").unwrap();
        assert!(matches!(
            PaymentRequest::from_cart(&Cart::new(), &token, None),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_order_summary() {
        let summary = OrderSummary::for_cart(&cart_with_total(dec!(40)));
        assert_eq!(summary.shipping, dec!(5.99));
        assert_eq!(summary.total, dec!(45.99));
        assert_eq!(summary.remaining_for_free_shipping, Some(dec!(10)));
        assert_eq!(summary.amount_minor_units(), Some(4599));

        let free = OrderSummary::for_cart(&cart_with_total(dec!(50)));
        assert_eq!(free.shipping, Decimal::ZERO);
        assert_eq!(free.remaining_for_free_shipping, None);
    }
}
