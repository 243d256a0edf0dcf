//! Session-scoped models for the storefront.

pub mod in_flight;
pub mod session;

pub use in_flight::{CheckoutSlot, InFlightCheckouts};
pub use session::{SessionCart, keys};
