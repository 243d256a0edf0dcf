//! Bejaus Core - cart engine, checkout orchestration and shared types.
//!
//! This crate provides the domain logic used by the Bejaus Sessions storefront:
//! - `storefront` - Public-facing BFF serving the shop, newsletter and video APIs
//! - `integration-tests` - In-process HTTP tests against the storefront router
//!
//! # Architecture
//!
//! The core crate contains no HTTP clients and no runtime. I/O happens behind
//! traits ([`cart::CartStorage`], [`checkout::PaymentTokenizer`],
//! [`checkout::PaymentProcessor`]) that the storefront implements.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, emails, and products
//! - [`cart`] - Reducer-based cart state with derived totals and snapshot persistence
//! - [`checkout`] - Per-attempt checkout state machine and payment request building

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use types::*;
