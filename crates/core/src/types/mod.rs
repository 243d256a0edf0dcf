//! Core types for Bejaus Sessions.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod product;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, to_minor_units};
pub use product::{Product, ProductCategory};
