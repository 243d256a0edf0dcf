//! Catalog product type.
//!
//! Products are owned by the catalog (static list or Square catalog) and are
//! immutable from the cart's point of view. The wire format is camelCase JSON
//! with the price as a plain number in major currency units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Category tag used by the shop grid filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Clothing,
    Accessories,
    Vinyl,
    Coffee,
    /// Items imported from the remote payments-provider catalog.
    Merch,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price in major currency units.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: ProductCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_count: Option<u32>,
    #[serde(default)]
    pub featured: bool,
}

impl Product {
    /// Whether a size must be picked before this product can be added.
    #[must_use]
    pub fn requires_size(&self) -> bool {
        self.sizes.as_ref().is_some_and(|sizes| !sizes.is_empty())
    }

    /// Whether `size` is one of the product's offered sizes.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes
            .as_ref()
            .is_some_and(|sizes| sizes.iter().any(|s| s == size))
    }

    /// Whether `color` is one of the product's offered colors.
    #[must_use]
    pub fn offers_color(&self, color: &str) -> bool {
        self.colors
            .as_ref()
            .is_some_and(|colors| colors.iter().any(|c| c == color))
    }
}
