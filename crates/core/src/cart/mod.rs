//! Reducer-based shopping cart.
//!
//! [`Cart`] is an immutable value: every change goes through [`Cart::apply`]
//! with one of the closed set of [`CartAction`]s and yields a new cart whose
//! `total` and `item_count` are re-folded from its items. Persistence is not
//! the reducer's concern; [`CartEngine`] notifies a [`CartObserver`] after each
//! action, and [`SnapshotPersister`] is the observer that writes snapshots.
//!
//! Line items are identified by the compound key of product ID and
//! selected size. Color is cosmetic and not part of the identity: adding the
//! same product and size in a different color merges into the existing line
//! and keeps the color chosen first.

mod engine;
mod storage;

pub use engine::{CartEngine, CartObserver};
pub use storage::{CART_STORAGE_KEY, CartStorage, MemoryStorage, SnapshotPersister};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// A product in the cart with its quantity and chosen variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product: Product,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

impl CartLineItem {
    /// Whether this line has the given compound key, without allocating.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, selected_size: Option<&str>) -> bool {
        self.product.id == *product_id && self.selected_size.as_deref() == selected_size
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .price
            .saturating_mul(Decimal::from(self.quantity))
    }
}

/// Operations accepted by the cart reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Merge into the line with the same key, or append a new line.
    /// A zero quantity leaves the cart unchanged.
    AddItem {
        product: Product,
        quantity: u32,
        selected_size: Option<String>,
        selected_color: Option<String>,
    },
    /// Delete every line with the key.
    RemoveItem {
        product_id: ProductId,
        selected_size: Option<String>,
    },
    /// Set the absolute quantity of the line with the key; zero removes it.
    UpdateQuantity {
        product_id: ProductId,
        quantity: u32,
        selected_size: Option<String>,
    },
    /// Reset to the empty cart.
    Clear,
}

/// Cart state with derived totals.
///
/// `total` and `item_count` are always the fold of `items`; there is no way to
/// set them independently, and deserialization recomputes them rather than
/// trusting stored values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "CartSnapshot", into = "CartSnapshot")]
pub struct Cart {
    items: Vec<CartLineItem>,
    total: Decimal,
    item_count: u32,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from line items, deriving the totals.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let total = items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.line_total()));
        let item_count = items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity));
        Self {
            items,
            total,
            item_count,
        }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line with the given compound key.
    #[must_use]
    pub fn find(&self, product_id: &ProductId, selected_size: Option<&str>) -> Option<&CartLineItem> {
        self.items
            .iter()
            .find(|item| item.matches(product_id, selected_size))
    }

    /// Apply an action and return the resulting cart.
    #[must_use]
    pub fn apply(self, action: CartAction) -> Self {
        match action {
            CartAction::AddItem {
                product,
                quantity,
                selected_size,
                selected_color,
            } => self.add(product, quantity, selected_size, selected_color),
            CartAction::RemoveItem {
                product_id,
                selected_size,
            } => self.remove(&product_id, selected_size.as_deref()),
            CartAction::UpdateQuantity {
                product_id,
                quantity,
                selected_size,
            } => self.set_quantity(&product_id, quantity, selected_size.as_deref()),
            CartAction::Clear => Self::new(),
        }
    }

    fn add(
        self,
        product: Product,
        quantity: u32,
        selected_size: Option<String>,
        selected_color: Option<String>,
    ) -> Self {
        if quantity == 0 {
            return self;
        }

        let mut items = self.items;
        if let Some(existing) = items
            .iter_mut()
            .find(|item| item.matches(&product.id, selected_size.as_deref()))
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            items.push(CartLineItem {
                product,
                quantity,
                selected_size,
                selected_color,
            });
        }
        Self::from_items(items)
    }

    fn remove(self, product_id: &ProductId, selected_size: Option<&str>) -> Self {
        if self.find(product_id, selected_size).is_none() {
            return self;
        }
        let mut items = self.items;
        items.retain(|item| !item.matches(product_id, selected_size));
        Self::from_items(items)
    }

    fn set_quantity(self, product_id: &ProductId, quantity: u32, selected_size: Option<&str>) -> Self {
        if quantity == 0 {
            return self.remove(product_id, selected_size);
        }
        if self.find(product_id, selected_size).is_none() {
            return self;
        }
        let mut items = self.items;
        for item in items
            .iter_mut()
            .filter(|item| item.matches(product_id, selected_size))
        {
            item.quantity = quantity;
        }
        Self::from_items(items)
    }
}

/// Serialized form of [`Cart`].
///
/// The stored totals are written for consumers that read the snapshot
/// directly, but are ignored on load.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartSnapshot {
    items: Vec<CartLineItem>,
    #[serde(default, with = "rust_decimal::serde::float")]
    total: Decimal,
    #[serde(default)]
    item_count: u32,
}

impl From<CartSnapshot> for Cart {
    fn from(snapshot: CartSnapshot) -> Self {
        Self::from_items(snapshot.items)
    }
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self {
            items: cart.items,
            total: cart.total,
            item_count: cart.item_count,
        }
    }
}
