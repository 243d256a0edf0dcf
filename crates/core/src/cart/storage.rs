//! Snapshot persistence for the cart.

use std::collections::HashMap;

use super::Cart;
use super::engine::CartObserver;

/// Fixed key under which the cart snapshot is stored.
pub const CART_STORAGE_KEY: &str = "bejaus-cart";

/// Durable local key-value storage.
///
/// Writes are fire-and-forget: the last write to a key wins.
pub trait CartStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-memory [`CartStorage`], used for tests and for request-scoped carts
/// whose snapshot is copied in and out of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a cart snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: Option<String>) -> Self {
        let mut storage = Self::new();
        if let Some(snapshot) = snapshot {
            storage.set(CART_STORAGE_KEY, snapshot);
        }
        storage
    }
}

impl CartStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }
}

/// Observer that writes a JSON snapshot of the cart after every change.
#[derive(Debug, Clone)]
pub struct SnapshotPersister<S> {
    storage: S,
}

impl<S: CartStorage> SnapshotPersister<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read and decode the stored snapshot.
    ///
    /// Missing data yields an empty cart; malformed data is logged and also
    /// yields an empty cart.
    #[must_use]
    pub fn load(&self) -> Cart {
        let Some(raw) = self.storage.get(CART_STORAGE_KEY) else {
            return Cart::new();
        };

        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => cart,
            Err(e) => {
                tracing::warn!(
                    key = CART_STORAGE_KEY,
                    error = %e,
                    "Discarding malformed cart snapshot"
                );
                Cart::new()
            }
        }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl<S: CartStorage> CartObserver for SnapshotPersister<S> {
    fn cart_changed(&mut self, cart: &Cart) {
        match serde_json::to_string(cart) {
            Ok(snapshot) => self.storage.set(CART_STORAGE_KEY, snapshot),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize cart snapshot"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::cart::tests::{add, product};

    #[test]
    fn test_load_missing_is_empty() {
        let persister = SnapshotPersister::new(MemoryStorage::new());
        assert_eq!(persister.load(), Cart::new());
    }

    #[test]
    fn test_written_snapshot_uses_wire_field_names() {
        let p = product("bejaus-tote", dec!(15));
        let cart = Cart::new().apply(add(&p, 2, None, None));

        let mut persister = SnapshotPersister::new(MemoryStorage::new());
        persister.cart_changed(&cart);

        let raw = persister.storage().get(CART_STORAGE_KEY).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["itemCount"], serde_json::json!(2));
        assert_eq!(json["total"].as_f64(), Some(30.0));
        assert_eq!(json["items"][0]["product"]["id"], serde_json::json!("bejaus-tote"));
    }

    #[test]
    fn test_with_snapshot() {
        let storage = MemoryStorage::with_snapshot(Some("{}".to_string()));
        assert_eq!(storage.get(CART_STORAGE_KEY).as_deref(), Some("{}"));
        assert_eq!(MemoryStorage::with_snapshot(None), MemoryStorage::new());
    }
}
