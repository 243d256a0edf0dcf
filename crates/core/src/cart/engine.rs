//! Cart engine: owns the current [`Cart`] and notifies an observer after each
//! operation.

use crate::types::{Product, ProductId};

use super::storage::{CartStorage, SnapshotPersister};
use super::{Cart, CartAction};

/// Receives the new cart state after every engine operation.
///
/// Operations always notify, including ones that left the cart unchanged.
pub trait CartObserver {
    fn cart_changed(&mut self, cart: &Cart);
}

impl CartObserver for () {
    fn cart_changed(&mut self, _cart: &Cart) {}
}

impl<O: CartObserver + ?Sized> CartObserver for &mut O {
    fn cart_changed(&mut self, cart: &Cart) {
        (**self).cart_changed(cart);
    }
}

/// The single owner of one visitor's cart.
///
/// Mutation happens only through the operations below, each of which runs
/// the pure reducer and then hands the result to the observer.
#[derive(Debug)]
pub struct CartEngine<O> {
    cart: Cart,
    observer: O,
}

impl<O: CartObserver> CartEngine<O> {
    /// Start with an empty cart.
    pub fn new(observer: O) -> Self {
        Self::with_cart(Cart::new(), observer)
    }

    /// Start from an existing cart without notifying the observer.
    pub const fn with_cart(cart: Cart, observer: O) -> Self {
        Self { cart, observer }
    }

    /// Current cart state.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The observer receiving change notifications.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Consume the engine, returning the cart and the observer.
    pub fn into_parts(self) -> (Cart, O) {
        (self.cart, self.observer)
    }

    /// Apply any cart action.
    pub fn dispatch(&mut self, action: CartAction) {
        let current = std::mem::take(&mut self.cart);
        self.cart = current.apply(action);
        self.observer.cart_changed(&self.cart);
    }

    /// Add `quantity` of a product, merging into the line with the same
    /// product and size.
    pub fn add_item(
        &mut self,
        product: Product,
        quantity: u32,
        selected_size: Option<String>,
        selected_color: Option<String>,
    ) {
        self.dispatch(CartAction::AddItem {
            product,
            quantity,
            selected_size,
            selected_color,
        });
    }

    /// Remove every line for the product and size.
    pub fn remove_item(&mut self, product_id: ProductId, selected_size: Option<String>) {
        self.dispatch(CartAction::RemoveItem {
            product_id,
            selected_size,
        });
    }

    /// Set a line's quantity; zero removes the line.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        selected_size: Option<String>,
    ) {
        self.dispatch(CartAction::UpdateQuantity {
            product_id,
            quantity,
            selected_size,
        });
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.dispatch(CartAction::Clear);
    }
}

impl<S: CartStorage> CartEngine<SnapshotPersister<S>> {
    /// Load the persisted snapshot once and start from it.
    ///
    /// A missing or malformed snapshot yields an empty cart.
    pub fn restore(persister: SnapshotPersister<S>) -> Self {
        let cart = persister.load();
        Self::with_cart(cart, persister)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::cart::tests::product;
    use crate::cart::{CART_STORAGE_KEY, MemoryStorage};

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Cart>,
    }

    impl CartObserver for Recorder {
        fn cart_changed(&mut self, cart: &Cart) {
            self.seen.push(cart.clone());
        }
    }

    #[test]
    fn test_every_operation_notifies() {
        let p = product("P1", dec!(25));
        let mut engine = CartEngine::new(Recorder::default());

        engine.add_item(p.clone(), 1, Some("M".to_string()), None);
        engine.remove_item(ProductId::new("missing"), None);
        engine.update_quantity(p.id.clone(), 4, Some("M".to_string()));
        engine.clear();

        let seen = &engine.observer().seen;
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].item_count(), 1);
        assert_eq!(seen[1], seen[0]);
        assert_eq!(seen[2].total(), dec!(100));
        assert!(seen[3].is_empty());
    }

    #[test]
    fn test_observer_sees_state_after_reduction() {
        let p = product("P1", dec!(10));
        let mut recorder = Recorder::default();
        {
            let mut engine = CartEngine::new(&mut recorder);
            engine.add_item(p, 2, None, None);
            assert_eq!(engine.cart().total(), dec!(20));
        }
        assert_eq!(recorder.seen.last().map(Cart::total), Some(dec!(20)));
    }

    #[test]
    fn test_persists_after_each_operation_and_restores() {
        let p = product("P1", dec!(25));
        let mut engine = CartEngine::restore(SnapshotPersister::new(MemoryStorage::new()));
        assert!(engine.cart().is_empty());

        engine.add_item(p.clone(), 2, Some("L".to_string()), Some("Beige".to_string()));
        let expected = engine.cart().clone();

        let (_, persister) = engine.into_parts();
        let storage = persister.into_storage();
        assert!(storage.get(CART_STORAGE_KEY).is_some());

        let restored = CartEngine::restore(SnapshotPersister::new(storage));
        assert_eq!(restored.cart(), &expected);
    }

    #[test]
    fn test_restore_from_malformed_snapshot_is_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(CART_STORAGE_KEY, "{not json".to_string());

        let engine = CartEngine::restore(SnapshotPersister::new(storage));
        assert!(engine.cart().is_empty());
        assert_eq!(engine.cart().item_count(), 0);
    }

    #[test]
    fn test_clear_overwrites_snapshot() {
        let p = product("P1", dec!(25));
        let mut engine = CartEngine::restore(SnapshotPersister::new(MemoryStorage::new()));
        engine.add_item(p, 1, None, None);
        engine.clear();

        let (_, persister) = engine.into_parts();
        let restored = CartEngine::restore(persister);
        assert!(restored.cart().is_empty());
    }
}
