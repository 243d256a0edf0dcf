//! Visitor state kept in the session.
//!
//! The cart snapshot is stored as the same JSON string the cart persister
//! writes, under the same key, so a session is just another `CartStorage`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bejaus_core::cart::{
    CART_STORAGE_KEY, Cart, CartEngine, CartStorage, MemoryStorage, SnapshotPersister,
};
use tower_sessions::Session;
use tower_sessions::session::Id;

use crate::error::AppError;

/// Session keys for visitor data.
pub mod keys {
    /// Key for the cart snapshot (JSON string).
    pub const CART: &str = bejaus_core::cart::CART_STORAGE_KEY;
}

/// Cart engine whose persister writes back into the session.
pub type SessionCartEngine = CartEngine<SnapshotPersister<MemoryStorage>>;

/// The visitor's cart, restored from their session.
///
/// Extracting it reads the snapshot once; [`SessionCart::save`] writes the
/// latest snapshot back. A malformed snapshot yields an empty cart.
pub struct SessionCart {
    session: Session,
    engine: SessionCartEngine,
}

impl SessionCart {
    /// Restore the cart stored in `session`.
    ///
    /// # Errors
    ///
    /// Returns error if the session store cannot be read.
    pub async fn load(session: Session) -> Result<Self, AppError> {
        let snapshot = session.get::<String>(keys::CART).await?;
        let engine = CartEngine::restore(SnapshotPersister::new(MemoryStorage::with_snapshot(
            snapshot,
        )));
        Ok(Self { session, engine })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        self.engine.cart()
    }

    pub const fn engine_mut(&mut self) -> &mut SessionCartEngine {
        &mut self.engine
    }

    /// The session's ID, or `None` until it has been stored once.
    #[must_use]
    pub fn session_id(&self) -> Option<Id> {
        self.session.id()
    }

    /// Re-read the cart from the session store.
    ///
    /// Drops whatever this request read at extraction, so a checkout sees the
    /// cart as the previous checkout of the session left it.
    ///
    /// # Errors
    ///
    /// Returns error if the session store cannot be read.
    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.session.load().await?;
        let snapshot = self.session.get::<String>(keys::CART).await?;
        self.engine = CartEngine::restore(SnapshotPersister::new(MemoryStorage::with_snapshot(
            snapshot,
        )));
        Ok(())
    }

    /// Write the latest snapshot back to the session and flush it to the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns error if the session store cannot be written.
    pub async fn save(self) -> Result<Cart, AppError> {
        let (cart, persister) = self.engine.into_parts();
        if let Some(snapshot) = persister.storage().get(CART_STORAGE_KEY) {
            self.session.insert(keys::CART, snapshot).await?;
            self.session.save().await?;
        }
        Ok(cart)
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;
        Self::load(session).await
    }
}
