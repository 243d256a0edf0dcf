//! Sessions with a checkout currently running.
//!
//! A checkout claims its session here before the card token is submitted and
//! holds the claim until the handler finishes or is dropped. The claim lives
//! in process memory, next to the in-memory session store, so it never
//! outlives the request that made it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tower_sessions::session::Id;

/// How long a claim blocks other checkouts if its holder never releases it.
///
/// Longer than the processor timeout, so a live request is never overtaken.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(120);

/// Registry of sessions with a checkout in flight.
#[derive(Debug)]
pub struct InFlightCheckouts {
    entries: Mutex<HashMap<Id, Claim>>,
    next_token: AtomicU64,
    max_age: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    token: u64,
    since: Instant,
}

impl Default for InFlightCheckouts {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

impl InFlightCheckouts {
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            max_age,
        }
    }

    /// Claim `session` for one checkout.
    ///
    /// Returns `None` while another checkout holds a claim younger than the
    /// max age.
    #[must_use]
    pub fn acquire(self: &Arc<Self>, session: Id) -> Option<CheckoutSlot> {
        let mut entries = self.lock();
        if let Some(claim) = entries.get(&session) {
            if claim.since.elapsed() < self.max_age {
                return None;
            }
            tracing::warn!("Reclaiming stale checkout claim");
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            session,
            Claim {
                token,
                since: Instant::now(),
            },
        );

        Some(CheckoutSlot {
            registry: Arc::clone(self),
            session,
            token,
        })
    }

    fn release(&self, session: &Id, token: u64) {
        let mut entries = self.lock();
        if entries.get(session).is_some_and(|claim| claim.token == token) {
            entries.remove(session);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Id, Claim>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A session's claim on the checkout, released on drop.
#[derive(Debug)]
pub struct CheckoutSlot {
    registry: Arc<InFlightCheckouts>,
    session: Id,
    token: u64,
}

impl Drop for CheckoutSlot {
    fn drop(&mut self) {
        self.registry.release(&self.session, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claimed(registry: &InFlightCheckouts, session: &Id) -> bool {
        registry.lock().contains_key(session)
    }

    #[test]
    fn test_second_claim_is_refused_until_release() {
        let registry = Arc::new(InFlightCheckouts::default());
        let session = Id::default();

        let slot = registry.acquire(session);
        assert!(slot.is_some());
        assert!(registry.acquire(session).is_none());
        assert!(claimed(&registry, &session));

        drop(slot);
        assert!(!claimed(&registry, &session));
        assert!(registry.acquire(session).is_some());
    }

    #[test]
    fn test_sessions_are_independent() {
        let registry = Arc::new(InFlightCheckouts::default());

        let _first = registry.acquire(Id::default());
        assert!(registry.acquire(Id::default()).is_some());
    }

    #[test]
    fn test_stale_claim_is_reclaimed() {
        let registry = Arc::new(InFlightCheckouts::new(Duration::ZERO));
        let session = Id::default();

        let stale = registry.acquire(session);
        assert!(stale.is_some());
        let fresh = registry.acquire(session);
        assert!(fresh.is_some());

        // Dropping the stale slot must not release the newer claim.
        drop(stale);
        assert!(claimed(&registry, &session));
        drop(fresh);
        assert!(!claimed(&registry, &session));
    }
}
