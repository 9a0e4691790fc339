//! Per-session cart lookup.
//!
//! Each browser session owns one cart, identified by a random token kept in
//! the session. The registry hands out the live [`CartStore`] for a token,
//! opening (and rehydrating) it from storage on first use.
//!
//! There is at most one live `CartStore` per token. Idle carts are evicted
//! from the cache, but while a request or a checkout task still holds the
//! evicted cart, lookups reattach to that same instance instead of opening a
//! second one over the same slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

use super::persistence::KeyValueStore;
use super::{CartStore, WeakCartStore};

/// Carts idle this long are dropped from memory.
const IDLE_EVICTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const MAX_LIVE_CARTS: u64 = 10_000;

/// Storage slot for the cart owned by `token`.
#[must_use]
pub fn cart_key(token: Uuid) -> String {
    format!("cart-{token}")
}

/// Token → live cart map, backed by one shared [`KeyValueStore`].
#[derive(Clone)]
pub struct CartRegistry {
    storage: Arc<dyn KeyValueStore>,
    ephemeral: bool,
    carts: Cache<Uuid, CartStore>,
    /// Every cart handed out, including evicted ones still held elsewhere.
    live: Arc<Mutex<HashMap<Uuid, WeakCartStore>>>,
}

impl std::fmt::Debug for CartRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartRegistry")
            .field("cached_carts", &self.carts.entry_count())
            .field("ephemeral", &self.ephemeral)
            .finish_non_exhaustive()
    }
}

impl CartRegistry {
    /// A registry whose carts outlive eviction in `storage` and are
    /// rehydrated on the next lookup.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::build(storage, false)
    }

    /// A registry whose carts are removed from `storage` once evicted and no
    /// longer held anywhere. Used with the in-memory store, where nothing
    /// else would ever reclaim the slots.
    #[must_use]
    pub fn ephemeral(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::build(storage, true)
    }

    fn build(storage: Arc<dyn KeyValueStore>, ephemeral: bool) -> Self {
        let carts = Cache::builder()
            .max_capacity(MAX_LIVE_CARTS)
            .time_to_idle(IDLE_EVICTION)
            .build();
        Self {
            storage,
            ephemeral,
            carts,
            live: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The cart for `token`. Concurrent first calls open the cart once.
    pub async fn get(&self, token: Uuid) -> CartStore {
        let registry = self.clone();
        self.carts
            .get_with(token, async move { registry.attach(token) })
            .await
    }

    /// Reuse the live cart for `token`, or open it from storage.
    fn attach(&self, token: Uuid) -> CartStore {
        if let Some(cart) = self.lock_live().get(&token).and_then(WeakCartStore::upgrade) {
            debug!(%token, "Reattached live cart");
            return cart;
        }

        debug!(%token, "Opening cart");
        let storage = Arc::clone(&self.storage);
        let cart = if self.ephemeral {
            CartStore::open_ephemeral(storage, cart_key(token))
        } else {
            CartStore::open(storage, cart_key(token))
        };

        let mut live = self.lock_live();
        if live.len() >= usize::try_from(MAX_LIVE_CARTS).unwrap_or(usize::MAX) {
            live.retain(|_, cart| cart.is_live());
        }
        live.insert(token, cart.downgrade());
        cart
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, WeakCartStore>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
