//! Cart store: ordered line items with variant-level de-duplication.
//!
//! # Identity
//!
//! Two line items occupy the same slot when their product IDs are equal and
//! their selected attributes are equal as sets. Adding an item whose slot
//! already exists increments that slot's quantity instead of appending.
//!
//! # Persistence
//!
//! Every mutation overwrites the cart's key-value slot with the full line
//! list (see [`persistence`]). A store is rehydrated once, when opened.
//!
//! # Sharing
//!
//! [`CartStore`] is a cheap handle over shared state. There is no global
//! cart: the HTTP server keeps one store per session, the CLI opens one per
//! invocation. Mutations take a short lock and never hold it across `.await`.

pub mod checkout;
pub mod persistence;
pub mod registry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use fjord_core::{CartLineItem, ProductId, SelectedAttributes};
use rust_decimal::Decimal;
use tracing::debug;

pub use checkout::{CheckoutError, CheckoutSubmitter, OrderService};
pub use persistence::{
    CART_KEY, CartPersistence, FileStore, KeyValueStore, MemoryStore, StorageError,
};
pub use registry::{CartRegistry, cart_key};

/// Handle to one cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    lines: Mutex<Vec<CartLineItem>>,
    persistence: CartPersistence,
    checkout_in_flight: AtomicBool,
    /// Remove the slot when the last handle goes away.
    ephemeral: bool,
}

impl Drop for CartStoreInner {
    fn drop(&mut self) {
        if self.ephemeral {
            self.persistence.discard();
        }
    }
}

/// Non-owning reference to a [`CartStore`].
#[derive(Debug, Clone)]
pub(crate) struct WeakCartStore(Weak<CartStoreInner>);

impl WeakCartStore {
    /// The cart, if any handle to it is still alive.
    pub(crate) fn upgrade(&self) -> Option<CartStore> {
        self.0.upgrade().map(|inner| CartStore { inner })
    }

    pub(crate) fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key())
            .field("lines", &self.len())
            .field("checkout_in_flight", &self.is_checkout_in_flight())
            .finish()
    }
}

impl CartStore {
    /// Open the cart stored under `key`, rehydrating it from `store`.
    ///
    /// Missing or malformed data opens an empty cart.
    #[must_use]
    pub fn open(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::open_with(CartPersistence::new(store, key), false)
    }

    /// Like [`CartStore::open`], but the slot is removed from `store` once
    /// the last handle to this cart is dropped.
    #[must_use]
    pub fn open_ephemeral(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::open_with(CartPersistence::new(store, key), true)
    }

    fn open_with(persistence: CartPersistence, ephemeral: bool) -> Self {
        let lines = persistence.load();
        Self {
            inner: Arc::new(CartStoreInner {
                lines: Mutex::new(lines),
                persistence,
                checkout_in_flight: AtomicBool::new(false),
                ephemeral,
            }),
        }
    }

    /// An empty cart backed by a private in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new()), CART_KEY)
    }

    /// The persistence slot key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.inner.persistence.key()
    }

    /// Whether both handles refer to the same cart.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakCartStore {
        WeakCartStore(Arc::downgrade(&self.inner))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartLineItem>> {
        self.inner
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `mutate` under the lock, then persist the result.
    fn mutate(&self, mutate: impl FnOnce(&mut Vec<CartLineItem>)) {
        let mut lines = self.lock();
        mutate(&mut lines);
        self.inner.persistence.save(&lines);
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `item`, merging into an existing slot by incrementing its quantity.
    ///
    /// The caller is responsible for `item.quantity >= 1`.
    pub fn add_item(&self, item: CartLineItem) {
        self.mutate(|lines| {
            if let Some(existing) = lines.iter_mut().find(|line| line.is_same_slot(&item)) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
                debug!(product_id = %item.product_id, quantity = existing.quantity, "Merged into existing cart line");
            } else {
                debug!(product_id = %item.product_id, quantity = item.quantity, "Appended cart line");
                lines.push(item);
            }
        });
    }

    /// Remove the slot for `product_id` + `selected_attributes`, if present.
    pub fn remove_item(&self, product_id: &ProductId, selected_attributes: &SelectedAttributes) {
        self.mutate(|lines| {
            lines.retain(|line| !line.matches(product_id, selected_attributes));
        });
    }

    /// Set a slot's quantity exactly.
    ///
    /// Quantities below 1 are ignored: the existing quantity is kept and
    /// nothing is removed. Unknown slots are ignored too. Quantities above
    /// `u32::MAX` are clamped.
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        selected_attributes: &SelectedAttributes,
        new_quantity: i64,
    ) {
        if new_quantity < 1 {
            debug!(%product_id, new_quantity, "Ignoring quantity below 1");
            return;
        }
        let quantity = u32::try_from(new_quantity).unwrap_or_else(|_| {
            debug!(%product_id, new_quantity, "Clamping quantity to u32::MAX");
            u32::MAX
        });

        self.mutate(|lines| {
            if let Some(line) = lines
                .iter_mut()
                .find(|line| line.matches(product_id, selected_attributes))
            {
                line.quantity = quantity;
            }
        });
    }

    /// Remove every line.
    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        fjord_core::total_quantity(&self.lock())
    }

    /// Unrounded subtotal in the base currency.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        fjord_core::subtotal(&self.lock())
    }

    // =========================================================================
    // Checkout guard
    // =========================================================================

    /// Whether a checkout submission for this cart is pending.
    #[must_use]
    pub fn is_checkout_in_flight(&self) -> bool {
        self.inner.checkout_in_flight.load(Ordering::Acquire)
    }

    /// Claim the single checkout slot. `None` if a submission is already pending.
    pub(crate) fn try_begin_checkout(&self) -> Option<CheckoutGuard> {
        self.inner
            .checkout_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CheckoutGuard { cart: self.clone() })
    }
}

/// Releases the checkout slot when dropped.
#[derive(Debug)]
pub(crate) struct CheckoutGuard {
    cart: CartStore,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.cart
            .inner
            .checkout_in_flight
            .store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, attrs: SelectedAttributes, quantity: u32) -> CartLineItem {
        CartLineItem::new(id, id.to_uppercase(), Decimal::new(1000, 2), attrs, quantity)
    }

    fn red() -> SelectedAttributes {
        SelectedAttributes::from([("color", "red")])
    }

    #[test]
    fn test_add_same_identity_merges() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", SelectedAttributes::new(), 1));
        cart.add_item(item("p1", SelectedAttributes::new(), 1));

        let lines = cart.items();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_add_increments_by_item_quantity() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 2));
        cart.add_item(item("p1", red(), 3));
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_attribute_order_does_not_matter() {
        let cart = CartStore::in_memory();
        let a = SelectedAttributes::new().with("Size", "M").with("Color", "red");
        let b = SelectedAttributes::new().with("Color", "red").with("Size", "M");
        cart.add_item(item("p1", a, 1));
        cart.add_item(item("p1", b, 1));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_different_attributes_are_distinct() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 1));
        cart.add_item(item("p1", SelectedAttributes::from([("color", "blue")]), 1));
        cart.add_item(item("p1", SelectedAttributes::new(), 1));

        assert_eq!(cart.len(), 3);
        let ids: Vec<_> = cart
            .items()
            .iter()
            .map(|l| l.selected_attributes.get("color").map(str::to_string))
            .collect();
        assert_eq!(
            ids,
            vec![Some("red".to_string()), Some("blue".to_string()), None]
        );
    }

    #[test]
    fn test_update_quantity_sets_exactly() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 1));
        cart.update_quantity(&ProductId::new("p1"), &red(), 7);
        assert_eq!(cart.items()[0].quantity, 7);
    }

    #[test]
    fn test_update_quantity_floor() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 3));
        cart.update_quantity(&ProductId::new("p1"), &red(), 0);
        cart.update_quantity(&ProductId::new("p1"), &red(), -4);

        let lines = cart.items();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 3));
        let before = cart.items();
        cart.update_quantity(&ProductId::new("p1"), &SelectedAttributes::new(), 9);
        cart.update_quantity(&ProductId::new("p9"), &red(), 9);
        assert_eq!(cart.items(), before);
    }

    #[test]
    fn test_update_quantity_clamps_to_u32_max() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 1));
        cart.update_quantity(&ProductId::new("p1"), &red(), i64::MAX);
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_ephemeral_cart_discards_slot_after_last_handle() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let cart = CartStore::open_ephemeral(Arc::clone(&store), "cart-a");
        cart.add_item(item("p1", red(), 1));

        let other = cart.clone();
        drop(cart);
        assert!(store.get("cart-a").unwrap().is_some());

        drop(other);
        assert_eq!(store.get("cart-a").unwrap(), None);
    }

    #[test]
    fn test_durable_cart_keeps_slot_after_drop() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        CartStore::open(Arc::clone(&store), "cart-a").add_item(item("p1", red(), 1));
        assert!(store.get("cart-a").unwrap().is_some());
    }

    #[test]
    fn test_remove_item() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 1));
        cart.add_item(item("p2", SelectedAttributes::new(), 1));
        cart.remove_item(&ProductId::new("p1"), &red());

        let lines = cart.items();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, ProductId::new("p2"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 1));
        cart.add_item(item("p2", SelectedAttributes::new(), 2));
        let before = cart.items();

        cart.remove_item(&ProductId::new("p1"), &SelectedAttributes::new());
        cart.remove_item(&ProductId::new("p3"), &red());
        assert_eq!(cart.items(), before);
    }

    #[test]
    fn test_clear() {
        let cart = CartStore::in_memory();
        cart.add_item(item("p1", red(), 1));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_subtotal_is_unrounded() {
        let cart = CartStore::in_memory();
        cart.add_item(CartLineItem::new(
            "p1",
            "P1",
            Decimal::new(3333, 3),
            SelectedAttributes::new(),
            2,
        ));
        assert_eq!(cart.subtotal(), Decimal::new(6666, 3));
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let cart = CartStore::open(store.clone(), CART_KEY);

        cart.add_item(item("p1", red(), 1));
        let stored: Vec<CartLineItem> =
            serde_json::from_str(&store.get(CART_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, cart.items());

        cart.update_quantity(&ProductId::new("p1"), &red(), 4);
        let stored: Vec<CartLineItem> =
            serde_json::from_str(&store.get(CART_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored[0].quantity, 4);

        cart.clear();
        assert_eq!(store.get(CART_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_rehydrate_roundtrip() {
        let store = Arc::new(MemoryStore::new());
        let original = CartStore::open(store.clone(), CART_KEY);
        original.add_item(item("p1", SelectedAttributes::new(), 2));
        original.add_item(item("p2", red(), 1));
        original.add_item(item("p3", SelectedAttributes::new(), 5));
        let snapshot = original.items();
        drop(original);

        let reopened = CartStore::open(store, CART_KEY);
        assert_eq!(reopened.items(), snapshot);
    }

    #[test]
    fn test_malformed_storage_opens_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(CART_KEY, "not json at all").unwrap();
        let cart = CartStore::open(store, CART_KEY);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_file_backed_cart_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());

        let cart = CartStore::open(store.clone(), CART_KEY);
        cart.add_item(item("p1", red(), 2));
        drop(cart);

        let reopened = CartStore::open(store, CART_KEY);
        assert_eq!(reopened.total_quantity(), 2);
    }

    #[test]
    fn test_checkout_guard_is_exclusive() {
        let cart = CartStore::in_memory();
        let guard = cart.try_begin_checkout().unwrap();
        assert!(cart.is_checkout_in_flight());
        assert!(cart.clone().try_begin_checkout().is_none());
        drop(guard);
        assert!(!cart.is_checkout_in_flight());
        assert!(cart.try_begin_checkout().is_some());
    }
}
