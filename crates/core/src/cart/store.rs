//! Persisted cart store with change notifications.

use core::fmt;

use rust_decimal::Decimal;

use super::line::{CartLine, checked_subtotal};
use super::storage::KeyValueStorage;
use crate::types::ProductId;

/// Storage key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "spicehub-cart";

/// Handle returned by [`CartStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn() + Send + Sync>;

/// The shopper's cart, persisted in a [`KeyValueStorage`].
///
/// Every operation reads the persisted value fresh, so two stores over the
/// same storage see each other's writes. Mutators persist first and then
/// call each subscriber exactly once, in subscription order.
///
/// ```
/// use rust_decimal::Decimal;
/// use spicehub_core::{CartLine, CartStore, MemoryStorage};
///
/// let mut cart = CartStore::new(MemoryStorage::new());
/// cart.add_to_cart(CartLine::new("p1", "Cumin", Decimal::new(5, 0), "cumin.jpg").with_quantity(2));
/// cart.add_to_cart(CartLine::new("p1", "Cumin", Decimal::new(5, 0), "cumin.jpg").with_quantity(2));
///
/// assert_eq!(cart.get_cart().len(), 1);
/// assert_eq!(cart.get_cart_count(), 4);
/// assert_eq!(cart.get_cart_total(), Decimal::new(20, 0));
/// ```
pub struct CartStore<S> {
    storage: S,
    key: String,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStorage> CartStore<S> {
    /// A store persisting under [`CART_STORAGE_KEY`].
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, CART_STORAGE_KEY)
    }

    /// A store persisting under a custom key.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Borrow the underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Give back the underlying storage, dropping all subscriptions.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Register a callback fired after every mutation.
    pub fn subscribe(&mut self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Current lines in insertion order.
    ///
    /// Never fails: a missing, unreadable or malformed value reads as an
    /// empty cart. So does a cart whose prices are out of range or whose
    /// subtotal cannot be computed.
    pub fn get_cart(&self) -> Vec<CartLine> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, "Cart storage unavailable, using empty cart: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(lines) => {
                let lines = normalize(lines);
                if checked_subtotal(&lines).is_none() {
                    tracing::warn!(key = %self.key, "Stored cart exceeds price limits, using empty cart");
                    return Vec::new();
                }
                lines
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "Failed to parse stored cart, using empty cart: {e}");
                Vec::new()
            }
        }
    }

    /// Add a line, merging into an existing line with the same ID.
    ///
    /// On a merge only the quantity changes; the stored name, price and
    /// image are kept. A new line with quantity 0 is not stored.
    pub fn add_to_cart(&mut self, line: CartLine) {
        let mut lines = self.get_cart();

        if let Some(existing) = lines.iter_mut().find(|l| l.id == line.id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            tracing::debug!(id = %line.id, quantity = existing.quantity, "Merged cart line");
        } else if line.quantity > 0 {
            tracing::debug!(id = %line.id, quantity = line.quantity, "Added cart line");
            lines.push(line);
        }

        self.save(&lines);
    }

    /// Remove the line with `id`. Absent IDs are not an error.
    pub fn remove_from_cart(&mut self, id: &ProductId) {
        let mut lines = self.get_cart();
        lines.retain(|l| &l.id != id);
        tracing::debug!(%id, "Removed cart line");
        self.save(&lines);
    }

    /// Replace the quantity of the line with `id`.
    ///
    /// A quantity of zero or less removes the line instead.
    pub fn update_cart_item_quantity(&mut self, id: &ProductId, quantity: i64) {
        let Some(quantity) = u32::try_from(quantity).ok().filter(|q| *q > 0) else {
            self.remove_from_cart(id);
            return;
        };

        let mut lines = self.get_cart();
        if let Some(line) = lines.iter_mut().find(|l| &l.id == id) {
            line.quantity = quantity;
            tracing::debug!(%id, quantity, "Updated cart line quantity");
        }
        self.save(&lines);
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        tracing::debug!("Cleared cart");
        self.save(&[]);
    }

    /// Sum of `price * quantity` over all lines.
    pub fn get_cart_total(&self) -> Decimal {
        checked_subtotal(&self.get_cart()).unwrap_or_default()
    }

    /// Sum of all quantities, for the header badge.
    pub fn get_cart_count(&self) -> u64 {
        self.get_cart()
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get_cart().is_empty()
    }

    /// Persist `lines` and notify. A change that would push the cart out of
    /// price limits is dropped with a warning, leaving the stored cart as is.
    fn save(&mut self, lines: &[CartLine]) {
        if checked_subtotal(lines).is_none() {
            tracing::warn!(key = %self.key, "Cart change exceeds price limits, not saved");
            self.notify();
            return;
        }
        match serde_json::to_string(lines) {
            Ok(raw) => {
                if let Err(e) = self.storage.set_item(&self.key, raw) {
                    tracing::warn!(key = %self.key, "Failed to persist cart: {e}");
                }
            }
            Err(e) => tracing::warn!(key = %self.key, "Failed to serialize cart: {e}"),
        }
        self.notify();
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener();
        }
    }
}

/// Drop zero-quantity lines and fold duplicate IDs into their first occurrence.
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut out: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        if let Some(existing) = out.iter_mut().find(|l| l.id == line.id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            out.push(line);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cart::{MemoryStorage, StorageError};

    fn line(id: &str, price: Decimal, quantity: u32) -> CartLine {
        CartLine::new(id, format!("Product {id}"), price, format!("/img/{id}.jpg"))
            .with_quantity(quantity)
    }

    fn counting(store: &mut CartStore<MemoryStorage>) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        store.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    /// Storage whose reads and writes always fail.
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn set_item(&mut self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }
    }

    #[test]
    fn test_get_cart_empty_when_nothing_stored() {
        let store = CartStore::new(MemoryStorage::new());
        assert!(store.get_cart().is_empty());
        assert_eq!(store.get_cart_count(), 0);
        assert_eq!(store.get_cart_total(), Decimal::ZERO);
    }

    #[test]
    fn test_get_cart_empty_when_corrupt() {
        let corrupt = [
            "not json",
            r#"{"id":"p1"}"#,
            r#"[{"id":"p1"}]"#,
            r#"[{"id":"p1","name":"x","price":1,"quantity":-2,"image":""}]"#,
        ];
        for raw in corrupt {
            let store = CartStore::new(MemoryStorage::with_item(CART_STORAGE_KEY, raw));
            assert!(store.get_cart().is_empty(), "expected empty cart for {raw}");
        }
    }

    #[test]
    fn test_unavailable_storage_degrades_to_empty_cart() {
        let mut store = CartStore::new(BrokenStorage);
        store.add_to_cart(line("p1", Decimal::ONE, 1));
        store.clear_cart();
        assert!(store.get_cart().is_empty());
        assert_eq!(store.get_cart_count(), 0);
    }

    #[test]
    fn test_add_distinct_ids_sums_counts() {
        let mut store = CartStore::new(MemoryStorage::new());
        let quantities = [("a", 1), ("b", 4), ("c", 2), ("d", 7)];
        for (id, qty) in quantities {
            store.add_to_cart(line(id, Decimal::ONE, qty));
        }

        assert_eq!(store.get_cart().len(), quantities.len());
        assert_eq!(store.get_cart_count(), 14);
    }

    #[test]
    fn test_add_same_id_merges_quantity_and_keeps_metadata() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("p1", Decimal::from(5), 2));
        store.add_to_cart(
            CartLine::new("p1", "Renamed", Decimal::from(99), "other.jpg").with_quantity(2),
        );

        let cart = store.get_cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 4);
        assert_eq!(cart[0].name, "Product p1");
        assert_eq!(cart[0].price, Decimal::from(5));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("z", Decimal::ONE, 1));
        store.add_to_cart(line("a", Decimal::ONE, 1));
        store.add_to_cart(line("z", Decimal::ONE, 1));

        let ids: Vec<_> = store.get_cart().into_iter().map(|l| l.id.to_string()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[test]
    fn test_zero_quantity_line_not_stored() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("p1", Decimal::ONE, 0));
        assert!(store.get_cart().is_empty());
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("p1", Decimal::ONE, 3));
        store.add_to_cart(line("p2", Decimal::ONE, 1));

        store.update_cart_item_quantity(&"p1".into(), 0);
        assert!(store.get_cart().iter().all(|l| l.id.as_str() != "p1"));

        store.update_cart_item_quantity(&"p2".into(), -5);
        assert!(store.get_cart().is_empty());
    }

    #[test]
    fn test_update_replaces_quantity() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("p1", Decimal::ONE, 3));
        store.update_cart_item_quantity(&"p1".into(), 7);
        assert_eq!(store.get_cart()[0].quantity, 7);
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("p1", Decimal::ONE, 2));
        let before = store.get_cart();

        store.remove_from_cart(&"ghost".into());
        store.update_cart_item_quantity(&"ghost".into(), 9);

        assert_eq!(store.get_cart(), before);
    }

    #[test]
    fn test_total_and_count() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("a", Decimal::from(10), 2));
        store.add_to_cart(line("b", Decimal::from(5), 3));

        assert_eq!(store.get_cart_total(), Decimal::from(35));
        assert_eq!(store.get_cart_count(), 5);
    }

    #[test]
    fn test_masala_total() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("masala1", Decimal::new(1299, 2), 3));
        assert_eq!(store.get_cart_total(), Decimal::new(3897, 2));
    }

    #[test]
    fn test_clear_cart() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("a", Decimal::from(10), 2));
        store.clear_cart();

        assert!(store.get_cart().is_empty());
        assert_eq!(store.get_cart_count(), 0);
        assert_eq!(store.storage().get(CART_STORAGE_KEY), Some("[]"));
    }

    #[test]
    fn test_get_cart_idempotent() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("a", Decimal::from(3), 1));
        assert_eq!(store.get_cart(), store.get_cart());
    }

    #[test]
    fn test_every_mutation_notifies_once() {
        let mut store = CartStore::new(MemoryStorage::new());
        let hits = counting(&mut store);

        store.add_to_cart(line("a", Decimal::ONE, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        store.update_cart_item_quantity(&"a".into(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        store.update_cart_item_quantity(&"a".into(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        store.remove_from_cart(&"a".into());
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        store.clear_cart();
        assert_eq!(hits.load(Ordering::SeqCst), 5);

        let _ = store.get_cart();
        let _ = store.get_cart_total();
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = CartStore::new(MemoryStorage::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let id = store.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.add_to_cart(line("a", Decimal::ONE, 1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.clear_cart();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_two_stores_share_storage() {
        let mut shared = MemoryStorage::new();
        {
            let mut first = CartStore::new(&mut shared);
            first.add_to_cart(line("a", Decimal::ONE, 2));
        }
        let mut second = CartStore::new(&mut shared);
        second.add_to_cart(line("b", Decimal::ONE, 1));

        assert_eq!(second.get_cart().len(), 2);
        assert_eq!(second.get_cart_count(), 3);
    }

    #[test]
    fn test_normalize_repairs_stored_duplicates() {
        let raw = r#"[
            {"id":"a","name":"A","price":1,"quantity":2,"image":""},
            {"id":"b","name":"B","price":1,"quantity":0,"image":""},
            {"id":"a","name":"A again","price":9,"quantity":1,"image":""}
        ]"#;
        let store = CartStore::new(MemoryStorage::with_item(CART_STORAGE_KEY, raw));
        let cart = store.get_cart();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 3);
        assert_eq!(cart[0].name, "A");
    }

    #[test]
    fn test_overflowing_stored_cart_reads_empty() {
        let raw = r#"[
            {"id":"a","name":"A","price":1,"quantity":1,"image":""},
            {"id":"b","name":"B","price":5e28,"quantity":2,"image":""}
        ]"#;
        let store = CartStore::new(MemoryStorage::with_item(CART_STORAGE_KEY, raw));

        assert!(store.get_cart().is_empty());
        assert_eq!(store.get_cart_total(), Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_add_is_dropped() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add_to_cart(line("a", Decimal::new(1299, 2), 1));
        let hits = counting(&mut store);

        store.add_to_cart(line("b", "50000000000000000000000000000".parse().unwrap(), 2));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_cart().len(), 1);
        assert_eq!(store.get_cart_total(), Decimal::new(1299, 2));
    }
}
