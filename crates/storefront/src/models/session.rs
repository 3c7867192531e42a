//! Session-related types.
//!
//! The session is the storefront's key-value storage: the raw cart JSON sits
//! under the same key the cart store uses anywhere else, next to the
//! in-progress checkout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tower_sessions::Session;

use spicehub_core::checkout::OrderNumber;
use spicehub_core::{CART_STORAGE_KEY, CartStore, Checkout, MemoryStorage};

/// Session keys.
pub mod keys {
    /// Raw cart JSON, exactly as the cart store persists it.
    pub const CART: &str = spicehub_core::CART_STORAGE_KEY;

    /// The in-progress (or just confirmed) checkout.
    pub const CHECKOUT: &str = "spicehub-checkout";

    /// Number of an order handed to the repository but not yet confirmed.
    pub const PENDING_ORDER: &str = "spicehub-pending-order";
}

/// A cart store loaded from the session for the duration of one request.
///
/// Tracks whether any mutation happened so the response can tell other
/// page fragments to refresh.
pub struct SessionCart {
    store: CartStore<MemoryStorage>,
    changed: Arc<AtomicBool>,
}

impl SessionCart {
    /// Load the cart JSON from the session. A missing or unreadable entry
    /// yields an empty cart.
    pub async fn load(session: &Session) -> Self {
        let raw = match session.get::<String>(keys::CART).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart from session");
                None
            }
        };

        let storage = raw.map_or_else(MemoryStorage::new, |json| {
            MemoryStorage::with_item(CART_STORAGE_KEY, json)
        });
        let mut store = CartStore::new(storage);

        let changed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&changed);
        store.subscribe(move || flag.store(true, Ordering::Relaxed));

        Self { store, changed }
    }

    #[must_use]
    pub const fn store(&self) -> &CartStore<MemoryStorage> {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut CartStore<MemoryStorage> {
        &mut self.store
    }

    /// Whether the cart was mutated since it was loaded.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed.load(Ordering::Relaxed)
    }

    /// Write the cart back to the session if it changed.
    ///
    /// # Errors
    ///
    /// Returns the session error if the write fails.
    pub async fn save(&self, session: &Session) -> Result<bool, tower_sessions::session::Error> {
        if !self.changed() {
            return Ok(false);
        }
        if let Some(json) = self.store.storage().get(CART_STORAGE_KEY) {
            session.insert(keys::CART, json).await?;
        }
        Ok(true)
    }
}

/// Read the stored checkout, if any.
pub async fn load_checkout(session: &Session) -> Option<Checkout> {
    session
        .get::<Checkout>(keys::CHECKOUT)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable checkout in session");
            None
        })
}

/// Store the checkout.
///
/// # Errors
///
/// Returns the session error if the write fails.
pub async fn store_checkout(
    session: &Session,
    checkout: &Checkout,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CHECKOUT, checkout).await
}

/// The order number recorded by an unfinished placement, if any.
pub async fn load_pending_order(session: &Session) -> Option<OrderNumber> {
    session
        .get::<OrderNumber>(keys::PENDING_ORDER)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable pending order number");
            None
        })
}

/// Record `number` and save the session immediately, so the record
/// outlives a failure later in the request.
///
/// # Errors
///
/// Returns the session error if the write or save fails.
pub async fn store_pending_order(
    session: &Session,
    number: &OrderNumber,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::PENDING_ORDER, number).await?;
    session.save().await
}

/// Forget the pending order number.
///
/// # Errors
///
/// Returns the session error if the write fails.
pub async fn clear_pending_order(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<OrderNumber>(keys::PENDING_ORDER).await.map(|_| ())
}
