//! The shopper's cart.
//!
//! A [`CartStore`] owns the ordered list of [`CartLine`]s, persists it as a
//! JSON array under [`CART_STORAGE_KEY`] in a [`KeyValueStorage`], and calls
//! every subscriber after each mutation so independently rendered views
//! (header badge, cart page, checkout summary) can re-read it.
//!
//! Nothing in this module fails outward. Missing, unreadable or corrupt
//! storage reads as an empty cart; a failed write is logged and dropped.

pub mod line;
pub mod storage;
pub mod store;

pub use line::{
    CartLine, InvalidPrice, MAX_CART_SUBTOTAL, MAX_UNIT_PRICE, checked_subtotal,
    parse_quantity_input, parse_unit_price,
};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};
pub use store::{CART_STORAGE_KEY, CartStore, SubscriptionId};
