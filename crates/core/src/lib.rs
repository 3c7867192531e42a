//! SpiceHub Core - cart state and checkout flow.
//!
//! This crate holds everything the storefront and the CLI share:
//! - [`types`] - Newtype IDs, prices, contact emails, and step/status enums
//! - [`cart`] - The persisted cart store and its change notifications
//! - [`checkout`] - The linear checkout step machine and the order it produces
//!
//! # Architecture
//!
//! No network or database access lives here. The cart store persists through
//! the [`cart::KeyValueStorage`] trait; callers decide where the bytes go
//! (a session, a profile file, or memory in tests).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{CART_STORAGE_KEY, CartLine, CartStore, KeyValueStorage, MemoryStorage};
pub use checkout::{Checkout, CheckoutError, CheckoutForm, OrderTotals, PlacedOrder, ShippingMethod};
pub use types::*;
