//! Storefront-side models.

pub mod session;

pub use session::{
    SessionCart, clear_pending_order, keys as session_keys, load_checkout, load_pending_order,
    store_checkout, store_pending_order,
};
