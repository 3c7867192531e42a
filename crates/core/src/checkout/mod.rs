//! The checkout flow.
//!
//! A [`Checkout`] walks the shopper through
//! `Information -> Shipping -> Payment -> Confirmation`. It snapshots the
//! cart when it starts, collects a [`CheckoutForm`], prices the order with
//! [`OrderTotals`], and on placement empties the cart and keeps the
//! resulting [`PlacedOrder`] for the confirmation view.

pub mod error;
pub mod form;
pub mod machine;
pub mod order;
pub mod shipping;

pub use error::CheckoutError;
pub use form::{CheckoutForm, PaymentDetails};
pub use machine::Checkout;
pub use order::{OrderNumber, OrderTotals, PAYMENT_METHOD, PlacedOrder, ShippingAddress, TAX_RATE};
pub use shipping::ShippingMethod;
