//! Checkout error types.

use thiserror::Error;

use crate::types::CheckoutStep;

/// Errors from driving a [`Checkout`](super::Checkout).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// A checkout cannot start on an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The step after payment is reached by placing the order.
    #[error("place the order to continue past payment")]
    PlaceOrderRequired,

    /// The action is not allowed from the current step.
    #[error("cannot {action} from the {step:?} step")]
    InvalidTransition {
        step: CheckoutStep,
        action: &'static str,
    },

    /// A form field name that the checkout does not know.
    #[error("unknown checkout field: {0}")]
    UnknownField(String),
}
