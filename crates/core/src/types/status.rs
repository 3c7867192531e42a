//! Status enums for checkout and orders.

use serde::{Deserialize, Serialize};

/// A step of the checkout flow.
///
/// The flow is strictly linear:
/// `Information -> Shipping -> Payment -> Confirmation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Information,
    Shipping,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// Steps shown in the progress indicator. Confirmation is not one of them.
    pub const PROGRESS: [Self; 3] = [Self::Information, Self::Shipping, Self::Payment];

    /// The following step, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Information => Some(Self::Shipping),
            Self::Shipping => Some(Self::Payment),
            Self::Payment => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    /// The step a shopper may go back to, if any.
    ///
    /// Confirmation has no way back: the order is already placed.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Shipping => Some(Self::Information),
            Self::Payment => Some(Self::Shipping),
            Self::Information | Self::Confirmation => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmation)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Information => "Information",
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Confirmation => "Confirmation",
        }
    }

    /// Where `step` sits relative to `self` in the progress indicator.
    #[must_use]
    pub fn progress_of(self, step: Self) -> StepProgress {
        match step.cmp(&self) {
            std::cmp::Ordering::Less => StepProgress::Completed,
            std::cmp::Ordering::Equal => StepProgress::Current,
            std::cmp::Ordering::Greater => StepProgress::Upcoming,
        }
    }
}

/// Rendering state of one entry in the checkout progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepProgress {
    Completed,
    Current,
    Upcoming,
}

/// Lifecycle of a stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Submitted by the shopper, not yet handled.
    #[default]
    Placed,
    Fulfilled,
    Cancelled,
}
