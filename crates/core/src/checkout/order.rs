//! Order pricing and the record produced by placing an order.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::shipping::ShippingMethod;
use crate::cart::CartLine;
use crate::types::{CheckoutStep, Price};

/// Sales tax applied to the merchandise subtotal (13%).
pub const TAX_RATE: Decimal = Decimal::from_parts(13, 0, 0, false, 2);

/// Payment method recorded on every order; card is the only one offered.
pub const PAYMENT_METHOD: &str = "Credit Card";

/// Prefix of customer-facing order numbers.
const ORDER_NUMBER_PREFIX: &str = "SPH-";

/// Amounts for one order. All values are exact; round only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Price a subtotal with the given shipping option.
    ///
    /// Tax applies to the subtotal only, not to shipping. Arithmetic
    /// saturates; cart subtotals stay far below the bound.
    #[must_use]
    pub fn compute(subtotal: Decimal, shipping_method: ShippingMethod) -> Self {
        let shipping = shipping_method.cost();
        let tax = subtotal.saturating_mul(TAX_RATE);
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal.saturating_add(shipping).saturating_add(tax),
        }
    }

    /// Running total shown in the order summary at `step`.
    ///
    /// Shipping is added once the shopper reaches the shipping step and tax
    /// once they reach payment.
    #[must_use]
    pub fn displayed_total(&self, step: CheckoutStep) -> Decimal {
        match step {
            CheckoutStep::Information => self.subtotal,
            CheckoutStep::Shipping => self.subtotal.saturating_add(self.shipping),
            CheckoutStep::Payment | CheckoutStep::Confirmation => self.total,
        }
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::store(self.total)
    }
}

/// Customer-facing order number, e.g. `SPH-91234567`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Derive the number from the placement time: the Unix timestamp in
    /// milliseconds with its five leading digits dropped.
    #[must_use]
    pub fn from_timestamp(placed_at: DateTime<Utc>) -> Self {
        let millis = placed_at.timestamp_millis().to_string();
        let tail = millis.get(5..).unwrap_or(&millis);
        Self(format!("{ORDER_NUMBER_PREFIX}{tail}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Snapshot of an order at the moment it was placed.
///
/// Built before the cart is cleared, so it keeps the lines and totals the
/// confirmation view needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub number: OrderNumber,
    pub placed_at: DateTime<Utc>,
    pub email: String,
    pub phone: Option<String>,
    pub shipping_address: ShippingAddress,
    pub shipping_method: ShippingMethod,
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
    pub notes: Option<String>,
    pub payment_method: String,
    pub card_last_four: Option<String>,
}

impl PlacedOrder {
    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
