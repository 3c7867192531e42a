//! Shipping options offered at checkout.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// One of the fixed shipping options. `Standard` is pre-selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    pub const ALL: [Self; 3] = [Self::Standard, Self::Express, Self::Overnight];

    /// Form value identifying the option.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Overnight => "overnight",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard Shipping",
            Self::Express => "Express Shipping",
            Self::Overnight => "Overnight Shipping",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Standard => "Delivery in 5-7 business days",
            Self::Express => "Delivery in 2-3 business days",
            Self::Overnight => "Next business day delivery",
        }
    }

    /// Flat shipping charge.
    #[must_use]
    pub fn cost(self) -> Decimal {
        match self {
            Self::Standard => Decimal::new(599, 2),
            Self::Express => Decimal::new(1299, 2),
            Self::Overnight => Decimal::new(2499, 2),
        }
    }

    #[must_use]
    pub fn price(self) -> Price {
        Price::store(self.cost())
    }

    /// Resolve a form value, falling back to `Standard` for anything unknown.
    #[must_use]
    pub fn from_id_or_default(id: &str) -> Self {
        id.parse().unwrap_or_default()
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error for an unrecognised shipping option ID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shipping method: {0}")]
pub struct UnknownShippingMethod(pub String);

impl FromStr for ShippingMethod {
    type Err = UnknownShippingMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.id() == s.trim())
            .ok_or_else(|| UnknownShippingMethod(s.to_string()))
    }
}
