//! Money amounts with decimal arithmetic.
//!
//! Arithmetic in the cart and checkout always runs on unrounded
//! [`Decimal`] values. [`Price`] only exists at the edge, where an amount is
//! paired with a currency and rendered for the shopper.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount paired with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A price in the store's default currency.
    #[must_use]
    pub fn store(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// The amount rounded to cents, half away from zero.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
///
/// The store sells in Canadian dollars; the others are accepted so that
/// amounts coming back from payment processors keep their tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    CAD,
    USD,
    EUR,
    GBP,
    AUD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::CAD | Self::USD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CAD => "CAD",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::store(Decimal::new(570_261, 4)).display(), "$57.03");
        assert_eq!(Price::store(Decimal::new(50_661, 4)).display(), "$5.07");
    }

    #[test]
    fn test_display_pads_whole_amounts() {
        assert_eq!(Price::store(Decimal::from(35)).display(), "$35.00");
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        assert_eq!(Price::store(Decimal::new(1_125, 3)).display(), "$1.13");
    }

    #[test]
    fn test_currency_symbols() {
        let price = Price::new(Decimal::new(1_099, 2), CurrencyCode::GBP);
        assert_eq!(price.to_string(), "£10.99");
        assert_eq!(CurrencyCode::default().code(), "CAD");
    }
}
