//! A single cart entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, ProductId};

/// Highest unit price a cart line may carry (1,000,000.00).
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 2);

/// Highest subtotal the cart store keeps (10^18).
pub const MAX_CART_SUBTOTAL: Decimal =
    Decimal::from_parts(0xA764_0000, 0x0DE0_B6B3, 0, false, 0);

/// Decimal places a price may have.
pub const PRICE_SCALE: u32 = 2;

/// Why a typed price was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPrice {
    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("price cannot be negative")]
    Negative,

    #[error("price has more than {} decimal places", PRICE_SCALE)]
    TooPrecise,

    #[error("price exceeds {}", MAX_UNIT_PRICE)]
    TooLarge,
}

/// One purchasable entry in the cart.
///
/// Serialized with camelCase keys and prices as JSON numbers:
/// `{"id":"masala1","name":"Garam Masala","price":12.99,"quantity":3,"image":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Catalog product ID, the merge key.
    pub id: ProductId,
    pub name: String,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Pre-discount price, shown struck through. Not checked against `price`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub original_price: Option<Decimal>,
    /// Always at least 1 once stored.
    pub quantity: u32,
    pub image: String,
    /// Package size, e.g. "100g".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

impl CartLine {
    /// A line for one unit of a product.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            original_price: None,
            quantity: 1,
            image: image.into(),
            weight: None,
        }
    }

    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub const fn with_original_price(mut self, original_price: Decimal) -> Self {
        self.original_price = Some(original_price);
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    /// `price * quantity`, unrounded. Saturates instead of overflowing;
    /// lines read from a [`CartStore`](super::CartStore) never reach the bound.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// `price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }

    /// Whether both prices lie in `0..=MAX_UNIT_PRICE`.
    #[must_use]
    pub fn prices_in_range(&self) -> bool {
        let in_range = |amount: Decimal| !amount.is_sign_negative() && amount <= MAX_UNIT_PRICE;
        in_range(self.price) && self.original_price.is_none_or(in_range)
    }

    /// Whether the line shows a markdown from `original_price`.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }

    /// Unit price in the store currency.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::store(self.price)
    }
}

/// Sum of line totals.
///
/// `None` if a line's prices are out of range, the sum overflows, or it
/// exceeds [`MAX_CART_SUBTOTAL`].
#[must_use]
pub fn checked_subtotal(lines: &[CartLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| {
            if !line.prices_in_range() {
                return None;
            }
            total.checked_add(line.checked_line_total()?)
        })
        .filter(|total| *total <= MAX_CART_SUBTOTAL)
}

/// Parse a unit price typed into a form or passed on the command line.
///
/// # Errors
///
/// Rejects non-numbers, negatives, more than two decimal places, and
/// anything above [`MAX_UNIT_PRICE`].
pub fn parse_unit_price(raw: &str) -> Result<Decimal, InvalidPrice> {
    let price = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|_| InvalidPrice::NotANumber(raw.to_string()))?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(InvalidPrice::Negative);
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(InvalidPrice::TooPrecise);
    }
    if price > MAX_UNIT_PRICE {
        return Err(InvalidPrice::TooLarge);
    }
    Ok(price.normalize())
}

/// Interpret a quantity typed into a cart quantity field.
///
/// Anything that is not a positive integer becomes 1, so a stray keystroke
/// never removes a line.
#[must_use]
pub fn parse_quantity_input(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|quantity| *quantity >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape_matches_persisted_format() {
        let line = CartLine::new("masala1", "Garam Masala", Decimal::new(1299, 2), "/img/masala.jpg")
            .with_quantity(3)
            .with_weight("100g");
        let json = serde_json::to_value(&line).unwrap();

        assert_eq!(json["id"], "masala1");
        assert_eq!(json["price"], serde_json::json!(12.99));
        assert_eq!(json["quantity"], 3);
        assert_eq!(json["weight"], "100g");
        assert!(json.get("originalPrice").is_none());
    }

    #[test]
    fn test_deserializes_browser_written_line() {
        let raw = r#"{"id":"chai","name":"Masala Chai","price":8.5,"originalPrice":10,"quantity":2,"image":"chai.png"}"#;
        let line: CartLine = serde_json::from_str(raw).unwrap();

        assert_eq!(line.price, Decimal::new(85, 1));
        assert_eq!(line.original_price, Some(Decimal::from(10)));
        assert_eq!(line.weight, None);
        assert!(line.is_discounted());
        assert_eq!(line.line_total(), Decimal::from(17));
    }

    #[test]
    fn test_line_total_saturates() {
        let line = CartLine::new("gold", "Saffron", Decimal::MAX, "s.jpg").with_quantity(2);
        assert_eq!(line.checked_line_total(), None);
        assert_eq!(line.line_total(), Decimal::MAX);
    }

    #[test]
    fn test_checked_subtotal_limits() {
        let masala = CartLine::new("masala1", "Garam Masala", Decimal::new(1299, 2), "a.jpg")
            .with_quantity(3);
        assert_eq!(checked_subtotal(&[masala]), Some(Decimal::new(3897, 2)));
        assert_eq!(checked_subtotal(&[]), Some(Decimal::ZERO));

        let price = "50000000000000000000000000000".parse().unwrap();
        let huge = CartLine::new("x", "X", price, "x.jpg").with_quantity(2);
        assert_eq!(checked_subtotal(&[huge]), None);

        let max = CartLine::new("top", "Top", MAX_UNIT_PRICE, "t.jpg").with_quantity(u32::MAX);
        let many = vec![max; 300];
        assert_eq!(checked_subtotal(&many), None);
    }

    #[test]
    fn test_parse_unit_price() {
        assert_eq!(parse_unit_price(" 12.99 "), Ok(Decimal::new(1299, 2)));
        assert_eq!(parse_unit_price("12.50"), Ok(Decimal::new(1250, 2)));
        assert_eq!(parse_unit_price("12.9900").unwrap().scale(), 2);
        assert_eq!(parse_unit_price("0"), Ok(Decimal::ZERO));
        assert_eq!(parse_unit_price("1000000"), Ok(MAX_UNIT_PRICE.normalize()));
        assert_eq!(parse_unit_price("-1"), Err(InvalidPrice::Negative));
        assert_eq!(parse_unit_price("12.999"), Err(InvalidPrice::TooPrecise));
        assert_eq!(parse_unit_price("1000000.01"), Err(InvalidPrice::TooLarge));
        assert_eq!(
            parse_unit_price("50000000000000000000000000000"),
            Err(InvalidPrice::TooLarge)
        );
        assert!(matches!(parse_unit_price("abc"), Err(InvalidPrice::NotANumber(_))));
    }

    #[test]
    fn test_parse_quantity_input_clamps_to_one() {
        assert_eq!(parse_quantity_input("4"), 4);
        assert_eq!(parse_quantity_input(" 2 "), 2);
        assert_eq!(parse_quantity_input("0"), 1);
        assert_eq!(parse_quantity_input("-3"), 1);
        assert_eq!(parse_quantity_input("abc"), 1);
        assert_eq!(parse_quantity_input(""), 1);
    }
}
