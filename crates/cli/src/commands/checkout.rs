//! Checkout quote command.
//!
//! ```bash
//! spicehub checkout quote --shipping express
//! ```
//!
//! Prices the profile cart the way the checkout summary does at the payment
//! step, without placing anything.

use std::fmt::Write as _;

use spicehub_core::{CartStore, Checkout, CheckoutError, KeyValueStorage, Price, ShippingMethod};

/// Quote the cart with the given shipping option.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` when there is nothing to quote.
pub fn quote<S: KeyValueStorage>(
    cart: &CartStore<S>,
    shipping: ShippingMethod,
) -> Result<String, CheckoutError> {
    let mut checkout = Checkout::begin(cart)?;
    checkout.select_shipping(shipping);
    let totals = checkout.totals();

    let mut out = String::new();
    let _ = writeln!(out, "Subtotal  {:>10}", Price::store(totals.subtotal).display());
    let _ = writeln!(
        out,
        "Shipping  {:>10}  {} ({})",
        Price::store(totals.shipping).display(),
        shipping.name(),
        shipping.description()
    );
    let _ = writeln!(out, "Tax       {:>10}", Price::store(totals.tax).display());
    let _ = write!(out, "Total     {:>10}", totals.total_price().display());
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use spicehub_core::{CartLine, MemoryStorage};

    use super::*;

    #[test]
    fn test_quote_masala_express() {
        let mut cart = CartStore::new(MemoryStorage::new());
        cart.add_to_cart(
            CartLine::new("masala1", "Garam Masala", Decimal::new(1299, 2), "a.jpg")
                .with_quantity(3),
        );

        let out = quote(&cart, ShippingMethod::Express).unwrap();

        assert!(out.contains("$38.97"));
        assert!(out.contains("$12.99  Express Shipping"));
        assert!(out.contains("$5.07"));
        assert!(out.ends_with("$57.03"));
    }

    #[test]
    fn test_quote_empty_cart() {
        let cart = CartStore::new(MemoryStorage::new());
        assert_eq!(
            quote(&cart, ShippingMethod::Standard),
            Err(CheckoutError::EmptyCart)
        );
    }
}
