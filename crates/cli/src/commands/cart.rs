//! Cart profile commands.
//!
//! # Usage
//!
//! ```bash
//! spicehub cart add --id masala1 --name "Garam Masala" --price 12.99 \
//!     --image /img/masala.jpg --quantity 3
//! spicehub cart update masala1 5
//! spicehub cart remove masala1
//! spicehub cart show
//! spicehub cart count
//! spicehub cart total
//! spicehub cart clear
//! ```
//!
//! Each command opens the cart in the profile directory, applies one
//! operation and prints the result.

use std::fmt::Write as _;

use rust_decimal::Decimal;

use spicehub_core::{CartLine, CartStore, KeyValueStorage, Price, ProductId};

/// Product details for `cart add`.
#[derive(Debug, Clone)]
pub struct NewLine {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
    pub original_price: Option<Decimal>,
    pub weight: Option<String>,
}

impl From<NewLine> for CartLine {
    fn from(new: NewLine) -> Self {
        let mut line =
            Self::new(new.id, new.name, new.price, new.image).with_quantity(new.quantity);
        if let Some(original_price) = new.original_price {
            line = line.with_original_price(original_price);
        }
        if let Some(weight) = new.weight {
            line = line.with_weight(weight);
        }
        line
    }
}

/// Render the cart as a plain-text table.
#[must_use]
pub fn render<S: KeyValueStorage>(cart: &CartStore<S>) -> String {
    let lines = cart.get_cart();
    if lines.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for line in &lines {
        let _ = write!(
            out,
            "{:<16} {:<28} {:>3} x {:>9}",
            line.id.as_str(),
            line.name,
            line.quantity,
            line.unit_price().display()
        );
        if let Some(original) = line.original_price.filter(|_| line.is_discounted()) {
            let _ = write!(out, " (was {})", Price::store(original).display());
        }
        let _ = writeln!(out, " = {:>9}", Price::store(line.line_total()).display());
    }
    let _ = write!(
        out,
        "{} items, subtotal {}",
        cart.get_cart_count(),
        Price::store(cart.get_cart_total()).display()
    );
    out
}

pub fn add<S: KeyValueStorage>(cart: &mut CartStore<S>, new: NewLine) -> String {
    let id = new.id.clone();
    cart.add_to_cart(new.into());
    let quantity = cart
        .get_cart()
        .iter()
        .find(|line| line.id.as_str() == id)
        .map_or(0, |line| line.quantity);
    format!("{id}: {quantity} in cart")
}

/// Set a line's quantity; zero or less removes it.
pub fn update<S: KeyValueStorage>(cart: &mut CartStore<S>, id: &str, quantity: i64) -> String {
    let id = ProductId::new(id);
    cart.update_cart_item_quantity(&id, quantity);
    if quantity <= 0 {
        format!("{id}: removed")
    } else {
        format!("{id}: quantity {quantity}")
    }
}

pub fn remove<S: KeyValueStorage>(cart: &mut CartStore<S>, id: &str) -> String {
    let id = ProductId::new(id);
    cart.remove_from_cart(&id);
    format!("{id}: removed")
}

pub fn clear<S: KeyValueStorage>(cart: &mut CartStore<S>) -> String {
    cart.clear_cart();
    "Cart cleared".to_string()
}

#[must_use]
pub fn count<S: KeyValueStorage>(cart: &CartStore<S>) -> String {
    cart.get_cart_count().to_string()
}

#[must_use]
pub fn total<S: KeyValueStorage>(cart: &CartStore<S>) -> String {
    Price::store(cart.get_cart_total()).display()
}
