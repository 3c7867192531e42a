//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart lives in the session as the same JSON array the cart store
//! writes everywhere else; each handler loads it, applies one operation and
//! writes it back. Mutating handlers answer with `HX-Trigger: cart-updated`
//! so the header badge and any open summary re-fetch themselves.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{AppendHeaders, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use spicehub_core::cart::{checked_subtotal, parse_quantity_input, parse_unit_price};
use spicehub_core::{CartLine, Price, ProductId};

use crate::error::{AppError, Result};
use crate::models::SessionCart;

/// HTMX trigger sent after every cart mutation.
pub const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub weight: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub original_price: Option<String>,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    /// Build the view from the cart's lines.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let subtotal = checked_subtotal(lines).unwrap_or_default();
        Self {
            items: lines.iter().map(CartItemView::from).collect(),
            subtotal: Price::store(subtotal).display(),
            item_count: lines.iter().map(|line| u64::from(line.quantity)).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            image: line.image.clone(),
            weight: line.weight.clone(),
            quantity: line.quantity,
            price: line.unit_price().display(),
            original_price: line
                .is_discounted()
                .then(|| line.original_price.map(|p| Price::store(p).display()))
                .flatten(),
            line_price: Price::store(line.line_total()).display(),
        }
    }
}

/// Add to cart form data.
///
/// Product details come from the page that rendered the button; the cart
/// stores them as given.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    #[serde(default)]
    pub original_price: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: String,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

fn parse_amount(field: &str, raw: &str) -> Result<Decimal> {
    parse_unit_price(raw).map_err(|e| AppError::BadRequest(format!("invalid {field}: {e}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AddToCartForm {
    fn into_line(self) -> Result<CartLine> {
        if self.id.trim().is_empty() {
            return Err(AppError::BadRequest("missing product id".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("missing product name".to_string()));
        }
        let price = parse_amount("price", &self.price)?;
        let original_price = non_empty(self.original_price)
            .map(|raw| parse_amount("original price", &raw))
            .transpose()?;
        let quantity = self
            .quantity
            .as_deref()
            .map_or(1, parse_quantity_input);

        let mut line = CartLine::new(self.id.trim(), self.name, price, self.image)
            .with_quantity(quantity);
        if let Some(original_price) = original_price {
            line = line.with_original_price(original_price);
        }
        if let Some(weight) = non_empty(self.weight) {
            line = line.with_weight(weight);
        }
        Ok(line)
    }
}

/// Save the cart and render `body` with the update trigger if it changed.
async fn respond_after_mutation(
    cart: &SessionCart,
    session: &Session,
    body: impl IntoResponse,
) -> Result<Response> {
    if cart.save(session).await? {
        Ok((AppendHeaders([CART_UPDATED_TRIGGER]), body).into_response())
    } else {
        Ok(body.into_response())
    }
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> CartShowTemplate {
    let cart = SessionCart::load(&session).await;
    CartShowTemplate {
        cart: CartView::from_lines(&cart.store().get_cart()),
    }
}

/// Add item to cart (HTMX).
///
/// Merges into an existing line with the same product ID. Returns the new
/// cart count badge.
#[instrument(skip(session))]
pub async fn add(session: Session, Form(form): Form<AddToCartForm>) -> Result<Response> {
    let line = form.into_line()?;
    let product = line.id.clone();

    let mut cart = SessionCart::load(&session).await;
    cart.store_mut().add_to_cart(line);
    tracing::debug!(%product, "Added to cart");

    let count = cart.store().get_cart_count();
    respond_after_mutation(&cart, &session, CartCountTemplate { count }).await
}

/// Update cart item quantity (HTMX).
///
/// The quantity field is clamped the way the cart page input is: anything
/// that does not parse to at least 1 becomes 1.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Response> {
    let quantity = parse_quantity_input(&form.quantity);

    let mut cart = SessionCart::load(&session).await;
    cart.store_mut()
        .update_cart_item_quantity(&ProductId::new(form.id), i64::from(quantity));

    let view = CartView::from_lines(&cart.store().get_cart());
    respond_after_mutation(&cart, &session, CartItemsTemplate { cart: view }).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    cart.store_mut().remove_from_cart(&ProductId::new(form.id));

    let view = CartView::from_lines(&cart.store().get_cart());
    respond_after_mutation(&cart, &session, CartItemsTemplate { cart: view }).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    let cart = SessionCart::load(&session).await;
    CartCountTemplate {
        count: cart.store().get_cart_count(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn add_form(price: &str, quantity: Option<&str>) -> AddToCartForm {
        AddToCartForm {
            id: "masala1".to_string(),
            name: "Garam Masala".to_string(),
            price: price.to_string(),
            image: "/img/masala.jpg".to_string(),
            original_price: Some(String::new()),
            weight: Some("100g".to_string()),
            quantity: quantity.map(str::to_string),
        }
    }

    #[test]
    fn test_add_form_into_line() {
        let line = add_form("12.99", Some("3")).into_line().unwrap();
        assert_eq!(line.price, Decimal::new(1299, 2));
        assert_eq!(line.quantity, 3);
        assert_eq!(line.original_price, None);
        assert_eq!(line.weight.as_deref(), Some("100g"));
    }

    #[test]
    fn test_add_form_clamps_quantity() {
        assert_eq!(add_form("1", Some("abc")).into_line().unwrap().quantity, 1);
        assert_eq!(add_form("1", Some("-4")).into_line().unwrap().quantity, 1);
        assert_eq!(add_form("1", None).into_line().unwrap().quantity, 1);
    }

    #[test]
    fn test_add_form_rejects_bad_price() {
        assert!(matches!(
            add_form("twelve", None).into_line(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            add_form("-1.00", None).into_line(),
            Err(AppError::BadRequest(_))
        ));
        for price in ["12.999", "1000000.01", "50000000000000000000000000000"] {
            assert!(
                matches!(add_form(price, None).into_line(), Err(AppError::BadRequest(_))),
                "accepted {price}"
            );
        }
    }

    #[test]
    fn test_add_form_rejects_blank_name() {
        let mut form = add_form("12.99", None);
        form.name = "   ".to_string();
        assert!(matches!(form.into_line(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_cart_view_formats_prices() {
        let lines = vec![
            CartLine::new("masala1", "Garam Masala", Decimal::new(1299, 2), "a.jpg")
                .with_quantity(3)
                .with_original_price(Decimal::new(1599, 2)),
            CartLine::new("sumac", "Sumac", Decimal::new(507, 2), "b.jpg"),
        ];

        let view = CartView::from_lines(&lines);

        assert_eq!(view.subtotal, "$44.04");
        assert_eq!(view.item_count, 4);
        assert_eq!(view.items[0].line_price, "$38.97");
        assert_eq!(view.items[0].original_price.as_deref(), Some("$15.99"));
        assert_eq!(view.items[1].original_price, None);
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from_lines(&[]);
        assert!(view.is_empty());
        assert_eq!(view.subtotal, "$0.00");
        assert_eq!(view.item_count, 0);
    }
}
