//! Checkout route handlers.
//!
//! The checkout is parked in the session between requests. Each form post
//! applies its fields by their flat names, checks the step's required
//! fields, and moves the step machine on; the page then redirects back to
//! `GET /checkout`, which renders whatever step the machine is on.
//!
//! Placing an order stores it through the order repository first. Only when
//! that succeeds are the cleared cart and the confirmed checkout written back
//! to the session, so a failed insert leaves the shopper where they were.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use spicehub_core::{
    Checkout, CheckoutError, CheckoutForm, CheckoutStep, Email, PlacedOrder, Price,
    ShippingMethod, StepProgress,
};

use super::cart::{CART_UPDATED_TRIGGER, CartItemView};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{
    SessionCart, clear_pending_order, load_checkout, load_pending_order, store_checkout,
    store_pending_order,
};
use crate::state::AppState;

/// Raw form fields, keyed by their flat checkout names.
type FormFields = Vec<(String, String)>;

// =============================================================================
// Views
// =============================================================================

/// One entry of the progress indicator.
#[derive(Clone)]
pub struct ProgressView {
    pub label: &'static str,
    pub state: &'static str,
}

/// A selectable shipping option.
#[derive(Clone)]
pub struct ShippingOptionView {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: String,
    pub selected: bool,
}

/// What the confirmation step shows.
#[derive(Clone)]
pub struct ConfirmationView {
    pub order_number: String,
    pub date: String,
    pub total: String,
    pub payment_method: String,
    pub email: String,
    pub ship_to: String,
    pub address_lines: Vec<String>,
    pub shipping_method: &'static str,
    pub card_last_four: Option<String>,
}

impl From<&PlacedOrder> for ConfirmationView {
    fn from(order: &PlacedOrder) -> Self {
        let address = &order.shipping_address;
        let street = address.apartment.as_ref().map_or_else(
            || address.address.clone(),
            |apartment| format!("{}, {apartment}", address.address),
        );

        Self {
            order_number: order.number.to_string(),
            date: order.placed_at.format("%B %-d, %Y").to_string(),
            total: order.totals.total_price().display(),
            payment_method: order.payment_method.clone(),
            email: order.email.clone(),
            ship_to: address.full_name(),
            address_lines: vec![
                street,
                format!("{}, {} {}", address.city, address.province, address.postal_code),
                address.country.clone(),
            ],
            shipping_method: order.shipping_method.name(),
            card_last_four: order.card_last_four.clone(),
        }
    }
}

/// Checkout page data for templates.
#[derive(Clone)]
pub struct CheckoutView {
    /// Step identifier used by the template (`information`, `shipping`, ...).
    pub step: &'static str,
    pub progress: Vec<ProgressView>,
    pub lines: Vec<CartItemView>,
    pub subtotal: String,
    /// Shown from the shipping step on.
    pub shipping: Option<String>,
    /// Shown from the payment step on.
    pub tax: Option<String>,
    pub total: String,
    pub shipping_options: Vec<ShippingOptionView>,
    pub form: CheckoutForm,
    pub errors: Vec<String>,
    pub confirmation: Option<ConfirmationView>,
}

const fn step_id(step: CheckoutStep) -> &'static str {
    match step {
        CheckoutStep::Information => "information",
        CheckoutStep::Shipping => "shipping",
        CheckoutStep::Payment => "payment",
        CheckoutStep::Confirmation => "confirmation",
    }
}

const fn progress_state(progress: StepProgress) -> &'static str {
    match progress {
        StepProgress::Completed => "completed",
        StepProgress::Current => "current",
        StepProgress::Upcoming => "upcoming",
    }
}

impl CheckoutView {
    #[must_use]
    pub fn new(checkout: &Checkout, errors: Vec<String>) -> Self {
        let step = checkout.step();
        let totals = checkout.totals();
        let lines = checkout
            .placed_order()
            .map_or_else(|| checkout.lines(), |order| order.lines.as_slice());

        Self {
            step: step_id(step),
            progress: checkout
                .progress()
                .into_iter()
                .map(|(step, mark)| ProgressView {
                    label: step.label(),
                    state: progress_state(mark),
                })
                .collect(),
            lines: lines.iter().map(CartItemView::from).collect(),
            subtotal: Price::store(totals.subtotal).display(),
            shipping: (step >= CheckoutStep::Shipping)
                .then(|| Price::store(totals.shipping).display()),
            tax: (step >= CheckoutStep::Payment).then(|| Price::store(totals.tax).display()),
            total: Price::store(checkout.displayed_total()).display(),
            shipping_options: ShippingMethod::ALL
                .into_iter()
                .map(|method| ShippingOptionView {
                    id: method.id(),
                    name: method.name(),
                    description: method.description(),
                    price: method.price().display(),
                    selected: method == checkout.form().shipping_method,
                })
                .collect(),
            form: checkout.form().clone(),
            errors,
            confirmation: checkout.placed_order().map(ConfirmationView::from),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub view: CheckoutView,
}

// =============================================================================
// Helpers
// =============================================================================

/// The checkout to continue for this session.
///
/// A stored checkout is reused while the cart still matches its snapshot.
/// If the cart changed since, checkout restarts from the current cart with
/// the entered details kept. A confirmed checkout is shown until the cart
/// is filled again.
async fn current_checkout(
    session: &Session,
    cart: &SessionCart,
) -> std::result::Result<Checkout, CheckoutError> {
    let lines = cart.store().get_cart();

    match load_checkout(session).await {
        Some(existing) if existing.step().is_terminal() => {
            if lines.is_empty() {
                Ok(existing)
            } else {
                Checkout::begin(cart.store())
            }
        }
        Some(existing) if existing.lines() == lines.as_slice() => Ok(existing),
        Some(existing) => {
            tracing::debug!("Cart changed during checkout, restarting");
            let mut fresh = Checkout::begin(cart.store())?;
            *fresh.form_mut() = existing.form().clone();
            Ok(fresh)
        }
        None => Checkout::begin(cart.store()),
    }
}

fn require_step(
    checkout: &Checkout,
    expected: CheckoutStep,
    action: &'static str,
) -> std::result::Result<(), CheckoutError> {
    if checkout.step() == expected {
        Ok(())
    } else {
        Err(CheckoutError::InvalidTransition {
            step: checkout.step(),
            action,
        })
    }
}

fn apply_fields(
    checkout: &mut Checkout,
    fields: &FormFields,
) -> std::result::Result<(), CheckoutError> {
    for (name, value) in fields {
        checkout.set_field(name, value)?;
    }
    Ok(())
}

fn field_label(name: &str) -> &str {
    match name {
        "email" => "Email",
        "firstName" => "First name",
        "lastName" => "Last name",
        "address" => "Address",
        "city" => "City",
        "province" => "Province",
        "postalCode" => "Postal code",
        "cardNumber" => "Card number",
        "cardName" => "Name on card",
        "expiryDate" => "Expiry date",
        "cvv" => "Security code",
        other => other,
    }
}

/// Problems that keep the shopper on the current step.
fn validation_errors(checkout: &Checkout) -> Vec<String> {
    let mut errors: Vec<String> = checkout
        .missing_fields()
        .into_iter()
        .map(|name| format!("{} is required", field_label(name)))
        .collect();

    let email = checkout.form().email.trim();
    if checkout.step() == CheckoutStep::Information && !email.is_empty() {
        errors.extend(
            Email::parse(email)
                .err()
                .map(|e| format!("Enter a valid email address ({e})")),
        );
    }
    errors
}

fn render_with_errors(checkout: &Checkout, errors: Vec<String>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutTemplate {
            view: CheckoutView::new(checkout, errors),
        },
    )
        .into_response()
}

fn back_to_checkout() -> Response {
    Redirect::to("/checkout").into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the current checkout step.
///
/// Starts a checkout on first visit; an empty cart redirects to the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Response> {
    let cart = SessionCart::load(&session).await;
    let checkout = match current_checkout(&session, &cart).await {
        Ok(checkout) => checkout,
        Err(CheckoutError::EmptyCart) => return Ok(Redirect::to("/cart").into_response()),
        Err(e) => return Err(e.into()),
    };

    store_checkout(&session, &checkout).await?;
    Ok(CheckoutTemplate {
        view: CheckoutView::new(&checkout, Vec::new()),
    }
    .into_response())
}

/// Submit contact and shipping address details.
#[instrument(skip(session, fields))]
pub async fn submit_information(
    session: Session,
    Form(fields): Form<FormFields>,
) -> Result<Response> {
    let cart = SessionCart::load(&session).await;
    let mut checkout = current_checkout(&session, &cart).await?;
    require_step(&checkout, CheckoutStep::Information, "submit contact information")?;
    apply_fields(&mut checkout, &fields)?;

    let errors = validation_errors(&checkout);
    store_checkout(&session, &checkout).await?;
    if !errors.is_empty() {
        return Ok(render_with_errors(&checkout, errors));
    }

    checkout.advance()?;
    store_checkout(&session, &checkout).await?;
    Ok(back_to_checkout())
}

/// Choose a shipping option.
#[instrument(skip(session, fields))]
pub async fn submit_shipping(
    session: Session,
    Form(fields): Form<FormFields>,
) -> Result<Response> {
    let cart = SessionCart::load(&session).await;
    let mut checkout = current_checkout(&session, &cart).await?;
    require_step(&checkout, CheckoutStep::Shipping, "choose shipping")?;
    apply_fields(&mut checkout, &fields)?;

    checkout.advance()?;
    tracing::debug!(shipping = %checkout.form().shipping_method, "Shipping selected");
    store_checkout(&session, &checkout).await?;
    Ok(back_to_checkout())
}

/// Return to the previous step.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Response> {
    let Some(mut checkout) = load_checkout(&session).await else {
        return Ok(Redirect::to("/cart").into_response());
    };

    checkout.retreat();
    store_checkout(&session, &checkout).await?;
    Ok(back_to_checkout())
}

/// Take payment details and place the order.
#[instrument(skip(state, session, fields))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    Form(fields): Form<FormFields>,
) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    let mut checkout = current_checkout(&session, &cart).await?;
    require_step(&checkout, CheckoutStep::Payment, "place an order")?;
    apply_fields(&mut checkout, &fields)?;

    let errors = validation_errors(&checkout);
    if !errors.is_empty() {
        return Ok(render_with_errors(&checkout, errors));
    }

    // An earlier attempt may have stored this order and then failed to
    // write the session; confirm that order instead of placing another.
    let already_stored = match load_pending_order(&session).await {
        Some(number) => state
            .orders()
            .find_by_number(&number)
            .await?
            .filter(|stored| stored.order.lines == checkout.lines()),
        None => None,
    };

    if let Some(stored) = already_stored {
        tracing::info!(order_number = %stored.order.number, "Order already stored, confirming it");
        checkout.confirm_stored(cart.store_mut(), stored.order)?;
    } else {
        let order = checkout.place_order(cart.store_mut(), Utc::now())?.clone();
        store_pending_order(&session, &order.number).await?;

        if let Err(e) = state.orders().insert(&order).await {
            tracing::error!(
                order_number = %order.number,
                error = %e,
                "Failed to store order, cart left untouched"
            );
            return Err(AppError::Database(e));
        }
    }

    cart.save(&session).await?;
    store_checkout(&session, &checkout).await?;
    clear_pending_order(&session).await?;
    if let Some(order) = checkout.placed_order() {
        add_breadcrumb(
            "checkout",
            "Order placed",
            &[("order_number", order.number.as_str())],
        );
    }

    Ok((AppendHeaders([CART_UPDATED_TRIGGER]), back_to_checkout()).into_response())
}
