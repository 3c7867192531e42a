//! The checkout step machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CheckoutError;
use super::form::{CheckoutForm, PaymentDetails};
use super::order::{OrderNumber, OrderTotals, PAYMENT_METHOD, PlacedOrder};
use super::shipping::ShippingMethod;
use crate::cart::{CartLine, CartStore, KeyValueStorage, checked_subtotal};
use crate::types::{CheckoutStep, StepProgress};

/// One shopper's pass through checkout.
///
/// Starts at [`CheckoutStep::Information`] with a snapshot of the cart and
/// the standard shipping option selected. The machine itself never checks
/// form completeness; callers consult [`Checkout::missing_fields`] before
/// advancing if they want to gate on it.
///
/// Serializable so a web session can park it between requests; payment
/// details are not part of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    step: CheckoutStep,
    lines: Vec<CartLine>,
    subtotal: Decimal,
    form: CheckoutForm,
    placed: Option<PlacedOrder>,
}

impl Checkout {
    /// Start a checkout from the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines; no
    /// checkout exists for an empty cart.
    pub fn begin<S: KeyValueStorage>(cart: &CartStore<S>) -> Result<Self, CheckoutError> {
        let lines = cart.get_cart();
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        // get_cart only returns carts whose subtotal is computable.
        let subtotal = checked_subtotal(&lines).unwrap_or_default();
        tracing::debug!(lines = lines.len(), %subtotal, "Checkout started");

        Ok(Self {
            step: CheckoutStep::Information,
            lines,
            subtotal,
            form: CheckoutForm::default(),
            placed: None,
        })
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Cart lines as of entry, or the (empty) cart after placement.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn form(&self) -> &CheckoutForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut CheckoutForm {
        &mut self.form
    }

    /// Set a form field by its flat name.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UnknownField` for an unknown name.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), CheckoutError> {
        self.form.set_field(name, value)
    }

    pub const fn select_shipping(&mut self, method: ShippingMethod) {
        self.form.shipping_method = method;
    }

    /// Required fields still blank on the current step.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.form.missing_fields(self.step)
    }

    /// Current totals.
    ///
    /// Before placement these are recomputed from the entry snapshot and the
    /// selected shipping option; afterwards they are the totals frozen into
    /// the placed order.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        self.placed.as_ref().map_or_else(
            || OrderTotals::compute(self.subtotal, self.form.shipping_method),
            |order| order.totals,
        )
    }

    #[must_use]
    pub fn shipping_cost(&self) -> Decimal {
        self.totals().shipping
    }

    #[must_use]
    pub fn tax_amount(&self) -> Decimal {
        self.totals().tax
    }

    #[must_use]
    pub fn order_total(&self) -> Decimal {
        self.totals().total
    }

    /// Running total for the order summary at the current step.
    #[must_use]
    pub fn displayed_total(&self) -> Decimal {
        self.totals().displayed_total(self.step)
    }

    /// Progress indicator entries for the three form steps.
    #[must_use]
    pub fn progress(&self) -> [(CheckoutStep, StepProgress); 3] {
        CheckoutStep::PROGRESS.map(|step| (step, self.step.progress_of(step)))
    }

    /// The order placed by this checkout, once confirmed.
    #[must_use]
    pub const fn placed_order(&self) -> Option<&PlacedOrder> {
        self.placed.as_ref()
    }

    /// Move to the next step.
    ///
    /// From `Payment` the way forward is [`Checkout::place_order`], so this
    /// returns `PlaceOrderRequired` and stays put. At `Confirmation` it is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::PlaceOrderRequired` at the payment step.
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        match self.step {
            CheckoutStep::Payment => Err(CheckoutError::PlaceOrderRequired),
            CheckoutStep::Confirmation => Ok(self.step),
            step => {
                if let Some(next) = step.next() {
                    self.step = next;
                }
                tracing::debug!(from = ?step, to = ?self.step, "Checkout advanced");
                Ok(self.step)
            }
        }
    }

    /// Go back one step. A no-op at `Information` and `Confirmation`.
    pub fn retreat(&mut self) -> CheckoutStep {
        if let Some(previous) = self.step.previous() {
            tracing::debug!(from = ?self.step, to = ?previous, "Checkout went back");
            self.step = previous;
        }
        self.step
    }

    /// Place the order: snapshot it, clear the cart, and confirm.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` unless at the payment step.
    pub fn place_order<S: KeyValueStorage>(
        &mut self,
        cart: &mut CartStore<S>,
        placed_at: DateTime<Utc>,
    ) -> Result<&PlacedOrder, CheckoutError> {
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::InvalidTransition {
                step: self.step,
                action: "place an order",
            });
        }

        let order = PlacedOrder {
            number: OrderNumber::from_timestamp(placed_at),
            placed_at,
            email: self.form.email.trim().to_string(),
            phone: non_blank(&self.form.phone),
            shipping_address: self.form.shipping_address(),
            shipping_method: self.form.shipping_method,
            lines: self.lines.clone(),
            totals: OrderTotals::compute(self.subtotal, self.form.shipping_method),
            notes: non_blank(&self.form.order_notes),
            payment_method: PAYMENT_METHOD.to_string(),
            card_last_four: self.form.payment.last_four(),
        };
        tracing::info!(
            order_number = %order.number,
            total = %order.totals.total,
            items = order.item_count(),
            "Order placed"
        );

        Ok(self.confirm(cart, order))
    }

    /// Confirm with an order that was already stored by an earlier attempt,
    /// without building a new one.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` unless at the payment step.
    pub fn confirm_stored<S: KeyValueStorage>(
        &mut self,
        cart: &mut CartStore<S>,
        order: PlacedOrder,
    ) -> Result<&PlacedOrder, CheckoutError> {
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::InvalidTransition {
                step: self.step,
                action: "confirm a stored order",
            });
        }
        tracing::info!(order_number = %order.number, "Stored order confirmed");
        Ok(self.confirm(cart, order))
    }

    fn confirm<S: KeyValueStorage>(
        &mut self,
        cart: &mut CartStore<S>,
        order: PlacedOrder,
    ) -> &PlacedOrder {
        self.step = CheckoutStep::Confirmation;
        cart.clear_cart();
        self.lines = cart.get_cart();
        self.subtotal = cart.get_cart_total();
        self.form.payment = PaymentDetails::default();

        self.placed.insert(order)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
