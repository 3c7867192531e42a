//! Data collected across the checkout steps.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::error::CheckoutError;
use super::order::ShippingAddress;
use super::shipping::ShippingMethod;
use crate::types::CheckoutStep;

/// Fields the shopper fills in during checkout.
///
/// Addressable by the flat camelCase names used by the checkout forms
/// (`firstName`, `postalCode`, `shippingMethod`, ...) through
/// [`CheckoutForm::set_field`].
///
/// Payment details are held separately in [`PaymentDetails`] and never
/// serialized, so a checkout parked in a session or on disk carries no card
/// data.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    // Contact
    pub email: String,
    pub phone: String,

    // Shipping address
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub country: String,
    pub province: String,
    pub postal_code: String,

    pub shipping_method: ShippingMethod,

    #[serde(skip)]
    pub payment: PaymentDetails,

    pub save_information: bool,
    pub order_notes: String,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            phone: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            apartment: String::new(),
            city: String::new(),
            country: "Canada".to_string(),
            province: String::new(),
            postal_code: String::new(),
            shipping_method: ShippingMethod::default(),
            payment: PaymentDetails::default(),
            save_information: true,
            order_notes: String::new(),
        }
    }
}

impl fmt::Debug for CheckoutForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutForm")
            .field("email", &self.email)
            .field("city", &self.city)
            .field("province", &self.province)
            .field("country", &self.country)
            .field("shipping_method", &self.shipping_method)
            .field("payment", &self.payment)
            .finish_non_exhaustive()
    }
}

/// Card fields from the payment step.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PaymentDetails {
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl PaymentDetails {
    /// Last four digits of the card number, ignoring spaces and dashes.
    #[must_use]
    pub fn last_four(&self) -> Option<String> {
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let start = digits.len().checked_sub(4)?;
        digits.get(start..).map(|tail| tail.iter().collect())
    }
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_number", &"[REDACTED]")
            .field("card_name", &self.card_name)
            .field("expiry_date", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

impl CheckoutForm {
    /// Set one field by its flat form name.
    ///
    /// `shippingMethod` falls back to standard for unknown IDs;
    /// `saveInformation` is true for `true`, `on` or `1`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UnknownField` for a name the form lacks.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), CheckoutError> {
        let slot = match name {
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "firstName" => &mut self.first_name,
            "lastName" => &mut self.last_name,
            "address" => &mut self.address,
            "apartment" => &mut self.apartment,
            "city" => &mut self.city,
            "country" => &mut self.country,
            "province" => &mut self.province,
            "postalCode" => &mut self.postal_code,
            "cardNumber" => &mut self.payment.card_number,
            "cardName" => &mut self.payment.card_name,
            "expiryDate" => &mut self.payment.expiry_date,
            "cvv" => &mut self.payment.cvv,
            "orderNotes" => &mut self.order_notes,
            "shippingMethod" => {
                self.shipping_method = ShippingMethod::from_id_or_default(value);
                return Ok(());
            }
            "saveInformation" => {
                self.save_information = matches!(value.trim(), "true" | "on" | "1");
                return Ok(());
            }
            other => return Err(CheckoutError::UnknownField(other.to_string())),
        };
        value.clone_into(slot);
        Ok(())
    }

    /// Names of required fields still blank for `step`.
    ///
    /// Information needs the contact email and a full address; Payment
    /// needs every card field. Other steps require nothing.
    #[must_use]
    pub fn missing_fields(&self, step: CheckoutStep) -> Vec<&'static str> {
        let required: Vec<(&'static str, &str)> = match step {
            CheckoutStep::Information => vec![
                ("email", self.email.as_str()),
                ("firstName", self.first_name.as_str()),
                ("lastName", self.last_name.as_str()),
                ("address", self.address.as_str()),
                ("city", self.city.as_str()),
                ("province", self.province.as_str()),
                ("postalCode", self.postal_code.as_str()),
            ],
            CheckoutStep::Payment => vec![
                ("cardNumber", self.payment.card_number.as_str()),
                ("cardName", self.payment.card_name.as_str()),
                ("expiryDate", self.payment.expiry_date.as_str()),
                ("cvv", self.payment.cvv.as_str()),
            ],
            CheckoutStep::Shipping | CheckoutStep::Confirmation => Vec::new(),
        };

        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// The delivery address as entered.
    #[must_use]
    pub fn shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            address: self.address.trim().to_string(),
            apartment: Some(self.apartment.trim())
                .filter(|apt| !apt.is_empty())
                .map(str::to_string),
            city: self.city.trim().to_string(),
            province: self.province.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let form = CheckoutForm::default();
        assert_eq!(form.country, "Canada");
        assert_eq!(form.shipping_method, ShippingMethod::Standard);
        assert!(form.save_information);
    }

    #[test]
    fn test_set_field_by_flat_name() {
        let mut form = CheckoutForm::default();
        form.set_field("firstName", "Priya").unwrap();
        form.set_field("postalCode", "M5V 2T6").unwrap();
        form.set_field("shippingMethod", "overnight").unwrap();
        form.set_field("saveInformation", "off").unwrap();

        assert_eq!(form.first_name, "Priya");
        assert_eq!(form.postal_code, "M5V 2T6");
        assert_eq!(form.shipping_method, ShippingMethod::Overnight);
        assert!(!form.save_information);
    }

    #[test]
    fn test_set_unknown_field() {
        let mut form = CheckoutForm::default();
        assert_eq!(
            form.set_field("favouriteSpice", "saffron"),
            Err(CheckoutError::UnknownField("favouriteSpice".to_string()))
        );
    }

    #[test]
    fn test_unknown_shipping_method_falls_back() {
        let mut form = CheckoutForm::default();
        form.set_field("shippingMethod", "express").unwrap();
        form.set_field("shippingMethod", "drone").unwrap();
        assert_eq!(form.shipping_method, ShippingMethod::Standard);
    }

    #[test]
    fn test_missing_fields_per_step() {
        let mut form = CheckoutForm::default();
        assert_eq!(form.missing_fields(CheckoutStep::Information).len(), 7);
        assert!(form.missing_fields(CheckoutStep::Shipping).is_empty());

        for (name, value) in [
            ("email", "a@b.ca"),
            ("firstName", "A"),
            ("lastName", "B"),
            ("address", "1 Main St"),
            ("city", "Toronto"),
            ("province", "ON"),
        ] {
            form.set_field(name, value).unwrap();
        }
        assert_eq!(form.missing_fields(CheckoutStep::Information), vec!["postalCode"]);
        assert_eq!(form.missing_fields(CheckoutStep::Payment).len(), 4);
    }

    #[test]
    fn test_payment_never_serialized() {
        let mut form = CheckoutForm::default();
        form.set_field("cardNumber", "4111 1111 1111 1234").unwrap();
        form.set_field("cvv", "987").unwrap();

        let json = serde_json::to_string(&form).unwrap();
        assert!(!json.contains("4111"));
        assert!(!json.contains("987"));

        let debug = format!("{form:?}");
        assert!(!debug.contains("4111"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_last_four() {
        let mut payment = PaymentDetails::default();
        assert_eq!(payment.last_four(), None);
        payment.card_number = "4111-1111-1111-1234".to_string();
        assert_eq!(payment.last_four().as_deref(), Some("1234"));
    }

    #[test]
    fn test_shipping_address_drops_blank_apartment() {
        let mut form = CheckoutForm::default();
        form.set_field("address", " 12 Spice Rd ").unwrap();
        form.set_field("apartment", "  ").unwrap();
        let address = form.shipping_address();
        assert_eq!(address.address, "12 Spice Rd");
        assert_eq!(address.apartment, None);
    }
}
