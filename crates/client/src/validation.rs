//! Input validation performed before any network call.
//!
//! Failures are collected per field so a front end can show every problem
//! next to its input at once. The API's own 400 responses use the same
//! `{"field": ["message", ...]}` shape and are parsed into [`FieldErrors`]
//! as well.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tiffin_core::{Country, Email, NewPaymentMethod};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Field name used for errors that do not belong to a single input.
pub const GENERAL_FIELD: &str = "general";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// An empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Whether no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Iterate over `(field, messages)` in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field has an error.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Parse an API error body of the form `{"field": ["msg"]}` or `{"field": "msg"}`.
    ///
    /// Returns `None` if the body is not a JSON object of that shape.
    #[must_use]
    pub fn from_api_body(body: &serde_json::Value) -> Option<Self> {
        let object = body.as_object()?;
        let mut errors = Self::new();

        for (field, value) in object {
            let field = if field == "non_field_errors" {
                GENERAL_FIELD
            } else {
                field.as_str()
            };
            match value {
                serde_json::Value::String(message) => errors.add(field, message.clone()),
                serde_json::Value::Array(messages) => {
                    for message in messages {
                        errors.add(field, message.as_str()?);
                    }
                }
                _ => return None,
            }
        }

        (!errors.is_empty()).then_some(errors)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

/// New account details submitted to `/users/register/`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    /// Confirmation; must equal `password`.
    pub password2: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub country: Option<Country>,
    pub phone: String,
}

#[derive(Serialize)]
struct RegistrationBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    password2: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<Country>,
    phone: &'a str,
}

impl Registration {
    /// Check the form the way the API would, without a round trip.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.username.trim().is_empty() {
            errors.add("username", "Username is required");
        }

        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if Email::parse(self.email.trim()).is_err() {
            errors.add("email", "Email is invalid");
        }

        let password = self.password.expose_secret();
        if password.is_empty() {
            errors.add("password", "Password is required");
        } else if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        let confirmation = self.password2.expose_secret();
        if confirmation.is_empty() {
            errors.add("password2", "Please confirm your password");
        } else if confirmation != password {
            errors.add("password2", "Passwords do not match");
        }

        errors.into_result()
    }

    /// JSON request body, exposing the secrets only here.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        let body = RegistrationBody {
            username: self.username.trim(),
            email: self.email.trim(),
            password: self.password.expose_secret(),
            password2: self.password2.expose_secret(),
            first_name: &self.first_name,
            last_name: &self.last_name,
            country: self.country,
            phone: &self.phone,
        };
        serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
    }
}

/// Check a new payment method's type-specific fields.
///
/// # Errors
///
/// Card types need a four-digit `card_last4` and a `card_brand`; UPI needs an `upi_id`.
pub fn validate_payment_method(method: &NewPaymentMethod) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if method.payment_type.is_card() {
        match method.card_last4.as_deref().map(str::trim) {
            None | Some("") => errors.add("card_last4", "Card last 4 digits are required"),
            Some(last4) if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) => {
                errors.add("card_last4", "Enter exactly the last 4 digits of the card");
            }
            Some(_) => {}
        }
        if method.card_brand.as_deref().is_none_or(|brand| brand.trim().is_empty()) {
            errors.add("card_brand", "Card brand is required");
        }
    } else if method.payment_type == tiffin_core::PaymentType::Upi
        && method.upi_id.as_deref().is_none_or(|upi| upi.trim().is_empty())
    {
        errors.add("upi_id", "UPI ID is required");
    }

    errors.into_result()
}
