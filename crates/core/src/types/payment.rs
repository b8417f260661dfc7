//! Stored payment methods.

use serde::{Deserialize, Serialize};

use super::id::PaymentMethodId;
use super::status::PaymentType;

/// A payment method saved on the user's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub card_last4: Option<String>,
    #[serde(default)]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub upi_id: Option<String>,
}

impl PaymentMethod {
    /// Short description, e.g. "Credit Card (Visa ****4242)".
    #[must_use]
    pub fn summary(&self) -> String {
        match (&self.card_brand, &self.card_last4, &self.upi_id) {
            (Some(brand), Some(last4), _) => format!("{} ({brand} ****{last4})", self.payment_type),
            (_, _, Some(upi)) => format!("{} ({upi})", self.payment_type),
            _ => self.payment_type.to_string(),
        }
    }
}

/// Payload for `POST /payment-methods/`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewPaymentMethod {
    pub payment_type: PaymentType,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let card = PaymentMethod {
            id: PaymentMethodId::new(1),
            payment_type: PaymentType::CreditCard,
            is_default: true,
            card_last4: Some("4242".to_string()),
            card_brand: Some("Visa".to_string()),
            upi_id: None,
        };
        assert_eq!(card.summary(), "Credit Card (Visa ****4242)");

        let cod = PaymentMethod {
            payment_type: PaymentType::CashOnDelivery,
            card_last4: None,
            card_brand: None,
            ..card
        };
        assert_eq!(cod.summary(), "Cash on Delivery");
    }
}
