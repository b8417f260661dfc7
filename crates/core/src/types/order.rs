//! Order entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MenuItemId, OrderId, OrderItemId, PaymentMethodId, RestaurantId, UserId};
use super::price::Price;
use super::status::{Country, OrderStatus};

/// A placed order as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user: Option<UserId>,
    pub restaurant: RestaurantId,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub country: Country,
    pub total_amount: Price,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub payment_method: Option<PaymentMethodId>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub menu_item: MenuItemId,
    #[serde(default)]
    pub menu_item_name: Option<String>,
    pub quantity: u32,
    /// Unit price charged at order time.
    pub price: Price,
    #[serde(default)]
    pub subtotal: Option<Price>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl OrderItem {
    /// Line total, preferring the server-computed subtotal.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.subtotal.unwrap_or_else(|| self.price.times(self.quantity))
    }
}

/// Payload for `POST /orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub restaurant: RestaurantId,
    pub country: Country,
    pub delivery_address: String,
    pub payment_method: PaymentMethodId,
    pub special_instructions: String,
    pub items: Vec<NewOrderItem>,
}

/// One line of a [`NewOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub menu_item: MenuItemId,
    pub quantity: u32,
    pub special_instructions: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_api_shape() {
        let json = r#"{
            "id": 31,
            "user": 2,
            "user_name": "asha",
            "restaurant": 1,
            "restaurant_name": "Saravana",
            "status": "OUT_FOR_DELIVERY",
            "status_display": "Out for Delivery",
            "country": "INDIA",
            "total_amount": "25.00",
            "delivery_address": "12 MG Road",
            "payment_method": 4,
            "special_instructions": "",
            "created_at": "2025-03-01T10:15:00.123456Z",
            "updated_at": "2025-03-01T10:20:00Z",
            "items": [
                {"id": 1, "menu_item": 7, "menu_item_name": "Dosa", "menu_item_price": "10.00",
                 "quantity": 2, "price": "10.00", "subtotal": "20.00", "special_instructions": null},
                {"id": 2, "menu_item": 8, "quantity": 1, "price": "5.00"}
            ]
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.items[1].line_total(), Price::from_minor_units(500));
        assert!(order.created_at.is_some());
    }
}
