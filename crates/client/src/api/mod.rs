//! Typed operations over the ordering API's REST resources.
//!
//! Each submodule adds an `impl ApiGateway` block for one resource:
//!
//! - `restaurants` - restaurant listing, detail and menu
//! - `menu` - menu items and categories
//! - `orders` - placing, listing and cancelling orders
//! - `payments` - the user's stored payment methods
//! - `users` - registration and the current profile
//!
//! Restaurant, menu and category reads go through the gateway's catalog
//! cache. Orders, payment methods and the profile are always fetched live.

mod menu;
mod orders;
mod payments;
mod restaurants;
mod users;

use tiffin_core::{CategoryId, Country, OrderStatus, RestaurantId};

/// Filters for `GET /restaurants/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RestaurantQuery {
    /// Free-text search over name and description.
    pub search: Option<String>,
    pub country: Option<Country>,
    pub is_active: Option<bool>,
}

impl RestaurantQuery {
    /// Search restaurants by name or description.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "search", self.search.as_deref());
        if let Some(country) = self.country {
            pairs.push(("country", country.as_str().to_string()));
        }
        if let Some(active) = self.is_active {
            pairs.push(("is_active", active.to_string()));
        }
        pairs
    }
}

/// Filters for `GET /menu-items/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MenuItemQuery {
    pub category: Option<CategoryId>,
    /// Free-text search over name and description.
    pub search: Option<String>,
    pub is_available: Option<bool>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
}

impl MenuItemQuery {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        push_text(&mut pairs, "search", self.search.as_deref());
        for (key, flag) in [
            ("is_available", self.is_available),
            ("is_vegetarian", self.is_vegetarian),
            ("is_vegan", self.is_vegan),
            ("is_gluten_free", self.is_gluten_free),
        ] {
            if let Some(flag) = flag {
                pairs.push((key, flag.to_string()));
            }
        }
        pairs
    }
}

/// Filters for `GET /categories/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CategoryQuery {
    pub restaurant: Option<RestaurantId>,
}

impl CategoryQuery {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        self.restaurant
            .map(|restaurant| vec![("restaurant", restaurant.to_string())])
            .unwrap_or_default()
    }
}

/// Filters for `GET /orders/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub restaurant: Option<RestaurantId>,
    pub country: Option<Country>,
}

impl OrderQuery {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(restaurant) = self.restaurant {
            pairs.push(("restaurant", restaurant.to_string()));
        }
        if let Some(country) = self.country {
            pairs.push(("country", country.as_str().to_string()));
        }
        pairs
    }
}

/// `{"status": "..."}` acknowledgement returned by action endpoints.
#[derive(Debug, serde::Deserialize)]
struct StatusMessage {
    status: String,
}

fn push_text(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        pairs.push((key, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_search_is_omitted() {
        assert!(RestaurantQuery::search("   ").pairs().is_empty());
        assert_eq!(
            RestaurantQuery::search(" dosa ").pairs(),
            vec![("search", "dosa".to_string())]
        );
    }

    #[test]
    fn test_menu_item_query_pairs() {
        let query = MenuItemQuery {
            category: Some(CategoryId::new(3)),
            is_vegan: Some(true),
            ..MenuItemQuery::default()
        };
        assert_eq!(
            query.pairs(),
            vec![
                ("category", "3".to_string()),
                ("is_vegan", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_order_query_uses_wire_status() {
        let query = OrderQuery {
            status: Some(OrderStatus::OutForDelivery),
            ..OrderQuery::default()
        };
        assert_eq!(query.pairs(), vec![("status", "OUT_FOR_DELIVERY".to_string())]);
    }
}
