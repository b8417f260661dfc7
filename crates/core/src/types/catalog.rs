//! Restaurant and menu entities.
//!
//! Menu items reach the client in two shapes: list endpoints carry the
//! category as a bare id, detail endpoints nest the whole category. The
//! owning restaurant is resolved through [`MenuItem::restaurant_id`] only.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, MenuItemId, RestaurantId};
use super::price::Price;
use super::status::Country;

/// A list response that is either paginated (`{"results": [...]}`) or a bare array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Page<T> {
    /// Paginated envelope.
    Paginated {
        /// Total number of records across all pages.
        #[serde(default)]
        count: Option<u64>,
        /// URL of the next page, if any.
        #[serde(default)]
        next: Option<String>,
        /// Records on this page.
        results: Vec<T>,
    },
    /// Plain array.
    List(Vec<T>),
}

impl<T> Page<T> {
    /// The records on this page, regardless of envelope.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paginated { results, .. } => results,
            Self::List(items) => items,
        }
    }
}

/// A restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub country: Country,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A menu category belonging to one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub restaurant: RestaurantId,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: u32,
}

/// Reference from a menu item to its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    /// Category id only (list serializers).
    Id(CategoryId),
    /// Full category, including its restaurant (detail serializers).
    Nested(Box<MenuCategory>),
}

impl CategoryRef {
    /// The referenced category id.
    #[must_use]
    pub fn id(&self) -> CategoryId {
        match self {
            Self::Id(id) => *id,
            Self::Nested(category) => category.id,
        }
    }

    /// The owning restaurant, available only for nested categories.
    #[must_use]
    pub fn restaurant_id(&self) -> Option<RestaurantId> {
        match self {
            Self::Id(_) => None,
            Self::Nested(category) => Some(category.restaurant),
        }
    }
}

/// Direct restaurant reference carried on a menu item.
///
/// Accepts an integer, a numeric string, or an object with an `id`. Strings
/// resolve to their leading integer, so `" 12"` and `"12.0"` both mean 12.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RestaurantRef {
    Id(RestaurantId),
    Text(String),
    Object { id: RestaurantId },
}

impl RestaurantRef {
    /// The referenced restaurant, or `None` when the reference is not numeric.
    #[must_use]
    pub fn id(&self) -> Option<RestaurantId> {
        match self {
            Self::Id(id) | Self::Object { id } => Some(*id),
            Self::Text(text) => leading_integer(text).map(RestaurantId::new),
        }
    }
}

/// Integer prefix of `text` after leading whitespace, with an optional sign.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits_len = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let end = text.len() - unsigned.len() + digits_len;
    text.get(..end)?.parse().ok()
}

impl From<RestaurantId> for RestaurantRef {
    fn from(id: RestaurantId) -> Self {
        Self::Id(id)
    }
}

/// An orderable dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// Preparation time in minutes.
    #[serde(default)]
    pub preparation_time: Option<u32>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant: Option<RestaurantRef>,
    /// Image URL.
    #[serde(default)]
    pub image: Option<String>,
}

impl MenuItem {
    /// Resolve the restaurant this item belongs to.
    ///
    /// Prefers the nested category's restaurant, then the direct `restaurant`
    /// reference. Returns `None` when neither yields an integer id.
    #[must_use]
    pub fn restaurant_id(&self) -> Option<RestaurantId> {
        self.category
            .as_ref()
            .and_then(CategoryRef::restaurant_id)
            .or_else(|| self.restaurant.as_ref().and_then(RestaurantRef::id))
    }

    /// Attach a direct restaurant reference if none is present.
    ///
    /// Menu endpoints return items with a bare category id; the caller knows
    /// the restaurant from the URL and stamps it on.
    #[must_use]
    pub fn with_restaurant(mut self, restaurant: RestaurantId) -> Self {
        if self.restaurant_id().is_none() {
            self.restaurant = Some(RestaurantRef::Id(restaurant));
        }
        self
    }
}

/// One category of a restaurant menu with its available items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    pub category: MenuCategory,
    pub items: Vec<MenuItem>,
}

const fn default_true() -> bool {
    true
}
