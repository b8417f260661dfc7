//! Cache types for catalog responses.

use tiffin_core::{MenuCategory, MenuItem, MenuSection, Restaurant, RestaurantId};

use crate::api::{CategoryQuery, MenuItemQuery, RestaurantQuery};

/// Cache key for restaurants, menus and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) enum CacheKey {
    Restaurants(RestaurantQuery),
    Restaurant(RestaurantId),
    Menu(RestaurantId),
    MenuItems(MenuItemQuery),
    MenuItem(tiffin_core::MenuItemId),
    Categories(CategoryQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub(crate) enum CacheValue {
    Restaurants(Vec<Restaurant>),
    Restaurant(Box<Restaurant>),
    Menu(Vec<MenuSection>),
    MenuItems(Vec<MenuItem>),
    MenuItem(Box<MenuItem>),
    Categories(Vec<MenuCategory>),
}
