//! Restaurant-scoped cart model.
//!
//! A [`Cart`] holds line items from at most one restaurant. Adding an item
//! from another restaurant discards the existing lines and starts over with
//! just the new item. Lines are keyed by menu item id, so adding the same
//! item twice increments the quantity of the existing line.
//!
//! This type is pure state: persistence lives in the client crate's
//! `CartStore`, which wraps a `Cart` and snapshots it after every mutation.

use serde::{Deserialize, Serialize};

use crate::types::{MenuItem, MenuItemId, NewOrderItem, Price, RestaurantId};

/// One menu item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_item: MenuItem,
    /// Always at least 1 while the line is in a cart.
    pub quantity: u32,
    #[serde(default)]
    pub special_instructions: String,
    /// Price captured when the item was first added.
    pub unit_price: Price,
    /// Restaurant resolved when the item was added; `None` if unresolved.
    pub restaurant_id: Option<RestaurantId>,
}

impl CartLine {
    fn new(menu_item: MenuItem, quantity: u32, note: &str) -> Self {
        Self {
            restaurant_id: menu_item.restaurant_id(),
            unit_price: menu_item.price,
            menu_item,
            quantity,
            special_instructions: note.to_string(),
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// What [`Cart::add_item`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended.
    Appended,
    /// An existing line's quantity was increased.
    Incremented,
    /// The cart held another restaurant's items and was replaced.
    Replaced {
        /// Restaurant of the discarded lines.
        previous: Option<RestaurantId>,
    },
    /// Quantity was zero; nothing changed.
    Ignored,
}

/// The in-progress order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    restaurant: Option<RestaurantId>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            restaurant: None,
        }
    }

    /// Rebuild a cart from a persisted snapshot.
    ///
    /// Lines with a zero quantity are dropped. When lines are present, the
    /// restaurant marker follows the first line unless that line is
    /// unresolved.
    #[must_use]
    pub fn from_parts(lines: Vec<CartLine>, restaurant: Option<RestaurantId>) -> Self {
        let lines: Vec<CartLine> = lines.into_iter().filter(|line| line.quantity > 0).collect();
        let restaurant = match lines.first() {
            Some(first) => first.restaurant_id.or(restaurant),
            None => None,
        };
        Self { lines, restaurant }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The restaurant the cart is currently scoped to.
    #[must_use]
    pub const fn restaurant(&self) -> Option<RestaurantId> {
        self.restaurant
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line for a menu item.
    #[must_use]
    pub fn line(&self, item_id: MenuItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.menu_item.id == item_id)
    }

    /// Add `quantity` of `item` with an optional note.
    ///
    /// If the cart is non-empty and `item` belongs to a different restaurant
    /// (or either side is unresolved), the cart is replaced by a single line
    /// for `item`. Otherwise an existing line for the same item has its
    /// quantity increased, and its note overwritten only when `note` is
    /// non-empty; a missing line is appended.
    pub fn add_item(&mut self, item: MenuItem, quantity: u32, note: &str) -> AddOutcome {
        if quantity == 0 {
            return AddOutcome::Ignored;
        }

        let incoming = item.restaurant_id();

        if let Some(first) = self.lines.first()
            && !same_restaurant(first.restaurant_id, incoming)
        {
            let previous = first.restaurant_id;
            self.lines = vec![CartLine::new(item, quantity, note)];
            self.restaurant = incoming;
            return AddOutcome::Replaced { previous };
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.menu_item.id == item.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            if !note.is_empty() {
                note.clone_into(&mut line.special_instructions);
            }
            return AddOutcome::Incremented;
        }

        if self.lines.is_empty() {
            self.restaurant = incoming;
        }
        self.lines.push(CartLine::new(item, quantity, note));
        AddOutcome::Appended
    }

    /// Remove the line for `item_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, item_id: MenuItemId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.menu_item.id != item_id);
        if self.lines.is_empty() {
            self.restaurant = None;
        }
        self.lines.len() != before
    }

    /// Overwrite the quantity of a line. `quantity <= 0` removes it.
    ///
    /// Returns whether a matching line existed.
    pub fn set_quantity(&mut self, item_id: MenuItemId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(item_id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.lines.iter_mut().find(|line| line.menu_item.id == item_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove every line and forget the restaurant.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.restaurant = None;
    }

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Order payload lines for checkout.
    #[must_use]
    pub fn order_items(&self) -> Vec<NewOrderItem> {
        self.lines
            .iter()
            .map(|line| NewOrderItem {
                menu_item: line.menu_item.id,
                quantity: line.quantity,
                special_instructions: line.special_instructions.clone(),
            })
            .collect()
    }
}

/// Unresolved restaurants never match anything, including each other.
fn same_restaurant(current: Option<RestaurantId>, incoming: Option<RestaurantId>) -> bool {
    matches!((current, incoming), (Some(a), Some(b)) if a == b)
}
