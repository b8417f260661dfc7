//! Persisted cart store.
//!
//! [`CartStore`] wraps the pure [`Cart`] model and writes a snapshot to
//! storage after every mutation, under the same lock, so the persisted cart
//! always matches the last completed mutation.
//!
//! Two keys are written: `cart` holds the line items and
//! `selected_restaurant` holds `{"id": <restaurant>}`, or is removed when
//! the cart has no restaurant.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tiffin_core::cart::AddOutcome;
use tiffin_core::{Cart, CartLine, MenuItem, MenuItemId, Price, RestaurantId};
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::storage::{SharedStore, keys};

#[derive(Serialize, Deserialize)]
struct SelectedRestaurant {
    id: RestaurantId,
}

/// The cart, persisted across restarts.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    cart: Mutex<Cart>,
    storage: SharedStore,
}

impl CartStore {
    /// Load the persisted cart from `storage`.
    ///
    /// A missing snapshot yields an empty cart. A snapshot that cannot be
    /// read or parsed is logged and discarded.
    #[must_use]
    pub fn load(storage: SharedStore) -> Self {
        let cart = read_snapshot(&storage);
        tracing::debug!(lines = cart.lines().len(), "Cart loaded");
        Self {
            inner: Arc::new(CartInner {
                cart: Mutex::new(cart),
                storage,
            }),
        }
    }

    /// Add `quantity` of `item`.
    ///
    /// An item from a different restaurant than the cart's replaces the whole
    /// cart. A quantity of zero does nothing.
    #[instrument(skip(self, item, note), fields(menu_item_id = %item.id))]
    pub fn add_item(&self, item: MenuItem, quantity: u32, note: &str) -> AddOutcome {
        let item_id = item.id.to_string();
        let outcome = self.mutate(|cart| cart.add_item(item, quantity, note));

        match outcome {
            AddOutcome::Replaced { previous } => {
                tracing::info!(
                    previous_restaurant = ?previous,
                    "Cart replaced by item from another restaurant"
                );
                add_breadcrumb("cart", "Cart replaced", Some(&[("menu_item", &item_id)]));
            }
            AddOutcome::Appended | AddOutcome::Incremented => {
                add_breadcrumb("cart", "Added item", Some(&[("menu_item", &item_id)]));
            }
            AddOutcome::Ignored => {}
        }
        outcome
    }

    /// Remove the line for `item_id`, if present.
    pub fn remove_item(&self, item_id: MenuItemId) -> bool {
        self.mutate(|cart| cart.remove_item(item_id))
    }

    /// Set a line's quantity. Zero or less removes the line.
    pub fn set_quantity(&self, item_id: MenuItemId, quantity: i64) -> bool {
        self.mutate(|cart| cart.set_quantity(item_id, quantity))
    }

    /// Empty the cart and forget its restaurant.
    pub fn clear(&self) {
        self.mutate(Cart::clear);
    }

    /// Sum of `unit_price × quantity`.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lock().total()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock().item_count()
    }

    /// Whether the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The restaurant the cart is scoped to.
    #[must_use]
    pub fn restaurant(&self) -> Option<RestaurantId> {
        self.lock().restaurant()
    }

    /// A copy of the line items.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().lines().to_vec()
    }

    /// A copy of the whole cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Cart) -> T) -> T {
        let mut cart = self.lock();
        let result = f(&mut cart);
        self.persist(&cart);
        result
    }

    fn persist(&self, cart: &Cart) {
        let storage = &self.inner.storage;

        let lines = match serde_json::to_string(cart.lines()) {
            Ok(json) => storage.set(keys::CART, &json),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if let Err(e) = lines {
            tracing::warn!(error = %e, "Failed to persist cart");
        }

        let restaurant = match cart.restaurant() {
            Some(id) => serde_json::to_string(&SelectedRestaurant { id })
                .map_err(|e| e.to_string())
                .and_then(|json| {
                    storage
                        .set(keys::SELECTED_RESTAURANT, &json)
                        .map_err(|e| e.to_string())
                }),
            None => storage
                .remove(keys::SELECTED_RESTAURANT)
                .map_err(|e| e.to_string()),
        };
        if let Err(e) = restaurant {
            tracing::warn!(error = %e, "Failed to persist selected restaurant");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cart = self.lock();
        f.debug_struct("CartStore")
            .field("lines", &cart.lines().len())
            .field("restaurant", &cart.restaurant())
            .finish()
    }
}

fn read_snapshot(storage: &SharedStore) -> Cart {
    let lines = match storage.get(keys::CART) {
        Ok(Some(json)) => match serde_json::from_str::<Vec<CartLine>>(&json) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt cart snapshot");
                return Cart::new();
            }
        },
        Ok(None) => return Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart snapshot");
            return Cart::new();
        }
    };

    let restaurant = storage
        .get(keys::SELECTED_RESTAURANT)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str::<SelectedRestaurant>(&json).ok())
        .map(|selected| selected.id);

    Cart::from_parts(lines, restaurant)
}
