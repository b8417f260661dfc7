//! Tiffin client library.
//!
//! Everything a front end needs to talk to the ordering API:
//!
//! - [`ApiGateway`] - HTTP client with bearer auth and one-shot token refresh
//! - [`SessionStore`] - login, registration, restore and logout
//! - [`CartStore`] - the restaurant-scoped cart, persisted across restarts
//! - [`checkout`] - validating the cart and placing the order
//! - [`TiffinClient`] - all of the above wired to one storage backend
//!
//! # Example
//!
//! ```rust,ignore
//! let client = TiffinClient::open(ClientConfig::from_env()?)?;
//! client.session().restore().await;
//!
//! let menu = client.api().get_restaurant_menu(RestaurantId::new(1)).await?;
//! client.cart().add_item(menu[0].items[0].clone(), 2, "");
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod storage;
pub mod validation;

pub use api::{CategoryQuery, MenuItemQuery, OrderQuery, RestaurantQuery};
pub use cart::CartStore;
pub use checkout::{CheckoutRequest, default_payment_method, place_order};
pub use client::TiffinClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use gateway::{ApiGateway, TokenPair};
pub use session::{AuthStatus, SessionHandle, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SharedStore, StorageError};
pub use validation::{FieldErrors, Registration};
