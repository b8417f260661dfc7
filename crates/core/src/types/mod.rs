//! Core types for Tiffin.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the entities exchanged with the ordering API.

pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod payment;
pub mod price;
pub mod status;
pub mod user;

pub use catalog::{
    CategoryRef, MenuCategory, MenuItem, MenuSection, Page, Restaurant, RestaurantRef,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use payment::{NewPaymentMethod, PaymentMethod};
pub use price::{CurrencyCode, Price};
pub use status::*;
pub use user::UserProfile;
