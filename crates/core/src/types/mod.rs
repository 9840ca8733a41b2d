//! Core types for Rocket Shoes.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod snapshot;

pub use cart::{Cart, CartItem, CartStateError};
pub use id::*;
pub use price::{CurrencyCode, Price, UnknownCurrency};
pub use product::{Product, StockRecord};
pub use snapshot::{CartSnapshot, SnapshotError};
