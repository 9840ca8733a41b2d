//! Rocket Shoes Core - Shared types library.
//!
//! This crate provides the domain types used by the storefront and its tests:
//! products and stock records as served by the catalog, cart items, the cart
//! itself and the versioned snapshot the cart is persisted as.
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! HTTP clients, no storage. Every cart transition returns a new [`Cart`] and
//! leaves the original untouched, so callers can persist first and commit
//! afterwards.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, catalog entries, the cart and its snapshot format

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
