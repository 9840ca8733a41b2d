//! Catalog and stock records as served by the product API.

use core::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// A catalog entry.
///
/// The catalog serves prices as JSON numbers (`179.9`), so the price goes
/// through the float adapter on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Absolute image URL.
    pub image: String,
}

/// Units of a product currently available for sale.
///
/// Read-only from the storefront's point of view and always fetched fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ProductId,
    #[serde(alias = "availableAmount")]
    pub amount: u32,
}

impl StockRecord {
    /// Whether `requested` units can be put in a cart.
    #[must_use]
    pub const fn covers(&self, requested: NonZeroU32) -> bool {
        requested.get() <= self.amount
    }
}
