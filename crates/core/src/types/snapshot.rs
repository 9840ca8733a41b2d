//! Versioned on-disk format of a persisted cart.
//!
//! ```json
//! { "version": 1, "items": [ { "id": 1, "title": "...", "price": "179.9", "image": "...", "amount": 2 } ] }
//! ```
//!
//! Prices are written as decimal strings so a reload is exact. The version is
//! checked before the body is parsed, so a snapshot written by a future format
//! reports [`SnapshotError::UnsupportedVersion`] rather than a parse error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Cart, CartItem, CartStateError, ProductId};

/// Errors reading or validating a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported cart snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("cart snapshot lists product {0} more than once")]
    DuplicateItem(ProductId),

    #[error("cart snapshot has a negative price for product {0}")]
    NegativePrice(ProductId),
}

/// The full cart as written to the persistent slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub version: u32,
    pub items: Vec<CartItem>,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl CartSnapshot {
    pub const CURRENT_VERSION: u32 = 1;

    /// Capture the whole cart.
    #[must_use]
    pub fn capture(cart: &Cart) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            items: cart.items().to_vec(),
        }
    }

    /// Serialize for the persistent slot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot, checking the version first.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the version is not
    /// [`Self::CURRENT_VERSION`].
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let header: VersionHeader = serde_json::from_str(json)?;
        if header.version != Self::CURRENT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: header.version,
                expected: Self::CURRENT_VERSION,
            });
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and turn the snapshot back into a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a product appears twice or has a negative price.
    pub fn into_cart(self) -> Result<Cart, SnapshotError> {
        if let Some(item) = self.items.iter().find(|item| item.price < Decimal::ZERO) {
            return Err(SnapshotError::NegativePrice(item.id));
        }
        // `Cart::try_from` only ever reports duplicates.
        Cart::try_from(self.items).map_err(|err| match err {
            CartStateError::NegativePrice(id) => SnapshotError::NegativePrice(id),
            CartStateError::DuplicateItem(id) | CartStateError::ItemNotInCart(id) => {
                SnapshotError::DuplicateItem(id)
            }
        })
    }
}
