//! Cart store error type.

use rocketshoes_core::{CartStateError, ProductId, SnapshotError};
use thiserror::Error;

use super::StorageError;
use crate::api::ApiError;

/// Why a cart operation was rejected.
///
/// These never reach views directly: the store logs them and hands out a
/// [`Notification`](super::Notification) instead.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product {0} not found in catalog")]
    ProductNotFound(ProductId),

    #[error("product {0} is not in the cart")]
    ItemNotInCart(ProductId),

    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),

    #[error("product {0} has a negative price in the catalog")]
    NegativePrice(ProductId),

    #[error("requested {requested} of product {id}, only {available} in stock")]
    StockExceeded {
        id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("no stock record for product {0}")]
    StockUnknown(ProductId),

    #[error("amount must be at least 1")]
    ZeroAmount,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(#[from] ApiError),

    #[error("cart snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CartStateError> for CartError {
    fn from(err: CartStateError) -> Self {
        match err {
            CartStateError::DuplicateItem(id) => Self::DuplicateItem(id),
            CartStateError::ItemNotInCart(id) => Self::ItemNotInCart(id),
            CartStateError::NegativePrice(id) => Self::NegativePrice(id),
        }
    }
}
