//! Remote lookups the cart store depends on.

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, StockRecord};

use crate::api::ApiError;

/// Source of product metadata.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up one product. `Ok(None)` means the catalog has no such product.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, ApiError>;
}

/// Source of per-product availability.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Current stock for one product. Implementations must not cache.
    async fn stock(&self, id: ProductId) -> Result<Option<StockRecord>, ApiError>;
}
