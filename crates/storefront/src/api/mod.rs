//! Catalog and stock service client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The service is the source of truth for products and stock - no local sync
//! - The product listing is cached in memory via `moka` (5 minute TTL); single
//!   product and stock lookups always go to the service
//!
//! # Endpoints
//!
//! - `GET /products` - full catalog
//! - `GET /products?id={id}` - catalog entry for one product
//! - `GET /stock?id={id}` - available amount for one product
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(config.api_url.clone());
//! let products = client.products().await?;
//! let stock = client.stock(products[0].id).await?;
//! ```

mod client;

pub use client::ApiClient;

use thiserror::Error;

/// Errors that can occur when talking to the catalog and stock service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            status: 503,
            url: "http://localhost:3333/stock?id=1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 503 from http://localhost:3333/stock?id=1"
        );
    }
}
