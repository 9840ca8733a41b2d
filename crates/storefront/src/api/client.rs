//! HTTP client for the catalog and stock service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rocketshoes_core::{Product, ProductId, StockRecord};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::ApiError;
use crate::cart::{Catalog, StockLedger};

const PRODUCTS_CACHE_KEY: &str = "products";

/// Client for the catalog and stock service.
///
/// Cheap to clone; clones share the connection pool and the listing cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, Arc<Vec<Product>>>,
}

impl ApiClient {
    /// Create a new client. `base_url` must end with a `/`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                cache,
            }),
        }
    }

    /// Build `{base}/{path}` with an optional `id` filter.
    fn endpoint(&self, path: &str, id: Option<ProductId>) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.join(path)?;
        if let Some(id) = id {
            url.query_pairs_mut().append_pair("id", &id.to_string());
        }
        Ok(url)
    }

    /// GET a JSON document.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url.clone()).send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                body = %body.chars().take(200).collect::<String>(),
                "Catalog service returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog service response"
            );
            ApiError::Parse(e)
        })
    }

    /// The full catalog, cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body isn't a product list.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(products) = self.inner.cache.get(PRODUCTS_CACHE_KEY).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> =
            Arc::new(self.get_json(self.endpoint("products", None)?).await?);

        self.inner
            .cache
            .insert(PRODUCTS_CACHE_KEY.to_string(), Arc::clone(&products))
            .await;

        Ok(products)
    }

    /// One catalog entry, or `None` if the catalog doesn't know the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let matches: Vec<Product> = self.get_json(self.endpoint("products", Some(id))?).await?;
        Ok(matches.into_iter().find(|product| product.id == id))
    }

    /// Current stock for one product. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn stock(&self, id: ProductId) -> Result<Option<StockRecord>, ApiError> {
        let matches: Vec<StockRecord> = self.get_json(self.endpoint("stock", Some(id))?).await?;
        Ok(matches.into_iter().find(|record| record.id == id))
    }

    /// Uncached round trip used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog can't be fetched.
    pub async fn check(&self) -> Result<(), ApiError> {
        self.get_json::<Vec<Product>>(self.endpoint("products", None)?)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Catalog for ApiClient {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        Self::product(self, id).await
    }
}

#[async_trait]
impl StockLedger for ApiClient {
    async fn stock(&self, id: ProductId) -> Result<Option<StockRecord>, ApiError> {
        Self::stock(self, id).await
    }
}
