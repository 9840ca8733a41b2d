//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cart::CartStore;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It owns the one cart store of
/// the process; every view goes through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    cart: CartStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `api` - Catalog and stock client used for the product listing
    /// * `cart` - The cart store, already opened
    #[must_use]
    pub fn new(config: StorefrontConfig, api: ApiClient, cart: CartStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, api, cart }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog and stock client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }
}
