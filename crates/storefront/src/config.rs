//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `ROCKETSHOES_API_URL` - Catalog and stock service base URL (default: <http://localhost:3333>)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CART_PATH` - File holding the persisted cart (default: data/rocketshoes-cart.json)
//! - `STOREFRONT_CURRENCY` - Display currency code (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use rocketshoes_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_CART_PATH: &str = "data/rocketshoes-cart.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Base URL of the catalog and stock service
    pub api_url: Url,
    /// File the cart snapshot is written to
    pub cart_path: PathBuf,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g., "production")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that can't be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = get_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let api_url = parse_base_url(&get_or_default("ROCKETSHOES_API_URL", DEFAULT_API_URL))?;
        let cart_path = PathBuf::from(get_or_default("STOREFRONT_CART_PATH", DEFAULT_CART_PATH));
        let currency = get_or_default("STOREFRONT_CURRENCY", "USD")
            .parse::<CurrencyCode>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_CURRENCY".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            api_url,
            cart_path,
            currency,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse the service base URL, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), msg);

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    // `Url::join("products")` replaces the last segment unless the path ends in '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:3333/");
        assert_eq!(config.cart_path, PathBuf::from(DEFAULT_CART_PATH));
        assert_eq!(config.currency, CurrencyCode::USD);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = load(&[("STOREFRONT_HOST", "0.0.0.0"), ("STOREFRONT_PORT", "8080")]).unwrap();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STOREFRONT_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_api_url_gets_trailing_slash() {
        let config = load(&[("ROCKETSHOES_API_URL", "https://api.example.test/v1")]).unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.example.test/v1/");
        assert_eq!(
            config.api_url.join("stock").unwrap().as_str(),
            "https://api.example.test/v1/stock"
        );
    }

    #[test]
    fn test_api_url_rejects_other_schemes() {
        assert!(load(&[("ROCKETSHOES_API_URL", "ftp://files.example.test")]).is_err());
        assert!(load(&[("ROCKETSHOES_API_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_currency() {
        let config = load(&[("STOREFRONT_CURRENCY", "brl")]).unwrap();
        assert_eq!(config.currency, CurrencyCode::BRL);
        assert!(load(&[("STOREFRONT_CURRENCY", "doubloons")]).is_err());
    }

    #[test]
    fn test_empty_sentry_dsn_is_ignored() {
        let config = load(&[("SENTRY_DSN", "")]).unwrap();
        assert!(config.sentry_dsn.is_none());
    }
}
