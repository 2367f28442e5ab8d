//! Application state shared across handlers.

use std::sync::Arc;

use crate::bigcommerce::{BigCommerceClient, BigCommerceError};
use crate::config::StorefrontConfig;
use crate::middleware::FixedWindowLimiter;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// BigCommerce client, the rate limiter and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    bigcommerce: BigCommerceClient,
    rate_limiter: FixedWindowLimiter,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the BigCommerce client cannot be built from the
    /// configured API URL.
    pub fn new(config: StorefrontConfig) -> Result<Self, BigCommerceError> {
        let bigcommerce = BigCommerceClient::new(&config.bigcommerce, config.catalog_cache_ttl)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                bigcommerce,
                rate_limiter: FixedWindowLimiter::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the BigCommerce API client.
    #[must_use]
    pub fn bigcommerce(&self) -> &BigCommerceClient {
        &self.inner.bigcommerce
    }

    /// Get a reference to the cart rate limiter.
    #[must_use]
    pub fn rate_limiter(&self) -> &FixedWindowLimiter {
        &self.inner.rate_limiter
    }
}
