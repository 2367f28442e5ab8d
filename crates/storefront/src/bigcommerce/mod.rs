//! BigCommerce REST API client.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against the v3 REST API (`/stores/{hash}/v3`)
//! - BigCommerce is source of truth - NO local sync, direct API calls
//! - Catalog reads cached in memory via `moka`; carts are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use bigstore_storefront::bigcommerce::{BigCommerceClient, ProductQuery};
//!
//! let client = BigCommerceClient::new(&config.bigcommerce, config.catalog_cache_ttl)?;
//!
//! let products = client.get_products(&ProductQuery::default()).await?;
//! let cart = client.create_cart(vec![]).await?;
//! ```

mod cache;
mod client;

pub use client::{BigCommerceClient, ProductQuery};

use thiserror::Error;

/// Longest slice of an upstream error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to BigCommerce.
#[derive(Debug, Error)]
pub enum BigCommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// BigCommerce answered with a non-success status.
    #[error("BigCommerce error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Resource not found (e.g. an expired cart).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by BigCommerce.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Expected a body but got `204 No Content`.
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// The configured API URL cannot carry path segments.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl BigCommerceError {
    /// Build an `Api` error, truncating the body.
    fn api(status: reqwest::StatusCode, body: &str) -> Self {
        Self::Api {
            status: status.as_u16(),
            body: truncate(body),
        }
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
