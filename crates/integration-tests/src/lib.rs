//! Black-box tests for the BigStore storefront.
//!
//! These tests talk to a running storefront over HTTP, which in turn talks
//! to a real BigCommerce sandbox store. They are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p bigstore-storefront &
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//! STOREFRONT_TEST_PRODUCT_ID=111 \
//!     cargo test -p bigstore-integration-tests -- --ignored --test-threads=1
//! ```

use reqwest::Client;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Product ID to put in test carts.
///
/// # Panics
///
/// Panics if `STOREFRONT_TEST_PRODUCT_ID` is set but not a number.
#[must_use]
pub fn test_product_id() -> u64 {
    std::env::var("STOREFRONT_TEST_PRODUCT_ID")
        .map(|id| id.parse().expect("STOREFRONT_TEST_PRODUCT_ID must be a number"))
        .unwrap_or(111)
}

/// Client that keeps the cart cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn cart_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Client that sends a fixed `X-Forwarded-For`, so each test gets its own
/// rate-limit bucket.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client_from(ip: &str) -> Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        ip.parse().expect("Invalid forwarded-for address"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}
