//! BigCommerce v3 REST client implementation.
//!
//! Uses `reqwest` for HTTP and caches catalog reads with `moka`.

use std::num::{NonZeroU32, NonZeroU64};
use std::sync::Arc;
use std::time::Duration;

use bigstore_core::{
    Cart, CartId, CartItemId, Category, Envelope, LineItemInput, Product, normalize_slug,
};
use moka::future::Cache;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use super::BigCommerceError;
use super::cache::{CacheKey, CacheValue};
use crate::config::BigCommerceConfig;

/// Products per page when the caller does not ask for a size.
const DEFAULT_PAGE_SIZE: u32 = 12;
/// BigCommerce's maximum page size, used for categories and slug scans.
const MAX_PAGE_SIZE: u32 = 250;
/// Cart sub-resources expanded on every cart read.
const CART_INCLUDES: &str =
    "line_items.physical_items,line_items.digital_items,line_items.custom_items";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CACHE_CAPACITY: u64 = 1_000;

/// Filters for a product listing page.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct ProductQuery {
    /// Restrict to one category.
    pub category_id: Option<NonZeroU32>,
    /// 1-based page number (default 1).
    pub page: Option<NonZeroU32>,
    /// Page size (default 12).
    pub limit: Option<NonZeroU32>,
}

// =============================================================================
// BigCommerceClient
// =============================================================================

/// Client for the BigCommerce v3 REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and catalog cache.
#[derive(Clone)]
pub struct BigCommerceClient {
    inner: Arc<BigCommerceClientInner>,
}

struct BigCommerceClientInner {
    client: reqwest::Client,
    api_base: Url,
    access_token: SecretString,
    channel_id: NonZeroU64,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl BigCommerceClient {
    /// Create a new client. A zero `cache_ttl` disables catalog caching.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is malformed or the HTTP client
    /// cannot be built.
    pub fn new(config: &BigCommerceConfig, cache_ttl: Duration) -> Result<Self, BigCommerceError> {
        let api_base = Url::parse(&config.api_base())
            .map_err(|e| BigCommerceError::InvalidUrl(format!("{}: {e}", config.api_url)))?;
        if api_base.cannot_be_a_base() {
            return Err(BigCommerceError::InvalidUrl(config.api_url.clone()));
        }

        let cache = (!cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(cache_ttl)
                .build()
        });

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(BigCommerceClientInner {
                client,
                api_base,
                access_token: config.access_token.clone(),
                channel_id: config.channel_id,
                cache,
            }),
        })
    }

    /// Build an endpoint URL from path segments under the API base.
    ///
    /// Segments are percent-encoded, so IDs taken from cookies cannot
    /// escape their path position.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BigCommerceError> {
        let mut url = self.inner.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| BigCommerceError::InvalidUrl(self.inner.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and unwrap the `{ data }` envelope.
    ///
    /// Returns `Ok(None)` for `204 No Content`.
    async fn execute<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Option<T>, BigCommerceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let path = url.path().to_string();

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header("X-Auth-Token", self.inner.access_token.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BigCommerceError::RateLimited(retry_after_secs(
                response.headers(),
            )));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let response_text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(BigCommerceError::NotFound(path));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %response_text.chars().take(500).collect::<String>(),
                "BigCommerce API returned non-success status"
            );
            return Err(BigCommerceError::api(status, &response_text));
        }

        let envelope: Envelope<T> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse BigCommerce response"
            );
            BigCommerceError::Parse(e)
        })?;

        Ok(Some(envelope.into_data()))
    }

    /// Like `execute`, but a `204` is an error.
    async fn execute_required<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, BigCommerceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let path = url.path().to_string();
        self.execute(method, url, body)
            .await?
            .ok_or(BigCommerceError::EmptyResponse(path))
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn remember(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    /// URL for one page of visible products on this channel.
    fn product_listing_url(
        &self,
        page: u32,
        limit: u32,
        category_id: Option<NonZeroU32>,
    ) -> Result<Url, BigCommerceError> {
        let mut url = self.endpoint(&["catalog", "products"])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("is_visible", "true")
                .append_pair("include", "images")
                .append_pair("page", &page.to_string())
                .append_pair("limit", &limit.to_string());
            if let Some(category_id) = category_id {
                query.append_pair("categories:in", &category_id.to_string());
            }
            query.append_pair("channel_id", &self.inner.channel_id.to_string());
        }
        Ok(url)
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get all visible categories (up to 250).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, BigCommerceError> {
        let cache_key = CacheKey::Categories;
        if let Some(CacheValue::Categories(categories)) = self.cached(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let mut url = self.endpoint(&["catalog", "categories"])?;
        url.query_pairs_mut()
            .append_pair("is_visible", "true")
            .append_pair("limit", &MAX_PAGE_SIZE.to_string());

        let categories: Vec<Category> = self
            .execute_required(Method::GET, url, None::<&()>)
            .await?;

        self.remember(cache_key, CacheValue::Categories(Arc::new(categories.clone())))
            .await;

        Ok(categories)
    }

    /// Get one page of visible products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BigCommerceError> {
        let cache_key = CacheKey::Products(*query);
        if let Some(CacheValue::Products(products)) = self.cached(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let url = self.product_listing_url(
            query.page.map_or(1, NonZeroU32::get),
            query.limit.map_or(DEFAULT_PAGE_SIZE, NonZeroU32::get),
            query.category_id,
        )?;

        let products: Vec<Product> = self
            .execute_required(Method::GET, url, None::<&()>)
            .await?;

        self.remember(cache_key, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }

    /// Find a visible product by its storefront slug.
    ///
    /// The REST API cannot filter on `custom_url`, so this pages through the
    /// catalog at the maximum page size until a product matches or a short
    /// page marks the end.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, BigCommerceError> {
        let normalized = normalize_slug(slug);

        let cache_key = CacheKey::ProductBySlug(normalized.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(product.as_ref().clone()));
        }

        let mut page = 1;
        loop {
            let url = self.product_listing_url(page, MAX_PAGE_SIZE, None)?;
            let products: Vec<Product> = self
                .execute_required(Method::GET, url, None::<&()>)
                .await?;

            if let Some(product) = products.iter().find(|p| p.matches_slug(&normalized)) {
                self.remember(cache_key, CacheValue::Product(Arc::new(product.clone())))
                    .await;
                return Ok(Some(product.clone()));
            }

            if products.len() < MAX_PAGE_SIZE as usize {
                debug!(pages = page, "Product slug not found");
                return Ok(None);
            }

            page += 1;
        }
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a cart on the configured channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, line_items), fields(items = line_items.len()))]
    pub async fn create_cart(&self, line_items: Vec<LineItemInput>) -> Result<Cart, BigCommerceError> {
        let url = self.endpoint(&["carts"])?;
        let body = json!({
            "channel_id": self.inner.channel_id,
            "line_items": line_items,
        });

        self.execute_required(Method::POST, url, Some(&body)).await
    }

    /// Get a cart with all line item groups expanded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart no longer exists, or another error if
    /// the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, BigCommerceError> {
        let mut url = self.endpoint(&["carts", cart_id.as_str()])?;
        url.query_pairs_mut().append_pair("include", CART_INCLUDES);

        self.execute_required(Method::GET, url, None::<&()>).await
    }

    /// Add line items to an existing cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, line_items), fields(cart_id = %cart_id, items = line_items.len()))]
    pub async fn add_to_cart(
        &self,
        cart_id: &CartId,
        line_items: Vec<LineItemInput>,
    ) -> Result<Cart, BigCommerceError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "items"])?;
        let body = json!({ "line_items": line_items });

        self.execute_required(Method::POST, url, Some(&body)).await
    }

    /// Set the quantity of one cart line item.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        cart_id: &CartId,
        item_id: &CartItemId,
        quantity: NonZeroU32,
    ) -> Result<Cart, BigCommerceError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "items", item_id.as_str()])?;
        let body = json!({ "line_item": { "quantity": quantity } });

        self.execute_required(Method::PUT, url, Some(&body)).await
    }

    /// Remove one line item.
    ///
    /// Returns `Ok(None)` when that was the last item: BigCommerce deletes
    /// the emptied cart and answers `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        cart_id: &CartId,
        item_id: &CartItemId,
    ) -> Result<Option<Cart>, BigCommerceError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "items", item_id.as_str()])?;

        self.execute(Method::DELETE, url, None::<&()>).await
    }
}

/// Seconds to wait after a 429.
///
/// BigCommerce reports the window reset in milliseconds; fall back to the
/// standard `Retry-After` header, then to one second.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
    };

    header("X-Rate-Limit-Time-Reset-Ms")
        .map(|ms| ms.div_ceil(1_000))
        .or_else(|| header("Retry-After"))
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{TEST_TOKEN, bigcommerce_config};
    use mockito::{Matcher, Server};
    use serde_json::Value;

    fn client_for(server: &Server, ttl: Duration) -> BigCommerceClient {
        BigCommerceClient::new(&bigcommerce_config(&server.url()), ttl).unwrap()
    }

    fn envelope(data: Value) -> String {
        json!({ "data": data, "meta": {} }).to_string()
    }

    fn query(pairs: &[(&str, &str)]) -> Matcher {
        Matcher::AllOf(
            pairs
                .iter()
                .map(|(k, v)| Matcher::UrlEncoded((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    fn filler_products(count: usize) -> Value {
        Value::Array(
            (0..count)
                .map(|i| json!({ "id": i + 1, "name": format!("Item {i}"), "custom_url": { "url": format!("/item-{i}/") } }))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_get_categories_sends_auth_and_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/stores/abc123/v3/catalog/categories")
            .match_header("x-auth-token", TEST_TOKEN)
            .match_header("accept", "application/json")
            .match_query(query(&[("is_visible", "true"), ("limit", "250")]))
            .with_status(200)
            .with_body(envelope(json!([{ "id": 23, "name": "Shop All", "is_visible": true }])))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        let categories = client.get_categories().await.unwrap();

        mock.assert_async().await;
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Shop All");
    }

    #[tokio::test]
    async fn test_get_products_defaults_and_category_filter() {
        let mut server = Server::new_async().await;
        let defaults = server
            .mock("GET", "/stores/abc123/v3/catalog/products")
            .match_query(query(&[
                ("is_visible", "true"),
                ("include", "images"),
                ("page", "1"),
                ("limit", "12"),
                ("channel_id", "1"),
            ]))
            .with_status(200)
            .with_body(envelope(filler_products(2)))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        let products = client.get_products(&ProductQuery::default()).await.unwrap();
        defaults.assert_async().await;
        assert_eq!(products.len(), 2);

        let filtered = server
            .mock("GET", "/stores/abc123/v3/catalog/products")
            .match_query(query(&[("categories:in", "23"), ("page", "3")]))
            .with_status(200)
            .with_body(envelope(json!([])))
            .expect(1)
            .create_async()
            .await;

        let products = client
            .get_products(&ProductQuery {
                category_id: NonZeroU32::new(23),
                page: NonZeroU32::new(3),
                limit: None,
            })
            .await
            .unwrap();
        filtered.assert_async().await;
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_get_products_served_from_cache() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/stores/abc123/v3/catalog/products")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(envelope(filler_products(1)))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::from_secs(60));
        client.get_products(&ProductQuery::default()).await.unwrap();
        let products = client.get_products(&ProductQuery::default()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(products.len(), 1);
    }

    #[tokio::test]
    async fn test_get_product_by_slug_scans_pages() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/stores/abc123/v3/catalog/products")
            .match_query(query(&[("page", "1"), ("limit", "250")]))
            .with_status(200)
            .with_body(envelope(filler_products(250)))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/stores/abc123/v3/catalog/products")
            .match_query(query(&[("page", "2"), ("limit", "250")]))
            .with_status(200)
            .with_body(envelope(json!([
                { "id": 999, "name": "Blue Mug", "custom_url": { "url": "/blue-mug/" } }
            ])))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        let product = client.get_product_by_slug("blue-mug/").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(product.map(|p| p.id), Some(999));
    }

    #[tokio::test]
    async fn test_get_product_by_slug_stops_on_short_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/stores/abc123/v3/catalog/products")
            .match_query(query(&[("page", "1")]))
            .with_status(200)
            .with_body(envelope(filler_products(3)))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        let product = client.get_product_by_slug("missing").await.unwrap();

        mock.assert_async().await;
        assert!(product.is_none());
    }

    #[tokio::test]
    async fn test_create_cart_scopes_to_channel() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/stores/abc123/v3/carts")
            .match_body(Matcher::Json(json!({
                "channel_id": 1,
                "line_items": [{ "product_id": 77, "quantity": 2 }]
            })))
            .with_status(201)
            .with_body(envelope(json!({ "id": "cart-1" })))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        let item: LineItemInput =
            serde_json::from_value(json!({ "product_id": 77, "quantity": 2 })).unwrap();
        let cart = client.create_cart(vec![item]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(cart.id.as_str(), "cart-1");
    }

    #[tokio::test]
    async fn test_get_cart_expands_line_items() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/stores/abc123/v3/carts/cart-1")
            .match_query(query(&[("include", CART_INCLUDES)]))
            .with_status(200)
            .with_body(envelope(json!({ "id": "cart-1", "line_items": { "physical_items": [] } })))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        let cart = client
            .get_cart(&CartId::parse("cart-1").unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(cart.item_count(), 0);
    }

    #[tokio::test]
    async fn test_update_cart_item_puts_quantity() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/stores/abc123/v3/carts/cart-1/items/item-9")
            .match_body(Matcher::Json(json!({ "line_item": { "quantity": 4 } })))
            .with_status(200)
            .with_body(envelope(json!({ "id": "cart-1" })))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        client
            .update_cart_item(
                &CartId::parse("cart-1").unwrap(),
                &CartItemId::parse("item-9").unwrap(),
                NonZeroU32::new(4).unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remove_last_item_returns_none() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/stores/abc123/v3/carts/cart-1/items/item-9")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        let cart = client
            .remove_cart_item(
                &CartId::parse("cart-1").unwrap(),
                &CartItemId::parse("item-9").unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(cart.is_none());
    }

    #[tokio::test]
    async fn test_cart_id_is_path_encoded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/stores/abc123/v3/carts/a%2Fb")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(envelope(json!({ "id": "a/b" })))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Duration::ZERO);
        client.get_cart(&CartId::parse("a/b").unwrap()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_errors_are_classified() {
        let mut server = Server::new_async().await;
        let client = client_for(&server, Duration::ZERO);
        let cart_id = CartId::parse("gone").unwrap();

        let _missing = server
            .mock("GET", "/stores/abc123/v3/carts/gone")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"status":404,"title":"Cart not found"}"#)
            .create_async()
            .await;
        assert!(matches!(
            client.get_cart(&cart_id).await,
            Err(BigCommerceError::NotFound(_))
        ));

        let _throttled = server
            .mock("GET", "/stores/abc123/v3/catalog/categories")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("X-Rate-Limit-Time-Reset-Ms", "2500")
            .create_async()
            .await;
        assert!(matches!(
            client.get_categories().await,
            Err(BigCommerceError::RateLimited(3))
        ));

        let _broken = server
            .mock("POST", "/stores/abc123/v3/carts")
            .with_status(422)
            .with_body(r#"{"title":"Missing product"}"#)
            .create_async()
            .await;
        match client.create_cart(vec![]).await {
            Err(BigCommerceError::Api { status, body }) => {
                assert_eq!(status, 422);
                assert!(body.contains("Missing product"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
