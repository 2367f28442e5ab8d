//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness check
//!
//! # Catalog
//! GET    /api/categories        - Visible categories
//! GET    /api/products          - Product page (?category=&page=)
//! GET    /api/product/{*slug}   - Product by storefront URL
//!
//! # Cart (cookie `bc_cart_id`, rate limited per action)
//! POST   /api/cart              - Create cart, set cookie
//! GET    /api/cart              - Current cart or null
//! POST   /api/cart/items        - Add line items
//! PATCH  /api/cart/items        - Change a line item's quantity
//! DELETE /api/cart/items        - Remove a line item
//! ```

pub mod cart;
pub mod catalog;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::from_fn,
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route("/products", get(catalog::products))
        .route("/product/{*slug}", get(catalog::product))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).post(cart::create))
        .route(
            "/cart/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", catalog_routes().merge(cart_routes()))
}

/// Build the full application with its middleware stack.
///
/// Sentry layers are added by the binary so tests can run without them.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(CookieManagerLayer::new())
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check BigCommerce.
async fn health() -> &'static str {
    "ok"
}
