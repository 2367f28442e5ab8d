//! Integration tests for the storefront JSON API.
//!
//! These tests require:
//! - The storefront running (cargo run -p bigstore-storefront)
//! - BigCommerce sandbox credentials in its environment
//!
//! Run with: cargo test -p bigstore-integration-tests -- --ignored

use bigstore_integration_tests::{
    cart_client, client_from, storefront_base_url, test_product_id,
};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

// ============================================================================
// Health & Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health() {
    let base_url = storefront_base_url();

    let resp = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront and BigCommerce credentials"]
async fn test_categories_envelope() {
    let base_url = storefront_base_url();

    let resp = reqwest::get(format!("{base_url}/api/categories"))
        .await
        .expect("Failed to get categories");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body["data"].is_array());
}

#[tokio::test]
#[ignore = "Requires running storefront and BigCommerce credentials"]
async fn test_products_reject_invalid_page() {
    let base_url = storefront_base_url();

    let resp = reqwest::get(format!("{base_url}/api/products?page=0"))
        .await
        .expect("Failed to get products");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["error"], "Invalid query params");
}

#[tokio::test]
#[ignore = "Requires running storefront and BigCommerce credentials"]
async fn test_unknown_product_is_not_found() {
    let base_url = storefront_base_url();

    let resp = reqwest::get(format!(
        "{base_url}/api/product/definitely-not-a-real-product-slug"
    ))
    .await
    .expect("Failed to get product");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Cart Flow
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and BigCommerce credentials"]
async fn test_cart_flow() {
    let client = cart_client();
    let base_url = storefront_base_url();

    // No cookie yet
    let resp = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body["data"].is_null());

    // Create with one item
    let resp = client
        .post(format!("{base_url}/api/cart"))
        .json(&json!({ "line_items": [{ "product_id": test_product_id(), "quantity": 1 }] }))
        .send()
        .await
        .expect("Failed to create cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("Missing cart cookie")
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    let body: Value = resp.json().await.expect("Failed to parse body");
    let cart_id = body["data"]["id"].as_str().expect("Missing cart id").to_string();

    // Cookie now resolves to the same cart
    let body: Value = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse body");
    assert_eq!(body["data"]["id"], cart_id);
    let item_id = body["data"]["line_items"]["physical_items"][0]["id"]
        .as_str()
        .expect("Missing line item")
        .to_string();

    // Bump the quantity
    let resp = client
        .patch(format!("{base_url}/api/cart/items"))
        .json(&json!({ "item_id": item_id, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to update item");
    assert_eq!(resp.status(), StatusCode::OK);

    // Removing the only item deletes the cart
    let resp = client
        .delete(format!("{base_url}/api/cart/items"))
        .json(&json!({ "item_id": item_id }))
        .send()
        .await
        .expect("Failed to remove item");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body["data"].is_null());
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_item_routes_require_cart() {
    let client = client_from("203.0.113.10");
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&json!({ "line_items": [{ "product_id": 1, "quantity": 1 }] }))
        .send()
        .await
        .expect("Failed to add item");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["error"], "Missing cart");
}

// ============================================================================
// Rate Limiting
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_cart_reads_are_rate_limited() {
    // Unique per run so a previous run's window doesn't leak in
    let client = client_from(&format!("198.51.100.{}", std::process::id() % 250 + 1));
    let base_url = storefront_base_url();

    for _ in 0..30 {
        let resp = client
            .get(format!("{base_url}/api/cart"))
            .send()
            .await
            .expect("Failed to get cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart");

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = resp
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("Missing Retry-After");
    assert!((1..=60).contains(&retry_after));
}
