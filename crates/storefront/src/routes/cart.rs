//! Cart route handlers.
//!
//! The cart lives on BigCommerce; its ID is kept in the `bc_cart_id` cookie.
//! Every handler runs in the same order: rate limit, cart cookie, body
//! validation, upstream call.

use std::num::NonZeroU32;

use axum::{Json, body::Bytes, extract::State};
use bigstore_core::{Cart, CartId, CartItemId, Envelope, LineItemInput};
use serde::{Deserialize, Deserializer};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_cookies::cookie::SameSite;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use tracing::instrument;

use crate::bigcommerce::BigCommerceError;
use crate::error::{AppError, Result};
use crate::middleware::{ClientIp, RatePolicy};
use crate::state::AppState;

/// Cart cookie name.
pub const CART_COOKIE: &str = "bc_cart_id";

/// Cart cookie lifetime (30 days).
const CART_COOKIE_MAX_AGE_DAYS: i64 = 30;

type CartResponse = Json<Envelope<Option<Cart>>>;

// =============================================================================
// Request Bodies
// =============================================================================

/// Body for `POST /api/cart`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCartBody {
    #[serde(default, deserialize_with = "present")]
    pub line_items: Option<Vec<LineItemInput>>,
}

/// The field may be omitted, but an explicit `null` is rejected.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Body for `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemsBody {
    pub line_items: Vec<LineItemInput>,
}

/// Body for `PATCH /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    pub item_id: CartItemId,
    pub quantity: NonZeroU32,
}

/// Body for `DELETE /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct RemoveItemBody {
    pub item_id: CartItemId,
}

/// Parse a JSON body against a schema.
///
/// A body that is not JSON at all is treated as `{}`, so optional-only
/// schemas accept it and required fields report what is missing. Valid JSON
/// must be an object; derived structs would otherwise accept arrays.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let value = serde_json::from_slice::<Value>(body)
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

    if !value.is_object() {
        return Err(AppError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| AppError::InvalidPayload(e.to_string()))
}

// =============================================================================
// Cookie Helpers
// =============================================================================

/// Get the cart ID from the cookie.
fn get_cart_id(cookies: &Cookies) -> Option<CartId> {
    cookies
        .get(CART_COOKIE)
        .and_then(|cookie| CartId::parse(cookie.value()).ok())
}

/// Set the cart cookie.
fn set_cart_id(cookies: &Cookies, cart_id: &CartId, secure: bool) {
    cookies.add(
        Cookie::build((CART_COOKIE, cart_id.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .path("/")
            .max_age(Duration::days(CART_COOKIE_MAX_AGE_DAYS))
            .build(),
    );
}

/// Expire the cart cookie.
fn clear_cart_id(cookies: &Cookies) {
    cookies.remove(Cookie::build((CART_COOKIE, "")).path("/").build());
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a cart, optionally with initial items, and remember it in a cookie.
#[instrument(skip(state, cookies, body))]
pub async fn create(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    cookies: Cookies,
    body: Bytes,
) -> Result<CartResponse> {
    state
        .rate_limiter()
        .enforce(&RatePolicy::CART_CREATE, &client)
        .await?;

    let body: CreateCartBody = parse_body(&body)?;

    let cart = state
        .bigcommerce()
        .create_cart(body.line_items.unwrap_or_default())
        .await?;

    set_cart_id(&cookies, &cart.id, state.config().environment.is_production());
    tracing::info!(cart_id = %cart.id, items = cart.item_count(), "Cart created");

    Ok(Json(Envelope::new(Some(cart))))
}

/// Fetch the current cart, or `null` when there is none.
#[instrument(skip(state, cookies))]
pub async fn show(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    cookies: Cookies,
) -> Result<CartResponse> {
    state
        .rate_limiter()
        .enforce(&RatePolicy::CART_READ, &client)
        .await?;

    let Some(cart_id) = get_cart_id(&cookies) else {
        return Ok(Json(Envelope::new(None)));
    };

    match state.bigcommerce().get_cart(&cart_id).await {
        Ok(cart) => Ok(Json(Envelope::new(Some(cart)))),
        // Abandoned carts expire upstream; forget the stale ID
        Err(BigCommerceError::NotFound(_)) => {
            tracing::info!(cart_id = %cart_id, "Cart no longer exists, clearing cookie");
            clear_cart_id(&cookies);
            Ok(Json(Envelope::new(None)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Add line items to the current cart.
#[instrument(skip(state, cookies, body))]
pub async fn add(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    cookies: Cookies,
    body: Bytes,
) -> Result<CartResponse> {
    state
        .rate_limiter()
        .enforce(&RatePolicy::CART_ADD, &client)
        .await?;

    let cart_id = get_cart_id(&cookies).ok_or(AppError::MissingCart)?;
    let body: AddItemsBody = parse_body(&body)?;

    let cart = state
        .bigcommerce()
        .add_to_cart(&cart_id, body.line_items)
        .await?;
    tracing::info!(cart_id = %cart_id, items = cart.item_count(), "Items added");

    Ok(Json(Envelope::new(Some(cart))))
}

/// Change the quantity of one line item.
#[instrument(skip(state, cookies, body))]
pub async fn update(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    cookies: Cookies,
    body: Bytes,
) -> Result<CartResponse> {
    state
        .rate_limiter()
        .enforce(&RatePolicy::CART_UPDATE, &client)
        .await?;

    let cart_id = get_cart_id(&cookies).ok_or(AppError::MissingCart)?;
    let body: UpdateItemBody = parse_body(&body)?;

    let cart = state
        .bigcommerce()
        .update_cart_item(&cart_id, &body.item_id, body.quantity)
        .await?;
    tracing::info!(cart_id = %cart_id, items = cart.item_count(), "Item quantity updated");

    Ok(Json(Envelope::new(Some(cart))))
}

/// Remove one line item. Removing the last item deletes the cart.
#[instrument(skip(state, cookies, body))]
pub async fn remove(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    cookies: Cookies,
    body: Bytes,
) -> Result<CartResponse> {
    state
        .rate_limiter()
        .enforce(&RatePolicy::CART_REMOVE, &client)
        .await?;

    let cart_id = get_cart_id(&cookies).ok_or(AppError::MissingCart)?;
    let body: RemoveItemBody = parse_body(&body)?;

    let cart = state
        .bigcommerce()
        .remove_cart_item(&cart_id, &body.item_id)
        .await?;

    match &cart {
        Some(cart) => {
            tracing::info!(cart_id = %cart_id, items = cart.item_count(), "Item removed");
        }
        None => {
            tracing::info!(cart_id = %cart_id, "Last item removed, cart deleted upstream");
            clear_cart_id(&cookies);
        }
    }

    Ok(Json(Envelope::new(cart)))
}
