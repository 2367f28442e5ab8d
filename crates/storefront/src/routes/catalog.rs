//! Catalog route handlers.
//!
//! Thin relays over the BigCommerce catalog: validate the query, call the
//! client, wrap the result in `{ "data": ... }`.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use bigstore_core::{Category, Envelope, Product, ValidationError, parse_positive_int};
use tracing::instrument;
use url::form_urlencoded;

use crate::bigcommerce::ProductQuery;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product listing query parameters, validated by hand so failures render
/// as JSON with details.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProductListParams {
    pub category: Option<String>,
    pub page: Option<String>,
}

impl ProductListParams {
    /// Collect parameters from a raw query string. When a key repeats, the
    /// first value wins; unknown keys are ignored.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match &*key {
                "category" => &mut params.category,
                "page" => &mut params.page,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

impl TryFrom<ProductListParams> for ProductQuery {
    type Error = ValidationError;

    fn try_from(params: ProductListParams) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            category_id: parse_positive_int("category", params.category.as_deref())?,
            page: parse_positive_int("page", params.page.as_deref())?,
            limit: None,
        })
    }
}

/// List visible categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Envelope<Vec<Category>>>> {
    let categories = state.bigcommerce().get_categories().await?;
    Ok(Json(Envelope::new(categories)))
}

/// List one page of products, optionally within a category.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Envelope<Vec<Product>>>> {
    let params = ProductListParams::from_query(raw.as_deref());
    let query =
        ProductQuery::try_from(params).map_err(|e| AppError::InvalidQuery(e.to_string()))?;

    let products = state.bigcommerce().get_products(&query).await?;
    Ok(Json(Envelope::new(products)))
}

/// Look up a product by its storefront URL.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Envelope<Product>>> {
    let product = state
        .bigcommerce()
        .get_product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    Ok(Json(Envelope::new(product)))
}
