//! Catalog payloads: categories and products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    /// Remaining upstream fields, relayed as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A catalog product.
///
/// Only the fields the storefront inspects are typed. Everything else the
/// platform returns lands in `extra` and is serialized back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<CustomUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ProductImage>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The storefront path of a product, e.g. `/blue-mug/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomUrl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_standard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_thumbnail: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Whether this product's custom URL equals an already-normalized slug.
    ///
    /// A trailing slash on either side is ignored: BigCommerce stores most
    /// URLs as `/name/` while route parameters usually arrive as `name`.
    #[must_use]
    pub fn matches_slug(&self, normalized: &str) -> bool {
        let wanted = trim_trailing_slash(normalized);
        self.custom_url
            .as_ref()
            .and_then(|custom| custom.url.as_deref())
            .is_some_and(|url| trim_trailing_slash(url) == wanted)
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some("") | None => path,
        Some(trimmed) => trimmed,
    }
}

/// Normalize a product slug to the form stored in `custom_url.url`.
///
/// BigCommerce stores custom URLs with a leading slash; route parameters
/// arrive without one.
///
/// # Examples
///
/// ```
/// use bigstore_core::normalize_slug;
///
/// assert_eq!(normalize_slug("blue-mug/"), "/blue-mug/");
/// assert_eq!(normalize_slug("/blue-mug/"), "/blue-mug/");
/// ```
#[must_use]
pub fn normalize_slug(slug: &str) -> String {
    if slug.starts_with('/') {
        slug.to_string()
    } else {
        format!("/{slug}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_relays_unknown_fields() {
        let raw = json!({
            "id": 111,
            "name": "Blue Mug",
            "price": 12.5,
            "custom_url": { "url": "/blue-mug/", "is_customized": false },
            "inventory_level": 4,
            "images": [{ "url_standard": "https://cdn.example/std.jpg", "is_thumbnail": true }]
        });

        let product: Product = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(product.price, Some(Decimal::new(125, 1)));
        assert_eq!(product.extra.get("inventory_level"), Some(&json!(4)));

        assert_eq!(serde_json::to_value(&product).unwrap(), raw);
    }

    #[test]
    fn test_product_matches_slug() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "name": "Mug",
            "custom_url": { "url": "/mug/" }
        }))
        .unwrap();

        assert!(product.matches_slug("/mug/"));
        assert!(product.matches_slug("/mug"));
        assert!(!product.matches_slug("/mugs"));
        assert!(!product.matches_slug("/"));
    }

    #[test]
    fn test_product_without_custom_url_never_matches() {
        let product: Product =
            serde_json::from_value(json!({ "id": 1, "name": "Mug" })).unwrap();
        assert!(!product.matches_slug("/"));
    }

    #[test]
    fn test_category_round_trips_visibility() {
        let category: Category =
            serde_json::from_value(json!({ "id": 23, "name": "Shop All", "is_visible": true }))
                .unwrap();
        assert_eq!(category.is_visible, Some(true));
        assert!(category.extra.is_empty());
    }
}
