//! Cart payloads.
//!
//! The cart lives entirely on BigCommerce; the storefront only relays it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{CartId, CartItemId};

/// A BigCommerce cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<CartLineItems>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cart contents grouped the way BigCommerce groups them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartLineItems {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_items: Option<Vec<CartLineItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_items: Option<Vec<CartLineItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_items: Option<Vec<CustomLineItem>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A physical or digital catalog item in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: CartItemId,
    pub product_id: u64,
    pub name: String,
    pub quantity: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub list_price: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A custom (non-catalog) item in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomLineItem {
    pub id: CartItemId,
    pub name: String,
    pub quantity: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub list_price: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cart {
    /// Total units across physical, digital and custom items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        let Some(items) = &self.line_items else {
            return 0;
        };

        let catalog = items
            .physical_items
            .iter()
            .chain(items.digital_items.iter())
            .flatten()
            .map(|item| u64::from(item.quantity));
        let custom = items
            .custom_items
            .iter()
            .flatten()
            .map(|item| u64::from(item.quantity));

        catalog.chain(custom).sum()
    }
}
