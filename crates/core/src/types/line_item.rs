//! Line-item input accepted by the cart endpoints.

use std::num::{NonZeroU32, NonZeroU64};

use serde::{Deserialize, Serialize};

/// A product to place in a cart.
///
/// All numeric fields must be positive integers; serde rejects zero,
/// negatives and fractions while deserializing. `variant_id` is omitted
/// from the upstream payload when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// BigCommerce product ID.
    pub product_id: NonZeroU64,
    /// Variant ID, for products with options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<NonZeroU64>,
    /// Number of units.
    pub quantity: NonZeroU32,
}
