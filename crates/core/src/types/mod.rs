//! Core types for Bigstore.
//!
//! These mirror the subset of the BigCommerce v3 REST payloads the
//! storefront reads. Unknown upstream fields are kept and relayed.

pub mod cart;
pub mod catalog;
pub mod envelope;
pub mod id;
pub mod line_item;
pub mod validation;

pub use cart::{Cart, CartLineItem, CartLineItems, CustomLineItem};
pub use catalog::{Category, CustomUrl, Product, ProductImage, normalize_slug};
pub use envelope::Envelope;
pub use id::*;
pub use line_item::LineItemInput;
pub use validation::{ValidationError, parse_positive_int};
