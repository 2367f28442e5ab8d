//! Bigstore Core - Shared types library.
//!
//! This crate provides the types shared by the Bigstore components:
//! - `storefront` - JSON storefront API in front of BigCommerce
//! - `integration-tests` - Black-box tests against a running storefront
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. BigCommerce remains the source of truth for catalog and cart
//! state; these types describe the payloads that pass through.
//!
//! # Modules
//!
//! - [`types`] - Catalog and cart payloads, line-item inputs, opaque IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
