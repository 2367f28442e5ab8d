//! BigStore storefront library.
//!
//! A JSON API in front of the BigCommerce REST API: catalog reads plus a
//! cookie-tracked cart, with per-client rate limits on cart actions. Built
//! as a library so the router can be exercised in tests without a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bigcommerce;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
