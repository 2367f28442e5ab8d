//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, echoed in responses)
//! 4. Security headers
//! 5. Cookie manager (cart cookie)
//!
//! Rate limiting is applied per cart action inside the handlers, since each
//! action has its own budget.

pub mod client_ip;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use client_ip::ClientIp;
pub use rate_limit::{FixedWindowLimiter, RateLimitDecision, RatePolicy};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
