//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Errors render as
//! `{ "error": "...", "details": "..." }` JSON; server-side failures are
//! captured to Sentry before responding.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::bigcommerce::BigCommerceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// BigCommerce API operation failed.
    #[error("BigCommerce error: {0}")]
    BigCommerce(#[from] BigCommerceError),

    /// Query string failed validation.
    #[error("Invalid query params: {0}")]
    InvalidQuery(String),

    /// Request body failed validation.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Cart operation without a cart cookie.
    #[error("Missing cart")]
    MissingCart,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too many requests from this client for this action.
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Seconds until the window resets.
        retry_after_secs: u64,
    },
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BigCommerce(BigCommerceError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::BigCommerce(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidQuery(_) | Self::InvalidPayload(_) | Self::MissingCart => {
                StatusCode::BAD_REQUEST
            }
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    // Don't expose internal error details to clients
    fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            Self::BigCommerce(BigCommerceError::NotFound(_)) | Self::NotFound(_) => {
                ("Not found", None)
            }
            Self::BigCommerce(_) => ("External service error", None),
            Self::InvalidQuery(details) => ("Invalid query params", Some(details.clone())),
            Self::InvalidPayload(details) => ("Invalid payload", Some(details.clone())),
            Self::MissingCart => ("Missing cart", None),
            Self::RateLimited { .. } => ("Rate limit exceeded", None),
        };

        ErrorBody {
            error: error.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut response = (status, Json(self.body())).into_response();

        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
