//! The `{ data, meta }` envelope used by BigCommerce v3 responses.

use serde::{Deserialize, Serialize};

/// A BigCommerce v3 response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The payload.
    pub data: T,
    /// Pagination and other metadata, relayed untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T> Envelope<T> {
    /// Wrap a payload with no metadata.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { data, meta: None }
    }

    /// Discard the metadata and return the payload.
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }
}
