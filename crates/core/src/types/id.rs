//! Newtype IDs for BigCommerce's opaque string identifiers.
//!
//! Use the `define_string_id!` macro to create type-safe wrappers that
//! prevent accidentally passing a line item ID where a cart ID is expected.

/// Macro to define a type-safe, non-empty string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string, `Deserialize` through `parse()`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `parse()`, `as_str()`
/// - `Display` and `TryFrom<String>` implementations
///
/// # Example
///
/// ```rust
/// # use bigstore_core::define_string_id;
/// define_string_id!(CartId, "cart ID");
///
/// assert!(CartId::parse("3a1c2e0b").is_ok());
/// assert!(CartId::parse("").is_err());
/// ```
#[macro_export]
macro_rules! define_string_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, rejecting empty or whitespace-only input.
            ///
            /// # Errors
            ///
            /// Returns `ValidationError::Empty` if the input is blank.
            pub fn parse(
                value: impl Into<String>,
            ) -> ::core::result::Result<Self, $crate::ValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err($crate::ValidationError::Empty {
                        field: $label.to_string(),
                    });
                }
                Ok(Self(value))
            }

            /// Get the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::ValidationError;

            fn try_from(value: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_string_id!(CartId, "cart_id");
define_string_id!(CartItemId, "item_id");
