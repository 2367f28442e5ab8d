//! Input validation errors and helpers.

/// Errors raised while validating storefront input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string was empty.
    #[error("{field} cannot be empty")]
    Empty {
        /// Name of the offending field.
        field: String,
    },
    /// A value that must be a positive integer was not.
    #[error("{field} must be a positive integer")]
    NotPositiveInt {
        /// Name of the offending field.
        field: String,
    },
}

impl ValidationError {
    /// Name of the field that failed validation.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Empty { field } | Self::NotPositiveInt { field } => field,
        }
    }
}

/// Parse an optional query-string value as a positive integer.
///
/// `None` passes through. Anything that is not a whole number greater than
/// zero (including the empty string) is rejected.
///
/// # Errors
///
/// Returns `ValidationError::NotPositiveInt` naming `field`.
///
/// # Examples
///
/// ```
/// use bigstore_core::parse_positive_int;
///
/// assert_eq!(parse_positive_int("page", Some("3")).unwrap().map(|n| n.get()), Some(3));
/// assert_eq!(parse_positive_int("page", None).unwrap(), None);
/// assert!(parse_positive_int("page", Some("0")).is_err());
/// assert!(parse_positive_int("page", Some("1.5")).is_err());
/// ```
pub fn parse_positive_int(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<std::num::NonZeroU32>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    raw.trim()
        .parse::<std::num::NonZeroU32>()
        .map(Some)
        .map_err(|_| ValidationError::NotPositiveInt {
            field: field.to_string(),
        })
}
