//! Domain records persisted by the store.
//!
//! # Responsibility
//! - Define read models for every entity table.
//! - Hold input validation shared by repository write paths.
//!
//! # Invariants
//! - Required text inputs are trimmed and must not be blank.
//! - Timestamps are ISO-8601 UTC text (`YYYY-MM-DDTHH:MM:SS`).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod handbook;
pub mod news;
pub mod request;
pub mod student;

/// Rejected caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is blank after trim.
    EmptyField(&'static str),
    /// List limit must be positive.
    ZeroLimit,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be blank"),
            Self::ZeroLimit => write!(f, "limit must be greater than zero"),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects blank input.
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Trims `value`; blank input becomes `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

pub fn positive_limit(limit: u32) -> Result<u32, ValidationError> {
    if limit == 0 {
        return Err(ValidationError::ZeroLimit);
    }
    Ok(limit)
}
