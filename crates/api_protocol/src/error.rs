//! Error body and request validation errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A request body or query string the client must fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field is present but its value is not acceptable.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Returns the trimmed value of a required text field.
pub(crate) fn required<'a>(
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(required("name", &None), Err(ValidationError::MissingField("name")));
        assert_eq!(
            required("name", &Some("   ".to_string())),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(required("name", &Some(" Ann ".to_string())), Ok("Ann"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::MissingField("description").to_string(),
            "description is required"
        );
        assert_eq!(
            ValidationError::invalid("sort", "unknown sort key: size").to_string(),
            "Invalid sort: unknown sort key: size"
        );
        let body = serde_json::to_value(ErrorResponse::new("Not found")).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "Not found" }));
    }
}
