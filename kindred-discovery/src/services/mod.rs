pub mod match_service;
pub mod quiz_service;

use kindred_shared::errors::{AppError, ErrorCode};
use serde::{Deserialize, Deserializer};
use validator::{ValidationError, ValidationErrors};

/// Reads an absent or `null` string field as empty so it fails validation
/// instead of deserialization.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Rejects empty and whitespace-only identifiers.
pub(crate) fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Field errors go into `details` so clients can highlight the offending input.
pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let message = errors.to_string();
    match serde_json::to_value(&errors) {
        Ok(details) => AppError::with_details(ErrorCode::ValidationError, message, details),
        Err(_) => AppError::new(ErrorCode::ValidationError, message),
    }
}
