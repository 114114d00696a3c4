//! Provider and profile name validation.

use crate::error::ValidationError;

/// Maximum length of a provider or profile name.
pub const MAX_NAME_LEN: usize = 64;

fn validate(kind: &'static str, name: &str) -> Result<String, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty { kind });
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            kind,
            max: MAX_NAME_LEN,
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidChars {
            kind,
            name: name.to_string(),
        });
    }
    Ok(name.to_string())
}

/// Validate a provider name (1-64 chars of `[A-Za-z0-9_-]`).
pub fn validate_provider_name(name: &str) -> Result<String, ValidationError> {
    validate("Provider", name)
}

/// Validate a profile name (1-64 chars of `[A-Za-z0-9_-]`).
pub fn validate_profile_name(name: &str) -> Result<String, ValidationError> {
    validate("Profile", name)
}

/// Whether `name` would pass validation.
pub fn is_valid_name(name: &str) -> bool {
    validate("Name", name).is_ok()
}
