//! Preference validation rules
//!
//! Lengths are counted in UTF-8 bytes, not characters.

use std::collections::HashMap;

use crate::error::{ServiceError, ServiceResult};

/// Longest accepted key, in bytes.
pub const MAX_PREFERENCE_KEY_LENGTH: usize = 255;

/// Longest accepted value, in bytes.
pub const MAX_PREFERENCE_VALUE_LENGTH: usize = 10_000;

/// Reject blank keys and keys longer than [`MAX_PREFERENCE_KEY_LENGTH`].
pub fn validate_preference_key(key: &str) -> ServiceResult<()> {
    if key.trim().is_empty() {
        return Err(ServiceError::InvalidKey);
    }
    if key.len() > MAX_PREFERENCE_KEY_LENGTH {
        return Err(ServiceError::InvalidKey);
    }
    Ok(())
}

/// Reject values longer than [`MAX_PREFERENCE_VALUE_LENGTH`]. Empty is fine.
pub fn validate_preference_value(value: &str) -> ServiceResult<()> {
    if value.len() > MAX_PREFERENCE_VALUE_LENGTH {
        return Err(ServiceError::InvalidValue);
    }
    Ok(())
}

/// Validate every pair of a batch, key before value.
///
/// Returns the first violation found. Iteration order of the map is
/// unspecified, so with several bad pairs which one is reported is too.
pub fn validate_preferences(preferences: &HashMap<String, String>) -> ServiceResult<()> {
    for (key, value) in preferences {
        validate_preference_key(key)?;
        validate_preference_value(value)?;
    }
    Ok(())
}
