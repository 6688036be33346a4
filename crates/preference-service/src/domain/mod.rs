//! # Domain Layer
//!
//! Preference entity and the validation rules applied before any store access.

pub mod entities;
pub mod validation;

pub use entities::Preference;
pub use validation::{
    validate_preference_key, validate_preference_value, validate_preferences,
    MAX_PREFERENCE_KEY_LENGTH, MAX_PREFERENCE_VALUE_LENGTH,
};
