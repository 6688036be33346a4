//! Request and response bodies.

use std::collections::HashMap;

use preference_service::Preference;
use serde::{Deserialize, Serialize};

/// `GET /users/me/preferences`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub preferences: Vec<Preference>,
}

/// `GET /users/me/preferences/:key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceResponse {
    pub key: String,
    pub value: String,
}

impl From<Preference> for PreferenceResponse {
    fn from(pref: Preference) -> Self {
        Self {
            key: pref.key,
            value: pref.value,
        }
    }
}

/// `PUT /users/me/preferences` body.
///
/// `preferences` is optional here so a missing field can be reported as an
/// invalid request instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertPreferencesRequest {
    #[serde(default)]
    pub preferences: Option<HashMap<String, String>>,
}

/// `PUT /users/me/preferences` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertPreferencesResponse {
    pub updated_keys: Vec<String>,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn deleted() -> Self {
        Self {
            message: "Preference deleted successfully".to_string(),
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
