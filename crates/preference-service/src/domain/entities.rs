//! Core domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single stored preference.
///
/// Identity is (user id, key, deployment id). The user and deployment are
/// implied by the query that produced the value and are not repeated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    /// Preference key, unique per user within a deployment.
    pub key: String,
    /// Opaque value. May be empty.
    pub value: String,
    /// Set on first insert, never changed afterwards.
    pub created_at: DateTime<Utc>,
    /// Set on every upsert.
    pub updated_at: DateTime<Utc>,
}

impl Preference {
    /// Create a preference whose timestamps are both `now`.
    pub fn new(key: impl Into<String>, value: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the value and bump `updated_at`, keeping `created_at`.
    pub fn overwrite(&mut self, value: impl Into<String>, now: DateTime<Utc>) {
        self.value = value.into();
        self.updated_at = now;
    }
}
