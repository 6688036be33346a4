//! # Inbound Ports (Driving Ports)
//!
//! The API the HTTP gateway calls. The caller is responsible for
//! authenticating the user; every operation trusts `user_id`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::entities::Preference;
use crate::error::ServiceResult;

/// Preference operations for one authenticated user.
#[async_trait]
pub trait PreferenceApi: Send + Sync {
    /// Read one preference.
    ///
    /// ## Errors
    ///
    /// - `InvalidKey`: key is blank or too long (no store access)
    /// - `NotFound`: no such key for this user
    /// - `InternalError`: store failure
    async fn get_preference_by_key(&self, user_id: &str, key: &str) -> ServiceResult<Preference>;

    /// Read all preferences of a user, ascending by key. Empty if none.
    ///
    /// ## Errors
    ///
    /// - `InternalError`: store failure
    async fn get_preferences_by_user_id(&self, user_id: &str) -> ServiceResult<Vec<Preference>>;

    /// Insert or overwrite a batch of preferences atomically.
    ///
    /// Returns the written keys in no particular order.
    ///
    /// ## Atomicity
    ///
    /// The whole batch is validated before any write, then written inside one
    /// transaction. Either every pair becomes visible or none does.
    ///
    /// ## Errors
    ///
    /// - `InvalidKey` / `InvalidValue`: some pair failed validation (nothing written)
    /// - `InternalError`: a write or the commit failed (rolled back)
    async fn upsert_preferences(
        &self,
        user_id: &str,
        preferences: HashMap<String, String>,
    ) -> ServiceResult<Vec<String>>;

    /// Delete one preference.
    ///
    /// ## Errors
    ///
    /// - `InvalidKey`: key is blank or too long (no store access)
    /// - `NotFound`: nothing was deleted
    /// - `InternalError`: store failure
    async fn delete_preference(&self, user_id: &str, key: &str) -> ServiceResult<()>;
}
