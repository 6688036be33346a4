//! # Preference Service
//!
//! Implements [`PreferenceApi`] on top of a [`PreferenceStore`] and a
//! [`Transactioner`].
//!
//! - Validation always runs before the store is touched.
//! - Store failures are logged here with their detail and surfaced as
//!   `InternalError`. Only `NotFound` survives the mapping, and only for
//!   single-key reads and deletes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::entities::Preference;
use crate::domain::validation::{validate_preference_key, validate_preferences};
use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::ports::inbound::PreferenceApi;
use crate::ports::outbound::{PreferenceStore, StoreContext, Transactioner};

/// Application service for preferences.
///
/// Holds no mutable state; clone the `Arc`s freely.
pub struct PreferenceService<S, T> {
    store: Arc<S>,
    transactioner: Arc<T>,
}

impl<S, T> PreferenceService<S, T>
where
    S: PreferenceStore + 'static,
    T: Transactioner<Tx = S::Tx> + 'static,
{
    pub fn new(store: S, transactioner: T) -> Self {
        Self::from_parts(Arc::new(store), Arc::new(transactioner))
    }

    /// Build from shared handles, e.g. when a test keeps a reference to the store.
    pub fn from_parts(store: Arc<S>, transactioner: Arc<T>) -> Self {
        Self {
            store,
            transactioner,
        }
    }
}

impl<S, T> Clone for PreferenceService<S, T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            transactioner: Arc::clone(&self.transactioner),
        }
    }
}

/// Map a single-row store outcome, keeping `NotFound`.
fn single_row_error(op: &'static str, user_id: &str, key: &str, err: StoreError) -> ServiceError {
    match err {
        StoreError::NotFound => {
            debug!(op, user_id, key, "preference not found");
            ServiceError::NotFound
        }
        other => {
            error!(op, user_id, key, error = %other, "preference store failure");
            ServiceError::InternalError
        }
    }
}

#[async_trait]
impl<S, T> PreferenceApi for PreferenceService<S, T>
where
    S: PreferenceStore + 'static,
    T: Transactioner<Tx = S::Tx> + 'static,
{
    async fn get_preference_by_key(&self, user_id: &str, key: &str) -> ServiceResult<Preference> {
        validate_preference_key(key)?;

        self.store
            .get_preference_by_key(StoreContext::Direct, user_id, key)
            .await
            .map_err(|err| single_row_error("get_preference_by_key", user_id, key, err))
    }

    async fn get_preferences_by_user_id(&self, user_id: &str) -> ServiceResult<Vec<Preference>> {
        self.store
            .get_preferences_by_user_id(StoreContext::Direct, user_id)
            .await
            .map_err(|err| {
                error!(user_id, error = %err, "failed to list preferences");
                ServiceError::InternalError
            })
    }

    async fn upsert_preferences(
        &self,
        user_id: &str,
        preferences: HashMap<String, String>,
    ) -> ServiceResult<Vec<String>> {
        if let Err(err) = validate_preferences(&preferences) {
            debug!(user_id, count = preferences.len(), error = %err, "rejected preference batch");
            return Err(err);
        }

        let count = preferences.len();
        let store = Arc::clone(&self.store);
        let owner = user_id.to_string();

        let result = self
            .transactioner
            .transact(move |tx| {
                Box::pin(async move {
                    let mut updated = Vec::with_capacity(preferences.len());
                    for (key, value) in preferences {
                        store
                            .upsert_preference(
                                StoreContext::Transaction(&mut *tx),
                                &owner,
                                &key,
                                &value,
                            )
                            .await?;
                        updated.push(key);
                    }
                    Ok(updated)
                })
            })
            .await;

        match result {
            Ok(updated) => {
                info!(user_id, count, "preferences upserted");
                Ok(updated)
            }
            Err(err) => {
                error!(user_id, count, error = %err, "preference batch rolled back");
                Err(ServiceError::InternalError)
            }
        }
    }

    async fn delete_preference(&self, user_id: &str, key: &str) -> ServiceResult<()> {
        validate_preference_key(key)?;

        self.store
            .delete_preference(StoreContext::Direct, user_id, key)
            .await
            .map_err(|err| single_row_error("delete_preference", user_id, key, err))?;

        info!(user_id, key, "preference deleted");
        Ok(())
    }
}
