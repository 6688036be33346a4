//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the preference service requires from its host.
//!
//! Production: `PostgresPreferenceStore`, `SqlitePreferenceStore`
//! Testing: `InMemoryPreferenceStore`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::domain::entities::Preference;
use crate::error::StoreResult;

/// Where a store operation runs.
///
/// Store operations never begin transactions themselves. They either run
/// against the pool in autocommit mode or inside a unit of work that a
/// [`Transactioner`] already opened.
pub enum StoreContext<'a, Tx> {
    /// Autocommit against the backing pool.
    Direct,
    /// Inside an open transaction.
    Transaction(&'a mut Tx),
}

impl<Tx> std::fmt::Debug for StoreContext<'_, Tx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreContext::Direct => f.write_str("Direct"),
            StoreContext::Transaction(_) => f.write_str("Transaction"),
        }
    }
}

/// Persistence of preferences, scoped to one deployment.
///
/// The deployment id is fixed when the store is built and applied to every
/// query. Implementations assign `created_at` / `updated_at` themselves.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Transaction handle accepted in [`StoreContext::Transaction`].
    type Tx: Send;

    /// Fetch one row. `StoreError::NotFound` when it does not exist.
    async fn get_preference_by_key(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<Preference>;

    /// Fetch all rows of a user ordered by key ascending.
    async fn get_preferences_by_user_id(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
    ) -> StoreResult<Vec<Preference>>;

    /// Insert or overwrite one row. Returns rows affected.
    async fn upsert_preference(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<u64>;

    /// Delete one row. `StoreError::NotFound` when zero rows were affected.
    async fn delete_preference(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<u64>;
}

/// Opens units of work.
#[async_trait]
pub trait Transactioner: Send + Sync {
    /// Transaction handle passed to the work closure.
    type Tx: Send;

    /// Begin a transaction, run `work` inside it, commit on `Ok`.
    ///
    /// On `Err` the transaction is rolled back and the error returned. If the
    /// returned future is dropped before completion the transaction is
    /// dropped uncommitted, which also rolls it back.
    async fn transact<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut Self::Tx) -> BoxFuture<'t, StoreResult<T>> + Send + 'static;
}

/// Time source for row timestamps.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
