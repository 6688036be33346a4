//! In-memory store backend.
//!
//! Rows live in a `BTreeMap` behind a `parking_lot::RwLock`. A transaction
//! stages its writes in a private overlay; reads inside the transaction see
//! the overlay first. Commit applies the overlay under one write lock, so
//! other readers observe either none or all of a batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::entities::Preference;
use crate::error::{StoreError, StoreResult};
use crate::ports::outbound::{Clock, PreferenceStore, StoreContext, SystemClock, Transactioner};

/// (deployment id, user id, preference key)
type RowKey = (String, String, String);

type Rows = BTreeMap<RowKey, Preference>;

/// Writes staged by an open in-memory transaction. `None` marks a delete.
#[derive(Debug, Default)]
pub struct MemoryTransaction {
    staged: BTreeMap<RowKey, Option<Preference>>,
}

impl MemoryTransaction {
    /// Number of staged writes.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

/// Store backed by process memory.
#[derive(Clone)]
pub struct InMemoryPreferenceStore {
    deployment_id: String,
    rows: Arc<RwLock<Rows>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryPreferenceStore {
    /// Create an empty store scoped to `deployment_id`.
    pub fn new(deployment_id: impl Into<String>) -> Self {
        Self::with_clock(deployment_id, Arc::new(SystemClock))
    }

    /// Create an empty store with an explicit time source.
    pub fn with_clock(deployment_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            clock,
        }
    }

    /// Another view on the same rows, scoped to a different deployment.
    pub fn for_deployment(&self, deployment_id: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            rows: Arc::clone(&self.rows),
            clock: Arc::clone(&self.clock),
        }
    }

    /// Deployment this store is scoped to.
    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    /// Committed rows across all deployments.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// True when no rows are committed.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn row_key(&self, user_id: &str, key: &str) -> RowKey {
        (
            self.deployment_id.clone(),
            user_id.to_string(),
            key.to_string(),
        )
    }

    fn current(&self, tx: Option<&MemoryTransaction>, row: &RowKey) -> Option<Preference> {
        if let Some(staged) = tx.and_then(|tx| tx.staged.get(row)) {
            return staged.clone();
        }
        self.rows.read().get(row).cloned()
    }
}

impl std::fmt::Debug for InMemoryPreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPreferenceStore")
            .field("deployment_id", &self.deployment_id)
            .field("rows", &self.rows.read().len())
            .finish()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    type Tx = MemoryTransaction;

    async fn get_preference_by_key(
        &self,
        ctx: StoreContext<'_, MemoryTransaction>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<Preference> {
        let row = self.row_key(user_id, key);
        let tx = match &ctx {
            StoreContext::Direct => None,
            StoreContext::Transaction(tx) => Some(&**tx),
        };
        self.current(tx, &row).ok_or(StoreError::NotFound)
    }

    async fn get_preferences_by_user_id(
        &self,
        ctx: StoreContext<'_, MemoryTransaction>,
        user_id: &str,
    ) -> StoreResult<Vec<Preference>> {
        let in_scope = |(deployment, user, _): &RowKey| {
            deployment == &self.deployment_id && user == user_id
        };

        let mut merged: BTreeMap<String, Preference> = self
            .rows
            .read()
            .iter()
            .filter(|(row, _)| in_scope(*row))
            .map(|((_, _, key), pref)| (key.clone(), pref.clone()))
            .collect();

        if let StoreContext::Transaction(tx) = ctx {
            for (row, staged) in tx.staged.iter().filter(|(row, _)| in_scope(*row)) {
                match staged {
                    Some(pref) => {
                        merged.insert(row.2.clone(), pref.clone());
                    }
                    None => {
                        merged.remove(&row.2);
                    }
                }
            }
        }

        Ok(merged.into_values().collect())
    }

    async fn upsert_preference(
        &self,
        ctx: StoreContext<'_, MemoryTransaction>,
        user_id: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<u64> {
        let row = self.row_key(user_id, key);
        let now = self.clock.now();

        match ctx {
            StoreContext::Direct => {
                let mut rows = self.rows.write();
                match rows.get_mut(&row) {
                    Some(existing) => existing.overwrite(value, now),
                    None => {
                        rows.insert(row, Preference::new(key, value, now));
                    }
                }
            }
            StoreContext::Transaction(tx) => {
                let next = match self.current(Some(&*tx), &row) {
                    Some(mut existing) => {
                        existing.overwrite(value, now);
                        existing
                    }
                    None => Preference::new(key, value, now),
                };
                tx.staged.insert(row, Some(next));
            }
        }
        Ok(1)
    }

    async fn delete_preference(
        &self,
        ctx: StoreContext<'_, MemoryTransaction>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<u64> {
        let row = self.row_key(user_id, key);

        match ctx {
            StoreContext::Direct => self
                .rows
                .write()
                .remove(&row)
                .map(|_| 1)
                .ok_or(StoreError::NotFound),
            StoreContext::Transaction(tx) => {
                if self.current(Some(&*tx), &row).is_none() {
                    return Err(StoreError::NotFound);
                }
                tx.staged.insert(row, None);
                Ok(1)
            }
        }
    }
}

/// Transactioner for [`InMemoryPreferenceStore`].
///
/// Must be built from the store it is used with so commits land in the same
/// rows.
#[derive(Clone)]
pub struct InMemoryTransactioner {
    rows: Arc<RwLock<Rows>>,
}

impl InMemoryTransactioner {
    pub fn new(store: &InMemoryPreferenceStore) -> Self {
        Self {
            rows: Arc::clone(&store.rows),
        }
    }

    fn commit(&self, tx: MemoryTransaction) {
        let mut rows = self.rows.write();
        for (row, staged) in tx.staged {
            match staged {
                Some(pref) => {
                    rows.insert(row, pref);
                }
                None => {
                    rows.remove(&row);
                }
            }
        }
    }
}

#[async_trait]
impl Transactioner for InMemoryTransactioner {
    type Tx = MemoryTransaction;

    async fn transact<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut Self::Tx) -> BoxFuture<'t, StoreResult<T>>
            + Send
            + 'static,
    {
        let mut tx = MemoryTransaction::default();
        match work(&mut tx).await {
            Ok(value) => {
                let staged = tx.staged_len();
                self.commit(tx);
                debug!(staged, "in-memory transaction committed");
                Ok(value)
            }
            Err(err) => {
                debug!(staged = tx.staged_len(), error = %err, "in-memory transaction rolled back");
                Err(err)
            }
        }
    }
}
