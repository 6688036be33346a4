//! Test helpers: a controllable clock, a store wrapper that injects
//! failures and counts calls, and a transactioner that cannot begin.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::adapters::memory::{InMemoryPreferenceStore, InMemoryTransactioner};
use crate::domain::entities::Preference;
use crate::error::{StoreError, StoreResult};
use crate::ports::outbound::{Clock, PreferenceStore, StoreContext, Transactioner};
use crate::service::PreferenceService;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Store wrapper that counts calls and fails on demand.
pub struct FlakyStore<S> {
    inner: S,
    calls: AtomicUsize,
    upserts: AtomicUsize,
    fail_upsert_at: Option<usize>,
    fail_reads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            upserts: AtomicUsize::new(0),
            fail_upsert_at: None,
            fail_reads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Fail the `n`th upsert (1-based) and every one after it.
    pub fn failing_upsert_at(mut self, n: usize) -> Self {
        self.fail_upsert_at = Some(n);
        self
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Total store calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Upsert calls, including failed ones.
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn injected() -> StoreError {
        StoreError::Database("injected failure".to_string())
    }
}

#[async_trait]
impl<S: PreferenceStore> PreferenceStore for FlakyStore<S> {
    type Tx = S::Tx;

    async fn get_preference_by_key(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<Preference> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.get_preference_by_key(ctx, user_id, key).await
    }

    async fn get_preferences_by_user_id(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
    ) -> StoreResult<Vec<Preference>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.get_preferences_by_user_id(ctx, user_id).await
    }

    async fn upsert_preference(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let n = self.upserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_upsert_at.is_some_and(|at| n >= at) {
            return Err(Self::injected());
        }
        self.inner.upsert_preference(ctx, user_id, key, value).await
    }

    async fn delete_preference(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.delete_preference(ctx, user_id, key).await
    }
}

/// Transactioner whose begin always fails. The work closure never runs.
pub struct UnavailableTransactioner<Tx> {
    begun: AtomicUsize,
    _tx: std::marker::PhantomData<fn() -> Tx>,
}

impl<Tx> UnavailableTransactioner<Tx> {
    pub fn new() -> Self {
        Self {
            begun: AtomicUsize::new(0),
            _tx: std::marker::PhantomData,
        }
    }

    pub fn attempts(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }
}

impl<Tx> Default for UnavailableTransactioner<Tx> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Tx: Send> Transactioner for UnavailableTransactioner<Tx> {
    type Tx = Tx;

    async fn transact<T, F>(&self, _work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut Self::Tx) -> BoxFuture<'t, StoreResult<T>> + Send + 'static,
    {
        self.begun.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Transaction("connection refused".to_string()))
    }
}

/// Service over an in-memory store wrapped in [`FlakyStore`].
pub type FlakyMemoryService =
    PreferenceService<FlakyStore<InMemoryPreferenceStore>, InMemoryTransactioner>;

/// Build a service over a fresh in-memory store. The returned handle shares
/// the service's store so tests can inspect calls and committed rows.
pub fn flaky_memory_service(
    store: FlakyStore<InMemoryPreferenceStore>,
) -> (FlakyMemoryService, Arc<FlakyStore<InMemoryPreferenceStore>>) {
    let transactioner = InMemoryTransactioner::new(store.inner());
    let store = Arc::new(store);
    let service = PreferenceService::from_parts(Arc::clone(&store), Arc::new(transactioner));
    (service, store)
}
