//! SQLite store backend (`sqlx::SqlitePool`).

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, warn};

use super::queries::{into_preference, Dialect, PreferenceRow, QueryId};
use crate::domain::entities::Preference;
use crate::error::{StoreError, StoreResult};
use crate::ports::outbound::{Clock, PreferenceStore, StoreContext, SystemClock, Transactioner};

const DIALECT: Dialect = Dialect::Sqlite;

/// Open a connection pool, creating the database file if needed.
///
/// Every connection to `sqlite::memory:` sees its own database, so in-memory
/// pools are pinned to one connection that is never recycled.
pub async fn connect_pool(url: &str, max_connections: u32) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let pool = if is_in_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    Ok(pool.connect_with(options).await?)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Preference store on SQLite.
#[derive(Clone)]
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
    deployment_id: String,
    clock: Arc<dyn Clock>,
}

impl SqlitePreferenceStore {
    pub fn new(pool: SqlitePool, deployment_id: impl Into<String>) -> Self {
        Self::with_clock(pool, deployment_id, Arc::new(SystemClock))
    }

    pub fn with_clock(
        pool: SqlitePool,
        deployment_id: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            deployment_id: deployment_id.into(),
            clock,
        }
    }

    /// Create `USER_PREFERENCE` and its unique constraint if missing.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(QueryId::CreateTable.sql(DIALECT))
            .execute(&self.pool)
            .await?;
        debug!("sqlite schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    type Tx = Transaction<'static, Sqlite>;

    async fn get_preference_by_key(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<Preference> {
        let query = sqlx::query_as::<_, PreferenceRow>(QueryId::GetPreferenceByKey.sql(DIALECT))
            .bind(user_id)
            .bind(key)
            .bind(self.deployment_id.as_str());

        let row = match ctx {
            StoreContext::Direct => query.fetch_optional(&self.pool).await?,
            StoreContext::Transaction(tx) => query.fetch_optional(&mut **tx).await?,
        };
        row.map(into_preference).ok_or(StoreError::NotFound)
    }

    async fn get_preferences_by_user_id(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
    ) -> StoreResult<Vec<Preference>> {
        let query =
            sqlx::query_as::<_, PreferenceRow>(QueryId::GetPreferencesByUserId.sql(DIALECT))
                .bind(user_id)
                .bind(self.deployment_id.as_str());

        let rows = match ctx {
            StoreContext::Direct => query.fetch_all(&self.pool).await?,
            StoreContext::Transaction(tx) => query.fetch_all(&mut **tx).await?,
        };
        Ok(rows.into_iter().map(into_preference).collect())
    }

    async fn upsert_preference(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<u64> {
        let now = self.clock.now();
        let query = sqlx::query(QueryId::UpsertPreference.sql(DIALECT))
            .bind(user_id)
            .bind(key)
            .bind(value)
            .bind(self.deployment_id.as_str())
            .bind(now)
            .bind(now);

        let result = match ctx {
            StoreContext::Direct => query.execute(&self.pool).await?,
            StoreContext::Transaction(tx) => query.execute(&mut **tx).await?,
        };
        Ok(result.rows_affected())
    }

    async fn delete_preference(
        &self,
        ctx: StoreContext<'_, Self::Tx>,
        user_id: &str,
        key: &str,
    ) -> StoreResult<u64> {
        let query = sqlx::query(QueryId::DeletePreference.sql(DIALECT))
            .bind(user_id)
            .bind(key)
            .bind(self.deployment_id.as_str());

        let result = match ctx {
            StoreContext::Direct => query.execute(&self.pool).await?,
            StoreContext::Transaction(tx) => query.execute(&mut **tx).await?,
        };
        match result.rows_affected() {
            0 => Err(StoreError::NotFound),
            n => Ok(n),
        }
    }
}

/// Transactioner on a SQLite pool.
#[derive(Clone)]
pub struct SqliteTransactioner {
    pool: SqlitePool,
}

impl SqliteTransactioner {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Transactioner for SqliteTransactioner {
    type Tx = Transaction<'static, Sqlite>;

    async fn transact<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut Self::Tx) -> BoxFuture<'t, StoreResult<T>> + Send + 'static,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        match work(&mut tx).await {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| StoreError::Transaction(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "sqlite rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ManualClock;
    use chrono::Duration;

    async fn store_with_clock(clock: Arc<ManualClock>) -> SqlitePreferenceStore {
        let pool = connect_pool("sqlite::memory:", 5).await.unwrap();
        let store = SqlitePreferenceStore::with_clock(pool, "default", clock);
        store.ensure_schema().await.unwrap();
        store
    }

    async fn store() -> SqlitePreferenceStore {
        store_with_clock(Arc::new(ManualClock::default())).await
    }

    #[test]
    fn test_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://prefs?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://preferences.db?mode=rwc"));
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = store().await;
        store.ensure_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = store().await;
        let result = store
            .get_preference_by_key(StoreContext::Direct, "u1", "theme")
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_upsert_then_overwrite() {
        let clock = Arc::new(ManualClock::default());
        let store = store_with_clock(clock.clone()).await;

        let affected = store
            .upsert_preference(StoreContext::Direct, "u1", "theme", "light")
            .await
            .unwrap();
        assert_eq!(affected, 1);
        let first = store
            .get_preference_by_key(StoreContext::Direct, "u1", "theme")
            .await
            .unwrap();

        clock.advance(Duration::seconds(10));
        store
            .upsert_preference(StoreContext::Direct, "u1", "theme", "dark")
            .await
            .unwrap();

        let all = store
            .get_preferences_by_user_id(StoreContext::Direct, "u1")
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "dark");
        assert_eq!(all[0].created_at, first.created_at);
        assert_eq!(all[0].updated_at, first.updated_at + Duration::seconds(10));
    }

    #[tokio::test]
    async fn test_list_ordered_by_key() {
        let store = store().await;
        for key in ["theme", "locale", "density"] {
            store
                .upsert_preference(StoreContext::Direct, "u1", key, "x")
                .await
                .unwrap();
        }

        let keys: Vec<_> = store
            .get_preferences_by_user_id(StoreContext::Direct, "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec!["density", "locale", "theme"]);
    }

    #[tokio::test]
    async fn test_deployment_scoping() {
        let store = store().await;
        let other = SqlitePreferenceStore::new(store.pool().clone(), "other");

        store
            .upsert_preference(StoreContext::Direct, "u1", "theme", "dark")
            .await
            .unwrap();
        other
            .upsert_preference(StoreContext::Direct, "u1", "theme", "light")
            .await
            .unwrap();

        let mine = store
            .get_preference_by_key(StoreContext::Direct, "u1", "theme")
            .await
            .unwrap();
        let theirs = other
            .get_preference_by_key(StoreContext::Direct, "u1", "theme")
            .await
            .unwrap();
        assert_eq!(mine.value, "dark");
        assert_eq!(theirs.value, "light");
    }

    #[tokio::test]
    async fn test_delete_reports_not_found_when_nothing_removed() {
        let store = store().await;
        store
            .upsert_preference(StoreContext::Direct, "u1", "theme", "dark")
            .await
            .unwrap();

        assert_eq!(
            store
                .delete_preference(StoreContext::Direct, "u1", "theme")
                .await
                .unwrap(),
            1
        );
        assert!(matches!(
            store
                .delete_preference(StoreContext::Direct, "u1", "theme")
                .await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let store = Arc::new(store().await);
        let transactioner = SqliteTransactioner::new(store.pool().clone());

        let inner = Arc::clone(&store);
        let result: StoreResult<()> = transactioner
            .transact(move |tx| {
                Box::pin(async move {
                    inner
                        .upsert_preference(StoreContext::Transaction(&mut *tx), "u1", "a", "1")
                        .await?;
                    inner
                        .upsert_preference(StoreContext::Transaction(&mut *tx), "u1", "b", "2")
                        .await?;
                    Err(StoreError::Database("injected".into()))
                })
            })
            .await;
        assert!(result.is_err());

        let all = store
            .get_preferences_by_user_id(StoreContext::Direct, "u1")
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_transaction_commits_on_ok() {
        let store = Arc::new(store().await);
        let transactioner = SqliteTransactioner::new(store.pool().clone());

        let inner = Arc::clone(&store);
        transactioner
            .transact(move |tx| {
                Box::pin(async move {
                    inner
                        .upsert_preference(StoreContext::Transaction(&mut *tx), "u1", "a", "1")
                        .await?;
                    inner
                        .upsert_preference(StoreContext::Transaction(&mut *tx), "u1", "b", "2")
                        .await
                })
            })
            .await
            .unwrap();

        let all = store
            .get_preferences_by_user_id(StoreContext::Direct, "u1")
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
