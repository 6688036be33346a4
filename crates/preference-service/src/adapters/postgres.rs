//! Postgres store backend (`sqlx::PgPool`).

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, warn};

use super::queries::{into_preference, Dialect, PreferenceRow, QueryId};
use crate::domain::entities::Preference;
use crate::error::{StoreError, StoreResult};
use crate::ports::outbound::{Clock, PreferenceStore, StoreContext, SystemClock, Transactioner};

const DIALECT: Dialect = Dialect::Postgres;

/// Open a connection pool.
pub async fn connect_pool(url: &str, max_connections: u32) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Preference store on Postgres.
#[derive(Clone)]
pub struct PostgresPreferenceStore {
    pool: PgPool,
    deployment_id: String,
    clock: Arc<dyn Clock>,
}

impl PostgresPreferenceStore {
    pub fn new(pool: PgPool, deployment_id: impl Into<String>) -> Self {
        Self::with_clock(pool, deployment_id, Arc::new(SystemClock))
    }

    pub fn with_clock(
        pool: PgPool,
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
        debug!("postgres schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PreferenceStore for PostgresPreferenceStore {
    type Tx = Transaction<'static, Postgres>;

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
        let query = sqlx::query(QueryId::UpsertPreference.sql(DIALECT))
            .bind(user_id)
            .bind(key)
            .bind(value)
            .bind(self.deployment_id.as_str())
            .bind(self.clock.now());

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

/// Transactioner on a Postgres pool.
#[derive(Clone)]
pub struct PostgresTransactioner {
    pool: PgPool,
}

impl PostgresTransactioner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Transactioner for PostgresTransactioner {
    type Tx = Transaction<'static, Postgres>;

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
                    warn!(error = %rollback_err, "postgres rollback failed");
                }
                Err(err)
            }
        }
    }
}
