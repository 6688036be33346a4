//! Store selection and service construction.

use std::sync::Arc;

use preference_service::adapters::{
    postgres, sqlite, InMemoryPreferenceStore, InMemoryTransactioner, PostgresPreferenceStore,
    PostgresTransactioner, SqlitePreferenceStore, SqliteTransactioner,
};
use preference_service::{PreferenceApi, PreferenceService};
use tracing::info;

use crate::config::{Backend, DatabaseConfig};
use crate::NodeError;

/// Open the configured store, bootstrap its schema and wrap it in a service.
pub async fn build_service(db: &DatabaseConfig) -> Result<Arc<dyn PreferenceApi>, NodeError> {
    let backend = db.backend()?;
    let deployment = db.deployment_id.as_str();

    let api: Arc<dyn PreferenceApi> = match backend {
        Backend::Memory => {
            let store = InMemoryPreferenceStore::new(deployment);
            let transactioner = InMemoryTransactioner::new(&store);
            Arc::new(PreferenceService::new(store, transactioner))
        }
        Backend::Postgres => {
            let pool = postgres::connect_pool(&db.url, db.max_connections).await?;
            let store = PostgresPreferenceStore::new(pool.clone(), deployment);
            store.ensure_schema().await?;
            Arc::new(PreferenceService::new(store, PostgresTransactioner::new(pool)))
        }
        Backend::Sqlite => {
            let pool = sqlite::connect_pool(&db.url, db.max_connections).await?;
            let store = SqlitePreferenceStore::new(pool.clone(), deployment);
            store.ensure_schema().await?;
            Arc::new(PreferenceService::new(store, SqliteTransactioner::new(pool)))
        }
    };

    info!(
        backend = ?backend,
        deployment_id = %deployment,
        max_connections = db.max_connections,
        "Preference store ready"
    );
    Ok(api)
}
