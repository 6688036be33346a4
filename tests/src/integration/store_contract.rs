//! # Store Contract Flows
//!
//! Drives [`PreferenceApi`] over every embedded backend and checks that they
//! behave the same: ordering, overwrite semantics, deployment scoping and
//! batch atomicity.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use preference_service::adapters::sqlite::connect_pool;
    use preference_service::adapters::{
        InMemoryPreferenceStore, InMemoryTransactioner, SqlitePreferenceStore, SqliteTransactioner,
    };
    use preference_service::test_utils::FlakyStore;
    use preference_service::{PreferenceApi, PreferenceService, ServiceError};

    // =============================================================================
    // FIXTURES
    // =============================================================================

    fn prefs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn memory_api(deployment: &str) -> Arc<dyn PreferenceApi> {
        let store = InMemoryPreferenceStore::new(deployment);
        let transactioner = InMemoryTransactioner::new(&store);
        Arc::new(PreferenceService::new(store, transactioner))
    }

    async fn sqlite_api(deployment: &str) -> Arc<dyn PreferenceApi> {
        let pool = connect_pool("sqlite::memory:", 1).await.unwrap();
        let store = SqlitePreferenceStore::new(pool.clone(), deployment);
        store.ensure_schema().await.unwrap();
        Arc::new(PreferenceService::new(store, SqliteTransactioner::new(pool)))
    }

    async fn backends() -> Vec<(&'static str, Arc<dyn PreferenceApi>)> {
        vec![
            ("memory", memory_api("default")),
            ("sqlite", sqlite_api("default").await),
        ]
    }

    // =============================================================================
    // CONTRACT
    // =============================================================================

    #[tokio::test]
    async fn test_upsert_then_list_is_ordered_by_key() {
        for (name, api) in backends().await {
            api.upsert_preferences("alice", prefs(&[("theme", "dark"), ("locale", "en")]))
                .await
                .unwrap();

            let all = api.get_preferences_by_user_id("alice").await.unwrap();
            let keys: Vec<_> = all.iter().map(|p| p.key.as_str()).collect();
            assert_eq!(keys, vec!["locale", "theme"], "{name}");
        }
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_row() {
        for (name, api) in backends().await {
            api.upsert_preferences("alice", prefs(&[("theme", "dark")]))
                .await
                .unwrap();
            let first = api.get_preference_by_key("alice", "theme").await.unwrap();

            api.upsert_preferences("alice", prefs(&[("theme", "light")]))
                .await
                .unwrap();
            let second = api.get_preference_by_key("alice", "theme").await.unwrap();

            assert_eq!(second.value, "light", "{name}");
            assert_eq!(second.created_at, first.created_at, "{name}");
            assert!(second.updated_at >= first.updated_at, "{name}");
            assert_eq!(
                api.get_preferences_by_user_id("alice").await.unwrap().len(),
                1,
                "{name}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        for (name, api) in backends().await {
            assert_eq!(
                api.get_preference_by_key("alice", "nope").await,
                Err(ServiceError::NotFound),
                "{name}"
            );
            assert_eq!(
                api.delete_preference("alice", "nope").await,
                Err(ServiceError::NotFound),
                "{name}"
            );
            assert!(api.get_preferences_by_user_id("alice").await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_invalid_batch_writes_nothing() {
        for (name, api) in backends().await {
            let long_value = "v".repeat(10_001);
            let result = api
                .upsert_preferences(
                    "alice",
                    prefs(&[("theme", "dark"), ("bio", long_value.as_str())]),
                )
                .await;
            assert_eq!(result, Err(ServiceError::InvalidValue), "{name}");
            assert!(api.get_preferences_by_user_id("alice").await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        for (name, api) in backends().await {
            api.upsert_preferences("alice", prefs(&[("theme", "dark")]))
                .await
                .unwrap();
            assert_eq!(
                api.get_preference_by_key("bob", "theme").await,
                Err(ServiceError::NotFound),
                "{name}"
            );
        }
    }

    // =============================================================================
    // SQLITE SPECIFICS
    // =============================================================================

    #[tokio::test]
    async fn test_deployments_share_a_database_without_seeing_each_other() {
        let pool = connect_pool("sqlite::memory:", 1).await.unwrap();
        let tenant_a = SqlitePreferenceStore::new(pool.clone(), "tenant-a");
        tenant_a.ensure_schema().await.unwrap();
        let tenant_b = SqlitePreferenceStore::new(pool.clone(), "tenant-b");

        let api_a = PreferenceService::new(tenant_a, SqliteTransactioner::new(pool.clone()));
        let api_b = PreferenceService::new(tenant_b, SqliteTransactioner::new(pool));

        api_a
            .upsert_preferences("alice", prefs(&[("theme", "dark")]))
            .await
            .unwrap();
        api_b
            .upsert_preferences("alice", prefs(&[("theme", "light")]))
            .await
            .unwrap();

        assert_eq!(
            api_a.get_preference_by_key("alice", "theme").await.unwrap().value,
            "dark"
        );
        assert_eq!(
            api_b.get_preference_by_key("alice", "theme").await.unwrap().value,
            "light"
        );

        api_b.delete_preference("alice", "theme").await.unwrap();
        assert!(api_a.get_preference_by_key("alice", "theme").await.is_ok());
    }

    #[tokio::test]
    async fn test_sqlite_batch_failure_rolls_back() {
        let pool = connect_pool("sqlite::memory:", 1).await.unwrap();
        let store = SqlitePreferenceStore::new(pool.clone(), "default");
        store.ensure_schema().await.unwrap();

        let flaky = Arc::new(FlakyStore::new(store).failing_upsert_at(3));
        let api = PreferenceService::from_parts(
            Arc::clone(&flaky),
            Arc::new(SqliteTransactioner::new(pool)),
        );

        let result = api
            .upsert_preferences(
                "alice",
                prefs(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]),
            )
            .await;

        assert_eq!(result, Err(ServiceError::InternalError));
        assert_eq!(flaky.upserts(), 3);
        assert!(api.get_preferences_by_user_id("alice").await.unwrap().is_empty());
    }
}
