#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::error::ServiceError;
    use crate::odata::resolver::{ColumnState, EntityResolver};
    use crate::tests::common::{table, StubFetcher};

    #[tokio::test]
    async fn list_all_translates_every_row() {
        let resolver = EntityResolver::new(Arc::new(StubFetcher::abc()), table());

        let entities = resolver.list_all().await.unwrap();

        assert_eq!(
            serde_json::to_value(&entities).unwrap(),
            json!([
                { "id": "0", "A": 1, "B": 2, "C": 3 },
                { "id": "1", "A": 4, "B": 5, "C": 6 },
                { "id": "2", "A": 7, "B": 8, "C": 9 },
            ])
        );
    }

    #[tokio::test]
    async fn get_by_key_addresses_row_ordinal() {
        let resolver = EntityResolver::new(Arc::new(StubFetcher::abc()), table());

        let entity = resolver.get_by_key("2").await.unwrap();

        assert_eq!(entity.id, "2");
        assert_eq!(serde_json::to_value(&entity).unwrap(), json!({ "id": "2", "A": 7, "B": 8, "C": 9 }));
        assert_eq!(resolver.get_by_key("abc").await, Err(ServiceError::InvalidKey("abc".into())));
        assert_eq!(resolver.get_by_key("99").await, Err(ServiceError::NotFound("99".into())));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_column_load() {
        let fetcher = Arc::new(StubFetcher::abc().with_delay(Duration::from_millis(100)));
        let resolver = Arc::new(EntityResolver::new(fetcher.clone(), table()));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.list_all().await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().len(), 3);
        }

        assert_eq!(fetcher.column_loads(), 1);
        assert_eq!(resolver.column_state().await.label(), "ready");
    }

    #[tokio::test]
    async fn failed_initialization_is_retried_by_next_request() {
        let fetcher = Arc::new(StubFetcher::abc().failing_first(1));

        let resolver = EntityResolver::start(fetcher.clone(), table()).await;

        assert!(matches!(resolver.column_state().await, ColumnState::Failed { .. }));
        assert_eq!(resolver.list_all().await.unwrap().len(), 3);
        assert_eq!(resolver.column_state().await.label(), "ready");
        assert_eq!(fetcher.column_loads(), 2);

        // ready columns are not reloaded
        resolver.get_by_key("0").await.unwrap();
        assert_eq!(fetcher.column_loads(), 2);
    }

    #[tokio::test]
    async fn request_during_failure_surfaces_upstream_error() {
        let fetcher = Arc::new(StubFetcher::abc().failing_first(2));
        let resolver = EntityResolver::new(fetcher.clone(), table());

        let err = resolver.list_all().await.unwrap_err();
        assert_eq!(err.code(), "UpstreamDataError");
        let err = resolver.get_by_key("1").await.unwrap_err();
        assert_eq!(err.code(), "UpstreamDataError");

        assert_eq!(resolver.get_by_key("1").await.unwrap().id, "1");
    }

    #[tokio::test]
    async fn empty_table_yields_empty_collection() {
        let resolver = EntityResolver::new(Arc::new(StubFetcher::new(&["A"], vec![])), table());

        assert!(resolver.list_all().await.unwrap().is_empty());
        assert_eq!(resolver.get_by_key("0").await, Err(ServiceError::NotFound("0".into())));
    }

    #[tokio::test]
    async fn row_without_values_is_a_bare_entity() {
        let fetcher = StubFetcher::new(&["A", "B"], vec![vec![]]);
        let resolver = EntityResolver::new(Arc::new(fetcher), table());

        let entity = resolver.get_by_key("0").await.unwrap();

        assert_eq!(serde_json::to_value(&entity).unwrap(), json!({ "id": "0" }));
        assert_eq!(resolver.get_by_key("1").await, Err(ServiceError::NotFound("1".into())));
    }
}
