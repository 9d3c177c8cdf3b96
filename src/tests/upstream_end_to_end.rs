#[cfg(test)]
mod test {
    use std::sync::Arc;

    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    use crate::cache::token_cache::TokenCache;
    use crate::helpers::time::SystemClock;
    use crate::observability::metrics::get_metrics;
    use crate::odata::resolver::EntityResolver;
    use crate::security::bearer_gate::BearerGate;
    use crate::server::server::AppState;
    use crate::sources::oauth2::OAuth2Exchanger;
    use crate::tests::common::{build_reqwest_client, credentials, spawn_app, table, SECRET};
    use crate::workbook::graph::GraphTableFetcher;

    const TABLE_PATH: &str = "/sites/root/drive/root:/Documents/data.xlsx:/workbook/tables/Table1";

    #[tokio::test]
    async fn odata_reads_through_identity_provider_and_graph() {
        let identity = MockServer::start_async().await;
        let graph = MockServer::start_async().await;

        let token_mock = identity.mock(|when, then| {
            when.method(POST).path("/tenant/oauth2/v2.0/token");
            then.status(200)
                .json_body(json!({ "access_token": "graph-token", "expires_in": "3600" }));
        });
        graph.mock(|when, then| {
            when.method(GET)
                .path(format!("{TABLE_PATH}/columns"))
                .header("authorization", "Bearer graph-token");
            then.status(200).json_body(json!({
                "value": [
                    { "name": "Name", "index": 0 },
                    { "name": "City", "index": 1 },
                    { "name": "Active", "index": 2 }
                ]
            }));
        });
        graph.mock(|when, then| {
            when.method(GET)
                .path(format!("{TABLE_PATH}/rows"))
                .header("authorization", "Bearer graph-token");
            then.status(200).json_body(json!({
                "value": [
                    { "index": 0, "values": [["Ada", "London", true]] },
                    { "index": 1, "values": [["Linus", "Helsinki", false]] }
                ]
            }));
        });
        graph.mock(|when, then| {
            when.method(GET)
                .path(format!("{TABLE_PATH}/rows/itemAt(index=1)"))
                .header("authorization", "Bearer graph-token");
            then.status(200).json_body(json!({
                "index": 1, "values": [["Linus", "Helsinki", false]]
            }));
        });

        let client = build_reqwest_client();
        let exchanger = Arc::new(OAuth2Exchanger::new(client.clone(), &identity.base_url()));
        let token_cache = Arc::new(TokenCache::new(exchanger, Arc::new(SystemClock), 300));
        let fetcher = Arc::new(GraphTableFetcher::new(
            client.clone(),
            &graph.base_url(),
            token_cache.clone(),
            credentials(),
        ));
        let resolver = EntityResolver::start(fetcher, table()).await;
        let state = AppState::new(get_metrics().await, BearerGate::new(SECRET), resolver, token_cache);
        let (_handle, base) = spawn_app(state).await;

        let collection: Value = client
            .get(format!("{base}/odata/ExcelRow"))
            .bearer_auth(SECRET)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            collection["value"],
            json!([
                { "id": "0", "Name": "Ada", "City": "London", "Active": true },
                { "id": "1", "Name": "Linus", "City": "Helsinki", "Active": false }
            ])
        );

        let entity = client
            .get(format!("{base}/odata/ExcelRow('1')"))
            .bearer_auth(SECRET)
            .send()
            .await
            .unwrap();
        assert_eq!(entity.status(), StatusCode::OK);
        let entity: Value = entity.json().await.unwrap();
        assert_eq!(entity["id"], "1");
        assert_eq!(entity["Name"], "Linus");

        let health: Value = client.get(format!("{base}/health")).send().await.unwrap().json().await.unwrap();
        assert_eq!(health["columns"], "ready");
        assert_eq!(health["upstream_token"], "cached");

        // one exchange served the column load and every request after it
        token_mock.assert();
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_bad_gateway() {
        let identity = MockServer::start_async().await;
        let graph = MockServer::start_async().await;
        identity.mock(|when, then| {
            when.method(POST).path("/tenant/oauth2/v2.0/token");
            then.status(401)
                .json_body(json!({ "error": "invalid_client", "error_description": "AADSTS7000215: bad secret" }));
        });

        let client = build_reqwest_client();
        let exchanger = Arc::new(OAuth2Exchanger::new(client.clone(), &identity.base_url()));
        let token_cache = Arc::new(TokenCache::new(exchanger, Arc::new(SystemClock), 300));
        let fetcher = Arc::new(GraphTableFetcher::new(
            client.clone(),
            &graph.base_url(),
            token_cache.clone(),
            credentials(),
        ));
        let resolver = EntityResolver::start(fetcher, table()).await;
        let state = AppState::new(get_metrics().await, BearerGate::new(SECRET), resolver, token_cache);
        let (_handle, base) = spawn_app(state).await;

        let res = client
            .get(format!("{base}/odata/ExcelRow"))
            .bearer_auth(SECRET)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let body = res.text().await.unwrap();
        assert!(body.contains("UpstreamAuthError"));
        assert!(!body.contains("AADSTS"));
    }
}
