use std::sync::Arc;
use std::time::Duration;

use boracrm_core::deals::Deal;
use boracrm_core::storage::{
    MemoryLocalStore, RecordingStorageEventSink, RemoteStoreTrait, StorageConfig, StorageFacade,
    StorageFailure,
};
use boracrm_core::{Entity, EntityKind};
use boracrm_remote_store::{RemoteStoreAdapter, RemoteStoreClient, RemoteStoreError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "anon-key";

fn adapter(server: &MockServer) -> RemoteStoreAdapter {
    RemoteStoreAdapter::new(RemoteStoreClient::new(&server.uri(), KEY).unwrap())
}

fn seed_rows() -> Vec<serde_json::Value> {
    Deal::seed()
        .iter()
        .map(|d| serde_json::to_value(d).unwrap())
        .collect()
}

#[tokio::test]
async fn fetch_all_sends_credentials_and_returns_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .and(query_param("select", "*"))
        .and(header("apikey", KEY))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seed_rows()))
        .expect(1)
        .mount(&server)
        .await;

    let rows = adapter(&server).fetch_all(EntityKind::Deals).await.unwrap();
    assert_eq!(rows, seed_rows());
}

#[tokio::test]
async fn rejected_credential_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/contacts"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})),
        )
        .mount(&server)
        .await;

    let client = RemoteStoreClient::new(&server.uri(), KEY).unwrap();
    let err = client.select_all("contacts").await.unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = RemoteStoreClient::new(&server.uri(), KEY).unwrap();
    let err = client.select_all("deals").await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn non_array_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": []})))
        .mount(&server)
        .await;

    let client = RemoteStoreClient::new(&server.uri(), KEY).unwrap();
    let err = client.select_all("deals").await.unwrap_err();
    assert!(matches!(err, RemoteStoreError::Json(_)));
}

#[tokio::test]
async fn upsert_merges_duplicates() {
    let server = MockServer::start().await;
    let rows = vec![seed_rows().remove(0)];
    Mock::given(method("POST"))
        .and(path("/rest/v1/deals"))
        .and(header("prefer", "resolution=merge-duplicates"))
        .and(body_json(&rows))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    adapter(&server)
        .upsert_rows(EntityKind::Deals, rows)
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_filters_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/contacts"))
        .and(query_param("id", "eq.c2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    adapter(&server)
        .delete_row(EntityKind::Contacts, "c2")
        .await
        .unwrap();
}

#[tokio::test]
async fn facade_prefers_remote_rows() {
    let server = MockServer::start().await;
    let remote_deal = json!({
        "id": "d42",
        "title": "Remote Only",
        "value": 9000,
        "stage": "Qualified",
        "contactId": "c1",
        "probability": 30,
        "expectedCloseDate": "2024-03-01",
        "tags": []
    });
    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([remote_deal])))
        .mount(&server)
        .await;

    let facade = StorageFacade::new(
        Arc::new(MemoryLocalStore::new()),
        Some(Arc::new(adapter(&server))),
        StorageConfig::immediate(),
    );
    let deals = facade.load_deals().await;
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].id, "d42");
}

#[tokio::test]
async fn slow_remote_falls_back_to_local_within_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingStorageEventSink::new());
    let facade = StorageFacade::new(
        Arc::new(MemoryLocalStore::new()),
        Some(Arc::new(adapter(&server))),
        StorageConfig {
            local_latency: Duration::ZERO,
            remote_timeout: Duration::from_millis(100),
        },
    )
    .with_event_sink(sink.clone());

    assert_eq!(facade.load_deals().await, Deal::seed());
    facade.save_deals(&Deal::seed()[..2]).await.unwrap();
    assert_eq!(
        sink.failures(),
        vec![StorageFailure::RemoteFetch, StorageFailure::RemoteWrite]
    );
}
