//! Secret Manager store against a mocked REST endpoint

use base64::Engine;
use ftprov::fivetran::ProviderConfig;
use ftprov::gcp::auth::TokenSource;
use ftprov::gcp::client::GcpClient;
use ftprov::http::HttpClient;
use ftprov::secrets::{SecretManagerStore, SecretStore};
use ftprov::{ProvisionError, SecretError};
use serde_json::json;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "data-platform-01";

fn store_for(server: &MockServer) -> SecretManagerStore {
    let client = GcpClient::with_base_url(
        PROJECT,
        TokenSource::fixed("test-token"),
        HttpClient::new().expect("client"),
        &format!("{}/v1", server.uri()),
    );
    SecretManagerStore::new(client)
}

fn secret_path(secret_id: &str, suffix: &str) -> String {
    format!("/v1/projects/{}/secrets/{}/versions{}", PROJECT, secret_id, suffix)
}

fn encoded(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

#[tokio::test]
async fn test_reads_latest_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(secret_path("fivetran-global", "")))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "versions": [
                {"name": "projects/1/secrets/fivetran-global/versions/2", "state": "ENABLED"},
                {"name": "projects/1/secrets/fivetran-global/versions/1", "state": "ENABLED"}
            ]
        })))
        .mount(&server)
        .await;

    let settings = json!({
        "protocol": "https",
        "core_fivetran_url": "api.fivetran.com",
        "api_version": "v1",
        "api_key": "key",
        "api_secret": "secret"
    });
    Mock::given(method("GET"))
        .and(path(secret_path("fivetran-global", "/latest:access")))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/1/secrets/fivetran-global/versions/2",
            "payload": {"data": encoded(&settings.to_string())}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let config = ProviderConfig::load(&store, "fivetran-global").await.unwrap();
    assert_eq!(config.base_url(), "https://api.fivetran.com/v1");
    assert_eq!(config.api_key, "key");
}

#[tokio::test]
async fn test_versions_listed_once_per_secret() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(secret_path("fivetran-src-conn", "")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"versions": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(secret_path("fivetran-src-conn", "/latest:access")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/1/secrets/fivetran-src-conn/versions/1",
            "payload": {"data": encoded(r#"{"host": "10.1.2.3"}"#)}
        })))
        .expect(3)
        .mount(&server)
        .await;

    let store = store_for(&server);
    for _ in 0..3 {
        store.get_secret("fivetran-src-conn").await.unwrap();
    }
}

#[tokio::test]
async fn test_forbidden_listing_does_not_block_access() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(secret_path("fivetran-src-conn", "")))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(secret_path("fivetran-src-conn", "/latest:access")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/1/secrets/fivetran-src-conn/versions/1",
            "payload": {"data": encoded(r#"{"host": "10.1.2.3"}"#)}
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let raw = store.get_secret("fivetran-src-conn").await.unwrap();
    assert_eq!(raw, r#"{"host": "10.1.2.3"}"#);
}

#[tokio::test]
async fn test_missing_secret_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.get_secret("fivetran-nope").await.unwrap_err();
    assert!(matches!(err, SecretError::NotFound { ref name } if name == "fivetran-nope"));

    let err = ProviderConfig::load(&store, "fivetran-nope").await.unwrap_err();
    assert!(matches!(err, ProvisionError::MissingConfig { .. }));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.get_secret("fivetran-global").await.unwrap_err();
    assert!(matches!(err, SecretError::Unavailable { store: "secret-manager", .. }));
}

#[tokio::test]
async fn test_payload_must_be_base64() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(secret_path("fivetran-global", "/latest:access")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/1/secrets/fivetran-global/versions/1",
            "payload": {"data": "not base64!"}
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.get_secret("fivetran-global").await.unwrap_err();
    assert!(matches!(err, SecretError::InvalidValue { .. }));
}
