//! Integration tests for the knowledge-base collaborator client

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use investigation_graph::config::KnowledgeBaseConfig;
use investigation_graph::error::KbError;
use investigation_graph::kb::KbClient;

fn create_client(base_url: &str, api_key: Option<&str>) -> KbClient {
    KbClient::new(&KnowledgeBaseConfig {
        base_url: base_url.to_string(),
        api_key: api_key.map(|k| k.to_string()),
        timeout_ms: 2000,
    })
    .expect("Failed to create client")
}

#[tokio::test]
async fn test_get_resource_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/kb-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "kb-123",
            "title": "The Cost of Tariffs",
            "source_url": "https://example.org/tariffs",
            "resource_type": "academic_paper",
            "status": "indexed"
        })))
        .mount(&server)
        .await;

    let client = create_client(&server.uri(), None);
    let resource = client
        .get_resource("kb-123")
        .await
        .unwrap()
        .expect("Resource should exist");

    assert_eq!(resource.id, "kb-123");
    assert_eq!(resource.title, "The Cost of Tariffs");
    assert_eq!(resource.status.as_deref(), Some("indexed"));
}

#[tokio::test]
async fn test_unknown_resource_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = create_client(&server.uri(), None);
    let resource = client.get_resource("missing").await.unwrap();
    assert!(resource.is_none());
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/kb-500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = create_client(&server.uri(), None);
    let err = client.get_resource("kb-500").await.unwrap_err();
    assert!(matches!(err, KbError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_api_key_sent_as_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/kb-123"))
        .and(header("Authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "kb-123",
            "title": "The Cost of Tariffs"
        })))
        .mount(&server)
        .await;

    let client = create_client(&server.uri(), Some("secret-key"));
    let resource = client.get_resource("kb-123").await.unwrap();
    assert!(resource.is_some());
}

#[tokio::test]
async fn test_malformed_payload_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/kb-bad"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = create_client(&server.uri(), None);
    let err = client.get_resource("kb-bad").await.unwrap_err();
    assert!(matches!(err, KbError::InvalidResponse { .. }));
}
