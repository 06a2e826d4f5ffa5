//! Integration tests for the REST boundary
//!
//! Drives the axum router end to end over in-memory storage.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

use investigation_graph::api::{self, AppState};
use investigation_graph::config::{
    Config, DatabaseConfig, LogFormat, LoggingConfig, SearchConfig, ServerConfig,
};
use investigation_graph::graph::GraphService;
use investigation_graph::search::SearchEngine;
use investigation_graph::storage::SqliteStorage;

fn create_test_config() -> Config {
    Config {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
        knowledge_base: None,
        search: SearchConfig::default(),
    }
}

async fn create_test_app() -> Router {
    let storage = SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage");
    let graph = GraphService::new(storage.clone(), None);
    let search = SearchEngine::new(storage);
    let state = Arc::new(AppState::new(create_test_config(), graph, search));
    api::router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_and_list_investigations() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy", "status": "published"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "trade-policy");
    assert_eq!(body["status"], "published");
    assert_eq!(body["unresolved_links"], json!([]));

    let (status, body) = send(&app, "GET", "/investigations", None).await;
    assert_eq!(status, StatusCode::OK);
    let summaries = body.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["slug"], "trade-policy");
    assert_eq!(summaries[0]["claim_count"], 0);
}

#[tokio::test]
async fn test_empty_title_is_validation_error() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["field"], "title");
}

#[tokio::test]
async fn test_unknown_field_is_validation_error() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy", "colour": "blue"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_get_missing_investigation_is_404() {
    let app = create_test_app().await;

    let (status, body) = send(&app, "GET", "/investigations/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_partial_update_preserves_other_fields() {
    let app = create_test_app().await;

    send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy", "overview_html": "<p>Intro</p>"})),
    )
    .await;

    let (status, body) = send(
        &app,
        "PUT",
        "/investigations/trade-policy",
        Some(json!({"status": "archived"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Trade Policy");
    assert_eq!(body["overview_html"], "<p>Intro</p>");
    assert_eq!(body["status"], "archived");
}

#[tokio::test]
async fn test_delete_investigation() {
    let app = create_test_app().await;

    send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy"})),
    )
    .await;

    let (status, _) = send(&app, "DELETE", "/investigations/trade-policy", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/investigations/trade-policy", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A direct delete of an absent investigation fails
    let (status, _) = send(&app, "DELETE", "/investigations/trade-policy", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_definitions_flow() {
    let app = create_test_app().await;

    send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy"})),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/investigations/trade-policy/definitions",
        Some(json!({
            "term": "Tariff",
            "definition_html": "<p>A tax on imports.</p>",
            "see_also": ["quota"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "tariff");
    assert_eq!(body["see_also"][0]["status"], "dangling");

    let (status, body) = send(
        &app,
        "PUT",
        "/investigations/trade-policy/definitions/tariff",
        Some(json!({"term": "Import Tariff"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["term"], "Import Tariff");
    assert_eq!(body["slug"], "tariff");

    let (status, body) = send(&app, "GET", "/investigations/trade-policy", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["definitions"][0]["term"], "Import Tariff");

    let (status, _) = send(
        &app,
        "DELETE",
        "/investigations/trade-policy/definitions/tariff",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_claim_reorder_flow() {
    let app = create_test_app().await;

    send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy"})),
    )
    .await;

    let (_, first) = send(
        &app,
        "POST",
        "/investigations/trade-policy/claims",
        Some(json!({"claim_text": "Tariffs reduce consumer welfare"})),
    )
    .await;
    assert_eq!(first["position"], 0);

    let (_, second) = send(
        &app,
        "POST",
        "/investigations/trade-policy/claims",
        Some(json!({"claim_text": "Tariffs protect infant industries"})),
    )
    .await;
    assert_eq!(second["position"], 1);

    let second_id = second["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/claims/{}/reorder", second_id),
        Some(json!({"direction": "up"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], 0);

    // Promoting the now-first claim again hits the boundary
    let (status, body) = send(
        &app,
        "POST",
        &format!("/claims/{}/reorder", second_id),
        Some(json!({"direction": "up"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_operation");

    let (_, view) = send(&app, "GET", "/investigations/trade-policy", None).await;
    assert_eq!(
        view["claims"][0]["claim_text"],
        "Tariffs protect infant industries"
    );
    assert_eq!(
        view["claims"][1]["claim_text"],
        "Tariffs reduce consumer welfare"
    );
}

#[tokio::test]
async fn test_counterargument_endpoints() {
    let app = create_test_app().await;

    send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy"})),
    )
    .await;
    let (_, claim) = send(
        &app,
        "POST",
        "/investigations/trade-policy/claims",
        Some(json!({"claim_text": "Tariffs reduce consumer welfare"})),
    )
    .await;
    let claim_id = claim["id"].as_str().unwrap();

    let (status, counter) = send(
        &app,
        "POST",
        &format!("/claims/{}/counterarguments", claim_id),
        Some(json!({"counter_text": "Revenue funds public services"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(counter["position"], 0);
    let counter_id = counter["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/claims/{}/counterarguments/{}", claim_id, counter_id),
        Some(json!({"rebuttal_text": "Less than the deadweight loss"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rebuttal_text"], "Less than the deadweight loss");

    // Counter text is required on create
    let (status, body) = send(
        &app,
        "POST",
        &format!("/claims/{}/counterarguments", claim_id),
        Some(json!({"counter_text": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "counter_text");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/claims/{}/counterarguments/{}", claim_id, counter_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_evidence_endpoints() {
    let app = create_test_app().await;

    send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Trade Policy"})),
    )
    .await;
    let (_, claim) = send(
        &app,
        "POST",
        "/investigations/trade-policy/claims",
        Some(json!({"claim_text": "Tariffs reduce consumer welfare"})),
    )
    .await;
    let claim_id = claim["id"].as_str().unwrap();

    let (status, evidence) = send(
        &app,
        "POST",
        &format!("/claims/{}/evidence", claim_id),
        Some(json!({
            "source_title": "The Cost of Tariffs",
            "source_type": "academic_paper",
            "key_quote": "Consumer prices rose 12%"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(evidence["source_type"], "academic_paper");
    let evidence_id = evidence["id"].as_str().unwrap();

    let (_, view) = send(&app, "GET", &format!("/claims/{}", claim_id), None).await;
    assert_eq!(view["evidence_count"], 1);
    assert_eq!(view["evidence"][0]["source_title"], "The Cost of Tariffs");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/claims/{}/evidence/{}", claim_id, evidence_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_search_endpoint() {
    let app = create_test_app().await;

    send(
        &app,
        "POST",
        "/investigations",
        Some(json!({"title": "Virtue"})),
    )
    .await;
    send(
        &app,
        "POST",
        "/investigations/virtue/claims",
        Some(json!({"claim_text": "growing in wisdom through reflection"})),
    )
    .await;

    // Sub-minimum query is empty, not an error
    let (status, body) = send(&app, "GET", "/search?q=w", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 0);

    let (status, body) = send(&app, "GET", "/search?q=wisdom&collection_ids=virtue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 1);
    assert!(body["results"][0]["excerpt"]
        .as_str()
        .unwrap()
        .contains("wisdom"));
    assert!(body["search_time_ms"].is_number());

    // Unknown kind filter is a validation error
    let (status, body) = send(&app, "GET", "/search?q=wisdom&kinds=banana", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = create_test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/investigations")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "validation_error");
}
