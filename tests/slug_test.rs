//! Integration tests for slug reservation through the service layer

use investigation_graph::error::GraphError;
use investigation_graph::graph::{CreateDefinition, CreateInvestigation, GraphService};
use investigation_graph::storage::SqliteStorage;

async fn create_test_service() -> GraphService {
    let storage = SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage");
    GraphService::new(storage, None)
}

async fn create_investigation(service: &GraphService, title: &str) -> String {
    let (investigation, _) = service
        .create_investigation(CreateInvestigation {
            title: title.to_string(),
            overview_html: None,
            status: None,
            slug: None,
        })
        .await
        .unwrap();
    investigation.slug
}

#[tokio::test]
async fn test_reservation_is_injective_within_scope() {
    let service = create_test_service().await;
    let slug = create_investigation(&service, "Trade Policy").await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        let definition = service
            .create_definition(
                &slug,
                CreateDefinition {
                    term: "Tariff".to_string(),
                    definition_html: None,
                    see_also: None,
                    slug: None,
                },
            )
            .await
            .unwrap();
        assert!(!seen.contains(&definition.slug), "slug handed out twice");
        seen.push(definition.slug);
    }

    assert_eq!(seen, vec!["tariff", "tariff-2", "tariff-3", "tariff-4"]);
}

#[tokio::test]
async fn test_explicit_override_respected() {
    let service = create_test_service().await;
    let slug = create_investigation(&service, "Trade Policy").await;

    let definition = service
        .create_definition(
            &slug,
            CreateDefinition {
                term: "Tariff".to_string(),
                definition_html: None,
                see_also: None,
                slug: Some("import-tax".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(definition.slug, "import-tax");
}

#[tokio::test]
async fn test_malformed_override_rejected() {
    let service = create_test_service().await;
    let slug = create_investigation(&service, "Trade Policy").await;

    let err = service
        .create_definition(
            &slug,
            CreateDefinition {
                term: "Tariff".to_string(),
                definition_html: None,
                see_also: None,
                slug: Some("Not A Slug".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Validation { .. }));
}

#[tokio::test]
async fn test_unsluggable_title_rejected() {
    let service = create_test_service().await;

    let err = service
        .create_investigation(CreateInvestigation {
            title: "!!!".to_string(),
            overview_html: None,
            status: None,
            slug: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Validation { .. }));
}

#[tokio::test]
async fn test_investigation_slugs_are_global() {
    let service = create_test_service().await;

    let first = create_investigation(&service, "Trade Policy").await;
    let second = create_investigation(&service, "Trade Policy").await;

    assert_eq!(first, "trade-policy");
    assert_eq!(second, "trade-policy-2");
}
