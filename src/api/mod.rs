//! REST boundary for the investigation knowledge graph.
//!
//! This module provides:
//! - The axum router and request handlers
//! - Shared application state
//! - Error-to-status mapping for the domain taxonomy

mod error;
mod handlers;

pub use handlers::*;

use std::sync::Arc;

use axum::extract::{FromRequest, Request};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::GraphError;
use crate::graph::GraphService;
use crate::search::SearchEngine;

/// Application state shared across handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Graph service (entities, links, ordering, slugs).
    pub graph: GraphService,
    /// Search engine over the graph corpus.
    pub search: SearchEngine,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, graph: GraphService, search: SearchEngine) -> Self {
        Self {
            config,
            graph,
            search,
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/investigations",
            get(list_investigations).post(create_investigation),
        )
        .route(
            "/investigations/:slug",
            get(get_investigation)
                .put(update_investigation)
                .delete(delete_investigation),
        )
        .route(
            "/investigations/:slug/definitions",
            get(list_definitions).post(create_definition),
        )
        .route(
            "/investigations/:slug/definitions/:definition_slug",
            put(update_definition).delete(delete_definition),
        )
        .route("/investigations/:slug/claims", post(create_claim))
        .route(
            "/claims/:claim_id",
            get(get_claim).put(update_claim).delete(delete_claim),
        )
        .route("/claims/:claim_id/reorder", post(reorder_claim))
        .route(
            "/claims/:claim_id/counterarguments",
            post(create_counterargument),
        )
        .route(
            "/claims/:claim_id/counterarguments/:id",
            put(update_counterargument).delete(delete_counterargument),
        )
        .route(
            "/claims/:claim_id/counterarguments/:id/reorder",
            post(reorder_counterargument),
        )
        .route("/claims/:claim_id/evidence", post(create_evidence))
        .route(
            "/claims/:claim_id/evidence/:id",
            put(update_evidence).delete(delete_evidence),
        )
        .route("/search", get(search))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON extractor that funnels every body rejection (malformed JSON, unknown
/// fields, wrong shapes) into the single `Validation` error path.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GraphError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(GraphError::Validation {
                field: "body".to_string(),
                reason: rejection.body_text(),
            }),
        }
    }
}
