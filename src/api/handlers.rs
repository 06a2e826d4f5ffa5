use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::{SharedState, ValidatedJson};
use crate::error::{GraphError, GraphResult};
use crate::graph::{
    ClaimView, CounterargumentParams, CounterargumentUpdate, CreateClaim, CreateDefinition,
    CreateInvestigation, DefinitionView, EvidenceParams, EvidenceUpdate, InvestigationView,
    UpdateClaim, UpdateDefinition, UpdateInvestigation,
};
use crate::links::InlineRef;
use crate::ordering::Direction;
use crate::search::{SearchFilters, SearchResponse};
use crate::storage::{
    Claim, Counterargument, DocKind, Evidence, Investigation, InvestigationSummary,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Write response for bodies that may embed inline references.
#[derive(Debug, Serialize)]
pub struct InvestigationWriteResponse {
    /// The stored investigation.
    #[serde(flatten)]
    pub investigation: Investigation,
    /// References in the overview that do not currently resolve.
    pub unresolved_links: Vec<InlineRef>,
}

/// Write response for claim bodies.
#[derive(Debug, Serialize)]
pub struct ClaimWriteResponse {
    /// The stored claim.
    #[serde(flatten)]
    pub claim: Claim,
    /// References in the claim text that do not currently resolve.
    pub unresolved_links: Vec<InlineRef>,
}

/// Reorder request body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderRequest {
    /// Move direction.
    pub direction: Direction,
}

/// Reorder response.
#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    /// The moved entity.
    pub id: String,
    /// Its new position.
    pub position: i64,
}

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Query text.
    #[serde(default)]
    pub q: Option<String>,
    /// Comma-separated investigation slugs to search within.
    #[serde(default)]
    pub collection_ids: Option<String>,
    /// Comma-separated entity kinds (definition, claim).
    #[serde(default)]
    pub kinds: Option<String>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Page offset.
    #[serde(default)]
    pub offset: Option<usize>,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /investigations
pub async fn list_investigations(
    State(state): State<SharedState>,
) -> GraphResult<Json<Vec<InvestigationSummary>>> {
    Ok(Json(state.graph.list_investigations().await?))
}

/// POST /investigations
pub async fn create_investigation(
    State(state): State<SharedState>,
    ValidatedJson(params): ValidatedJson<CreateInvestigation>,
) -> GraphResult<(StatusCode, Json<InvestigationWriteResponse>)> {
    let (investigation, unresolved_links) = state.graph.create_investigation(params).await?;
    Ok((
        StatusCode::CREATED,
        Json(InvestigationWriteResponse {
            investigation,
            unresolved_links,
        }),
    ))
}

/// GET /investigations/{slug}
pub async fn get_investigation(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> GraphResult<Json<InvestigationView>> {
    Ok(Json(state.graph.get_investigation(&slug).await?))
}

/// PUT /investigations/{slug}
pub async fn update_investigation(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    ValidatedJson(params): ValidatedJson<UpdateInvestigation>,
) -> GraphResult<Json<InvestigationWriteResponse>> {
    let (investigation, unresolved_links) =
        state.graph.update_investigation(&slug, params).await?;
    Ok(Json(InvestigationWriteResponse {
        investigation,
        unresolved_links,
    }))
}

/// DELETE /investigations/{slug}
pub async fn delete_investigation(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> GraphResult<StatusCode> {
    state.graph.delete_investigation(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /investigations/{slug}/definitions
pub async fn list_definitions(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> GraphResult<Json<Vec<DefinitionView>>> {
    Ok(Json(state.graph.list_definitions(&slug).await?))
}

/// POST /investigations/{slug}/definitions
pub async fn create_definition(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    ValidatedJson(params): ValidatedJson<CreateDefinition>,
) -> GraphResult<(StatusCode, Json<DefinitionView>)> {
    let definition = state.graph.create_definition(&slug, params).await?;
    Ok((StatusCode::CREATED, Json(definition)))
}

/// PUT /investigations/{slug}/definitions/{definition_slug}
pub async fn update_definition(
    State(state): State<SharedState>,
    Path((slug, definition_slug)): Path<(String, String)>,
    ValidatedJson(params): ValidatedJson<UpdateDefinition>,
) -> GraphResult<Json<DefinitionView>> {
    Ok(Json(
        state
            .graph
            .update_definition(&slug, &definition_slug, params)
            .await?,
    ))
}

/// DELETE /investigations/{slug}/definitions/{definition_slug}
pub async fn delete_definition(
    State(state): State<SharedState>,
    Path((slug, definition_slug)): Path<(String, String)>,
) -> GraphResult<StatusCode> {
    state.graph.delete_definition(&slug, &definition_slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /investigations/{slug}/claims
pub async fn create_claim(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    ValidatedJson(params): ValidatedJson<CreateClaim>,
) -> GraphResult<(StatusCode, Json<ClaimWriteResponse>)> {
    let (claim, unresolved_links) = state.graph.create_claim(&slug, params).await?;
    Ok((
        StatusCode::CREATED,
        Json(ClaimWriteResponse {
            claim,
            unresolved_links,
        }),
    ))
}

/// GET /claims/{id}
pub async fn get_claim(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> GraphResult<Json<ClaimView>> {
    Ok(Json(state.graph.get_claim(&id).await?))
}

/// PUT /claims/{id}
pub async fn update_claim(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ValidatedJson(params): ValidatedJson<UpdateClaim>,
) -> GraphResult<Json<ClaimWriteResponse>> {
    let (claim, unresolved_links) = state.graph.update_claim(&id, params).await?;
    Ok(Json(ClaimWriteResponse {
        claim,
        unresolved_links,
    }))
}

/// DELETE /claims/{id}
pub async fn delete_claim(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> GraphResult<StatusCode> {
    state.graph.delete_claim(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /claims/{id}/reorder
pub async fn reorder_claim(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<ReorderRequest>,
) -> GraphResult<Json<ReorderResponse>> {
    let result = state.graph.reorder_claim(&id, request.direction).await?;
    Ok(Json(ReorderResponse {
        id,
        position: result.position,
    }))
}

/// POST /claims/{id}/counterarguments
pub async fn create_counterargument(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ValidatedJson(params): ValidatedJson<CounterargumentParams>,
) -> GraphResult<(StatusCode, Json<Counterargument>)> {
    let counterargument = state.graph.create_counterargument(&id, params).await?;
    Ok((StatusCode::CREATED, Json(counterargument)))
}

/// PUT /claims/{claim_id}/counterarguments/{id}
pub async fn update_counterargument(
    State(state): State<SharedState>,
    Path((claim_id, id)): Path<(String, String)>,
    ValidatedJson(params): ValidatedJson<CounterargumentUpdate>,
) -> GraphResult<Json<Counterargument>> {
    Ok(Json(
        state
            .graph
            .update_counterargument(&claim_id, &id, params)
            .await?,
    ))
}

/// DELETE /claims/{claim_id}/counterarguments/{id}
pub async fn delete_counterargument(
    State(state): State<SharedState>,
    Path((claim_id, id)): Path<(String, String)>,
) -> GraphResult<StatusCode> {
    state.graph.delete_counterargument(&claim_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /claims/{claim_id}/counterarguments/{id}/reorder
pub async fn reorder_counterargument(
    State(state): State<SharedState>,
    Path((claim_id, id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<ReorderRequest>,
) -> GraphResult<Json<ReorderResponse>> {
    let result = state
        .graph
        .reorder_counterargument(&claim_id, &id, request.direction)
        .await?;
    Ok(Json(ReorderResponse {
        id,
        position: result.position,
    }))
}

/// POST /claims/{id}/evidence
pub async fn create_evidence(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ValidatedJson(params): ValidatedJson<EvidenceParams>,
) -> GraphResult<(StatusCode, Json<Evidence>)> {
    let evidence = state.graph.create_evidence(&id, params).await?;
    Ok((StatusCode::CREATED, Json(evidence)))
}

/// PUT /claims/{claim_id}/evidence/{id}
pub async fn update_evidence(
    State(state): State<SharedState>,
    Path((claim_id, id)): Path<(String, String)>,
    ValidatedJson(params): ValidatedJson<EvidenceUpdate>,
) -> GraphResult<Json<Evidence>> {
    Ok(Json(state.graph.update_evidence(&claim_id, &id, params).await?))
}

/// DELETE /claims/{claim_id}/evidence/{id}
pub async fn delete_evidence(
    State(state): State<SharedState>,
    Path((claim_id, id)): Path<(String, String)>,
) -> GraphResult<StatusCode> {
    state.graph.delete_evidence(&claim_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /search
pub async fn search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> GraphResult<Json<SearchResponse>> {
    let query = params.q.unwrap_or_default();

    let investigation_slugs = params.collection_ids.as_deref().and_then(parse_csv);
    let kinds = match params.kinds.as_deref().and_then(parse_csv) {
        Some(raw) => {
            let mut kinds = Vec::with_capacity(raw.len());
            for value in raw {
                let kind: DocKind = value.parse().map_err(|_| GraphError::Validation {
                    field: "kinds".to_string(),
                    reason: format!("'{}' is not a searchable kind", value),
                })?;
                kinds.push(kind);
            }
            Some(kinds)
        }
        None => None,
    };

    let filters = SearchFilters {
        investigation_slugs,
        kinds,
    };

    let limit = params
        .limit
        .unwrap_or(state.config.search.default_limit)
        .min(state.config.search.max_limit);
    let offset = params.offset.unwrap_or(0);

    Ok(Json(state.search.search(&query, &filters, limit, offset).await?))
}

/// Split a comma-separated parameter, dropping empty segments. Returns None
/// when nothing remains.
fn parse_csv(raw: &str) -> Option<Vec<String>> {
    let values: Vec<String> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        assert_eq!(
            parse_csv("a, b,,c").unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(parse_csv("").is_none());
        assert!(parse_csv(" , ").is_none());
    }
}
