//! Graph service: orchestration of entity lifecycle, cross-reference
//! resolution, ordering, and cascade semantics.
//!
//! Handlers stay thin; every domain rule lives here or below. The service is
//! cheap to clone and holds no request state.

mod claims;
mod definitions;
mod investigations;

pub use claims::{
    ClaimView, CounterargumentParams, CounterargumentUpdate, CreateClaim, EvidenceParams,
    EvidenceUpdate, EvidenceView, UpdateClaim,
};
pub use definitions::{CreateDefinition, DefinitionView, SeeAlsoRef, UpdateDefinition};
pub use investigations::{CreateInvestigation, InvestigationView, UpdateInvestigation};

use tracing::warn;

use crate::error::{GraphError, GraphResult};
use crate::kb::KbClient;
use crate::links::{extract_refs, InlineRef, LinkStatus, RefKind, ResolvedLink};
use crate::storage::{SqliteStorage, Storage};

/// Orchestrates storage, the slug index, the link resolver, and the ordering
/// engine behind the REST boundary.
#[derive(Clone)]
pub struct GraphService {
    storage: SqliteStorage,
    kb: Option<KbClient>,
}

impl GraphService {
    /// Create a new graph service
    pub fn new(storage: SqliteStorage, kb: Option<KbClient>) -> Self {
        Self { storage, kb }
    }

    /// Storage handle (shared with the search engine).
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Resolve every inline reference in a rich-text body against current
    /// state, scoped to one investigation. Bodies are never rewritten;
    /// unresolvable targets come back as dangling.
    pub(crate) async fn resolve_refs(
        &self,
        investigation_id: &str,
        html: &str,
    ) -> GraphResult<Vec<ResolvedLink>> {
        let mut resolved = Vec::new();
        for InlineRef { kind, target } in extract_refs(html) {
            let entity_id = match kind {
                RefKind::Definition => {
                    self.storage.resolve_slug(investigation_id, &target).await?
                }
                RefKind::Claim => self
                    .storage
                    .get_claim(&target)
                    .await?
                    .filter(|c| c.investigation_id == investigation_id)
                    .map(|c| c.id),
            };
            let status = if entity_id.is_some() {
                LinkStatus::Live
            } else {
                LinkStatus::Dangling
            };
            resolved.push(ResolvedLink {
                kind,
                target,
                status,
                entity_id,
            });
        }
        Ok(resolved)
    }

    /// The dangling subset of resolved links, as write-response warnings.
    pub(crate) fn unresolved_of(links: &[ResolvedLink]) -> Vec<InlineRef> {
        links
            .iter()
            .filter(|l| l.status == LinkStatus::Dangling)
            .map(|l| InlineRef {
                kind: l.kind,
                target: l.target.clone(),
            })
            .collect()
    }

    /// Validate a caller-provided kb back-reference, warning (never failing)
    /// when the collaborator does not know the id.
    pub(crate) async fn check_kb_resource(&self, kb_resource_id: &str) {
        let Some(kb) = &self.kb else {
            return;
        };
        match kb.get_resource(kb_resource_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(kb_resource_id = %kb_resource_id, "Evidence references unknown knowledge-base resource");
            }
            Err(e) => {
                warn!(kb_resource_id = %kb_resource_id, error = %e, "Knowledge-base lookup failed");
            }
        }
    }

    /// Fetch kb resource metadata for display, swallowing lookup failures.
    pub(crate) async fn kb_resource_for(&self, kb_resource_id: &str) -> Option<crate::kb::KbResource> {
        let kb = self.kb.as_ref()?;
        match kb.get_resource(kb_resource_id).await {
            Ok(resource) => resource,
            Err(e) => {
                warn!(kb_resource_id = %kb_resource_id, error = %e, "Knowledge-base lookup failed");
                None
            }
        }
    }
}

/// Require a non-empty value for a text field, trimming for the check only.
pub(crate) fn required(field: &str, value: &str) -> GraphResult<()> {
    if value.trim().is_empty() {
        return Err(GraphError::Validation {
            field: field.to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    Ok(())
}
