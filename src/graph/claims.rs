use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{required, GraphService};
use crate::error::{GraphError, GraphResult};
use crate::kb::KbResource;
use crate::links::{InlineRef, ResolvedLink};
use crate::ordering::{Direction, MoveResult};
use crate::storage::{Claim, Counterargument, Evidence, SourceType, Storage};

/// Parameters for creating a claim.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateClaim {
    /// Claim text (required, non-empty; may embed inline reference markers).
    pub claim_text: String,
}

/// Parameters for a partial claim update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateClaim {
    /// New claim text.
    #[serde(default)]
    pub claim_text: Option<String>,
}

/// Parameters for creating a counterargument.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterargumentParams {
    /// The objection text (required, non-empty).
    pub counter_text: String,
    /// Optional rebuttal.
    #[serde(default)]
    pub rebuttal_text: Option<String>,
}

/// Parameters for a partial counterargument update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterargumentUpdate {
    /// New objection text.
    #[serde(default)]
    pub counter_text: Option<String>,
    /// New rebuttal; explicit null clears it.
    #[serde(default)]
    pub rebuttal_text: Option<Option<String>>,
}

/// Parameters for creating evidence.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceParams {
    /// Title of the source (required, non-empty).
    pub source_title: String,
    /// Kind of source.
    pub source_type: SourceType,
    /// Optional source URL.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Optional verbatim quote.
    #[serde(default)]
    pub key_quote: Option<String>,
    /// Optional paraphrased takeaway.
    #[serde(default)]
    pub key_point: Option<String>,
    /// Optional knowledge-base back-reference.
    #[serde(default)]
    pub kb_resource_id: Option<String>,
}

/// Parameters for a partial evidence update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceUpdate {
    /// New source title.
    #[serde(default)]
    pub source_title: Option<String>,
    /// New source kind.
    #[serde(default)]
    pub source_type: Option<SourceType>,
    /// New source URL; explicit null clears it.
    #[serde(default)]
    pub source_url: Option<Option<String>>,
    /// New key quote; explicit null clears it.
    #[serde(default)]
    pub key_quote: Option<Option<String>>,
    /// New key point; explicit null clears it.
    #[serde(default)]
    pub key_point: Option<Option<String>>,
    /// New back-reference; explicit null clears it.
    #[serde(default)]
    pub kb_resource_id: Option<Option<String>>,
}

/// Evidence as served to readers, with collaborator metadata when available.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceView {
    /// The evidence record.
    #[serde(flatten)]
    pub evidence: Evidence,
    /// Knowledge-base resource metadata, when the collaborator is configured
    /// and knows the back-reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_resource: Option<KbResource>,
}

/// Claim as served to readers, with children and link annotations.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimView {
    /// Claim identifier.
    pub id: String,
    /// Owning investigation.
    pub investigation_id: String,
    /// Raw claim text.
    pub claim_text: String,
    /// Display position within the investigation.
    pub position: i64,
    /// Inline references in the claim text with their current resolution.
    pub links: Vec<ResolvedLink>,
    /// Number of counterarguments.
    pub counterargument_count: i64,
    /// Number of evidence records.
    pub evidence_count: i64,
    /// Counterarguments in display order.
    pub counterarguments: Vec<Counterargument>,
    /// Evidence, oldest first.
    pub evidence: Vec<EvidenceView>,
    /// When the claim was created.
    pub created_at: chrono::DateTime<Utc>,
    /// When the claim was last updated.
    pub updated_at: chrono::DateTime<Utc>,
}

impl GraphService {
    /// Create a claim at the end of an investigation's sequence.
    pub async fn create_claim(
        &self,
        investigation_slug: &str,
        params: CreateClaim,
    ) -> GraphResult<(Claim, Vec<InlineRef>)> {
        let investigation = self.require_investigation(investigation_slug).await?;
        required("claim_text", &params.claim_text)?;

        let claim = self
            .storage
            .create_claim(Claim::new(&investigation.id, params.claim_text))
            .await?;

        let links = self.resolve_refs(&investigation.id, &claim.claim_text).await?;
        let unresolved = Self::unresolved_of(&links);

        info!(claim_id = %claim.id, position = claim.position, "Claim created");
        Ok((claim, unresolved))
    }

    /// Read one claim with its counterarguments, evidence, and links.
    pub async fn get_claim(&self, id: &str) -> GraphResult<ClaimView> {
        let claim = self.require_claim(id).await?;
        self.claim_view(claim).await
    }

    /// Partially update a claim's text.
    pub async fn update_claim(
        &self,
        id: &str,
        params: UpdateClaim,
    ) -> GraphResult<(Claim, Vec<InlineRef>)> {
        let mut claim = self.require_claim(id).await?;

        if let Some(text) = params.claim_text {
            required("claim_text", &text)?;
            claim.claim_text = text;
        }
        claim.updated_at = Utc::now();

        self.storage.update_claim(&claim).await?;

        let links = self
            .resolve_refs(&claim.investigation_id, &claim.claim_text)
            .await?;
        let unresolved = Self::unresolved_of(&links);

        Ok((claim, unresolved))
    }

    /// Delete a claim, cascading to its counterarguments and evidence and
    /// compacting sibling positions. References to the claim elsewhere
    /// become dangling; the delete is never blocked.
    pub async fn delete_claim(&self, id: &str) -> GraphResult<()> {
        self.storage.delete_claim(id).await?;
        Ok(())
    }

    /// Move a claim one step up or down within its investigation.
    pub async fn reorder_claim(&self, id: &str, direction: Direction) -> GraphResult<MoveResult> {
        let result = self.storage.move_claim(id, direction).await?;
        if !result.moved {
            return Err(boundary_error("claim", id, direction, result.position));
        }
        Ok(result)
    }

    /// Create a counterargument at the end of a claim's sequence.
    pub async fn create_counterargument(
        &self,
        claim_id: &str,
        params: CounterargumentParams,
    ) -> GraphResult<Counterargument> {
        required("counter_text", &params.counter_text)?;

        let mut counterargument = Counterargument::new(claim_id, params.counter_text);
        if let Some(rebuttal) = params.rebuttal_text {
            counterargument = counterargument.with_rebuttal(rebuttal);
        }

        Ok(self.storage.create_counterargument(counterargument).await?)
    }

    /// Partially update a counterargument belonging to a claim.
    pub async fn update_counterargument(
        &self,
        claim_id: &str,
        id: &str,
        params: CounterargumentUpdate,
    ) -> GraphResult<Counterargument> {
        let mut counterargument = self.require_counterargument(claim_id, id).await?;

        if let Some(text) = params.counter_text {
            required("counter_text", &text)?;
            counterargument.counter_text = text;
        }
        if let Some(rebuttal) = params.rebuttal_text {
            counterargument.rebuttal_text = rebuttal;
        }
        counterargument.updated_at = Utc::now();

        self.storage.update_counterargument(&counterargument).await?;
        Ok(counterargument)
    }

    /// Delete a counterargument and compact sibling positions.
    pub async fn delete_counterargument(&self, claim_id: &str, id: &str) -> GraphResult<()> {
        // Scope check before the delete so a mismatched parent is NotFound.
        self.require_counterargument(claim_id, id).await?;
        self.storage.delete_counterargument(id).await?;
        Ok(())
    }

    /// Move a counterargument one step up or down within its claim.
    pub async fn reorder_counterargument(
        &self,
        claim_id: &str,
        id: &str,
        direction: Direction,
    ) -> GraphResult<MoveResult> {
        self.require_counterargument(claim_id, id).await?;
        let result = self.storage.move_counterargument(id, direction).await?;
        if !result.moved {
            return Err(boundary_error("counterargument", id, direction, result.position));
        }
        Ok(result)
    }

    /// Create evidence for a claim.
    pub async fn create_evidence(
        &self,
        claim_id: &str,
        params: EvidenceParams,
    ) -> GraphResult<Evidence> {
        required("source_title", &params.source_title)?;

        let mut evidence = Evidence::new(claim_id, params.source_title, params.source_type);
        evidence.source_url = params.source_url;
        evidence.key_quote = params.key_quote;
        evidence.key_point = params.key_point;
        evidence.kb_resource_id = params.kb_resource_id;

        if let Some(kb_id) = &evidence.kb_resource_id {
            self.check_kb_resource(kb_id).await;
        }

        Ok(self.storage.create_evidence(evidence).await?)
    }

    /// Partially update evidence belonging to a claim.
    pub async fn update_evidence(
        &self,
        claim_id: &str,
        id: &str,
        params: EvidenceUpdate,
    ) -> GraphResult<Evidence> {
        let mut evidence = self.require_evidence(claim_id, id).await?;

        if let Some(title) = params.source_title {
            required("source_title", &title)?;
            evidence.source_title = title;
        }
        if let Some(source_type) = params.source_type {
            evidence.source_type = source_type;
        }
        if let Some(url) = params.source_url {
            evidence.source_url = url;
        }
        if let Some(quote) = params.key_quote {
            evidence.key_quote = quote;
        }
        if let Some(point) = params.key_point {
            evidence.key_point = point;
        }
        if let Some(kb_id) = params.kb_resource_id {
            evidence.kb_resource_id = kb_id;
        }
        evidence.updated_at = Utc::now();

        if let Some(kb_id) = &evidence.kb_resource_id {
            self.check_kb_resource(kb_id).await;
        }

        self.storage.update_evidence(&evidence).await?;
        Ok(evidence)
    }

    /// Delete evidence belonging to a claim.
    pub async fn delete_evidence(&self, claim_id: &str, id: &str) -> GraphResult<()> {
        self.require_evidence(claim_id, id).await?;
        self.storage.delete_evidence(id).await?;
        Ok(())
    }

    pub(crate) async fn claim_view(&self, claim: Claim) -> GraphResult<ClaimView> {
        let links = self
            .resolve_refs(&claim.investigation_id, &claim.claim_text)
            .await?;
        let counterarguments = self.storage.list_counterarguments(&claim.id).await?;

        let mut evidence = Vec::new();
        for record in self.storage.list_evidence(&claim.id).await? {
            let kb_resource = match &record.kb_resource_id {
                Some(kb_id) => self.kb_resource_for(kb_id).await,
                None => None,
            };
            evidence.push(EvidenceView {
                evidence: record,
                kb_resource,
            });
        }

        Ok(ClaimView {
            id: claim.id,
            investigation_id: claim.investigation_id,
            claim_text: claim.claim_text,
            position: claim.position,
            links,
            counterargument_count: counterarguments.len() as i64,
            evidence_count: evidence.len() as i64,
            counterarguments,
            evidence,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        })
    }

    async fn require_claim(&self, id: &str) -> GraphResult<Claim> {
        self.storage
            .get_claim(id)
            .await?
            .ok_or_else(|| GraphError::NotFound {
                kind: "claim".to_string(),
                reference: id.to_string(),
            })
    }

    async fn require_counterargument(
        &self,
        claim_id: &str,
        id: &str,
    ) -> GraphResult<Counterargument> {
        self.storage
            .get_counterargument(id)
            .await?
            .filter(|c| c.claim_id == claim_id)
            .ok_or_else(|| GraphError::NotFound {
                kind: "counterargument".to_string(),
                reference: id.to_string(),
            })
    }

    async fn require_evidence(&self, claim_id: &str, id: &str) -> GraphResult<Evidence> {
        self.storage
            .get_evidence(id)
            .await?
            .filter(|e| e.claim_id == claim_id)
            .ok_or_else(|| GraphError::NotFound {
                kind: "evidence".to_string(),
                reference: id.to_string(),
            })
    }
}

fn boundary_error(kind: &str, id: &str, direction: Direction, position: i64) -> GraphError {
    let edge = match direction {
        Direction::Up => "first",
        Direction::Down => "last",
    };
    GraphError::InvalidOperation {
        message: format!(
            "{} {} is already {} (position {})",
            kind, id, edge, position
        ),
    }
}
