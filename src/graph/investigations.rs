use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{required, DefinitionView, GraphService};
use crate::error::{GraphError, GraphResult};
use crate::links::{InlineRef, ResolvedLink};
use crate::slugs;
use crate::storage::{
    Investigation, InvestigationStatus, InvestigationSummary, Storage,
};

/// Parameters for creating an investigation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInvestigation {
    /// Display title (required, non-empty).
    pub title: String,
    /// Rich-text overview body.
    #[serde(default)]
    pub overview_html: Option<String>,
    /// Initial status (defaults to draft).
    #[serde(default)]
    pub status: Option<InvestigationStatus>,
    /// Explicit slug override; derived from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
}

/// Parameters for a partial investigation update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInvestigation {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New overview body.
    #[serde(default)]
    pub overview_html: Option<String>,
    /// New status.
    #[serde(default)]
    pub status: Option<InvestigationStatus>,
}

/// Full investigation document as served to readers.
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationView {
    /// Investigation identifier.
    pub id: String,
    /// Investigation slug.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Raw overview body; links are annotated separately, never rewritten.
    pub overview_html: String,
    /// Publication status.
    pub status: InvestigationStatus,
    /// Inline references in the overview with their current resolution.
    pub links: Vec<ResolvedLink>,
    /// Definitions, by term.
    pub definitions: Vec<DefinitionView>,
    /// Claims in display order, with their counterarguments and evidence.
    pub claims: Vec<super::ClaimView>,
    /// When the investigation was created.
    pub created_at: chrono::DateTime<Utc>,
    /// When the investigation was last updated.
    pub updated_at: chrono::DateTime<Utc>,
}

impl GraphService {
    /// List investigation summaries, most recently updated first.
    pub async fn list_investigations(&self) -> GraphResult<Vec<InvestigationSummary>> {
        Ok(self.storage.list_investigation_summaries().await?)
    }

    /// Create an investigation. Returns the stored record and any overview
    /// references that do not yet resolve (warnings, not failures).
    pub async fn create_investigation(
        &self,
        params: CreateInvestigation,
    ) -> GraphResult<(Investigation, Vec<InlineRef>)> {
        required("title", &params.title)?;
        let slug_base = slugs::slug_base("slug", &params.title, params.slug.as_deref())?;

        let mut investigation = Investigation::new(params.title);
        if let Some(overview) = params.overview_html {
            investigation = investigation.with_overview(overview);
        }
        if let Some(status) = params.status {
            investigation = investigation.with_status(status);
        }

        let investigation = self
            .storage
            .create_investigation(investigation, &slug_base)
            .await?;

        let links = self
            .resolve_refs(&investigation.id, &investigation.overview_html)
            .await?;
        let unresolved = Self::unresolved_of(&links);

        info!(slug = %investigation.slug, "Investigation created");
        Ok((investigation, unresolved))
    }

    /// Read the full investigation document by slug.
    pub async fn get_investigation(&self, slug: &str) -> GraphResult<InvestigationView> {
        let investigation = self.require_investigation(slug).await?;

        let links = self
            .resolve_refs(&investigation.id, &investigation.overview_html)
            .await?;
        let definitions = self.definition_views(&investigation.id).await?;

        let mut claims = Vec::new();
        for claim in self.storage.list_claims(&investigation.id).await? {
            claims.push(self.claim_view(claim).await?);
        }

        Ok(InvestigationView {
            id: investigation.id,
            slug: investigation.slug,
            title: investigation.title,
            overview_html: investigation.overview_html,
            status: investigation.status,
            links,
            definitions,
            claims,
            created_at: investigation.created_at,
            updated_at: investigation.updated_at,
        })
    }

    /// Partially update an investigation; unspecified fields are unchanged.
    /// The slug is immutable.
    pub async fn update_investigation(
        &self,
        slug: &str,
        params: UpdateInvestigation,
    ) -> GraphResult<(Investigation, Vec<InlineRef>)> {
        let mut investigation = self.require_investigation(slug).await?;

        if let Some(title) = params.title {
            required("title", &title)?;
            investigation.title = title;
        }
        if let Some(overview) = params.overview_html {
            investigation.overview_html = overview;
        }
        if let Some(status) = params.status {
            investigation.status = status;
        }
        investigation.updated_at = Utc::now();

        self.storage.update_investigation(&investigation).await?;

        let links = self
            .resolve_refs(&investigation.id, &investigation.overview_html)
            .await?;
        let unresolved = Self::unresolved_of(&links);

        Ok((investigation, unresolved))
    }

    /// Delete an investigation and its whole subtree atomically.
    pub async fn delete_investigation(&self, slug: &str) -> GraphResult<()> {
        let investigation = self.require_investigation(slug).await?;
        self.storage.delete_investigation(&investigation.id).await?;
        info!(slug = %slug, "Investigation deleted");
        Ok(())
    }

    /// Look up an investigation by slug or fail with NotFound.
    pub(crate) async fn require_investigation(&self, slug: &str) -> GraphResult<Investigation> {
        self.storage
            .get_investigation_by_slug(slug)
            .await?
            .ok_or_else(|| GraphError::NotFound {
                kind: "investigation".to_string(),
                reference: slug.to_string(),
            })
    }
}
