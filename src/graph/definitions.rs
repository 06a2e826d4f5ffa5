use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{required, GraphService};
use crate::error::{GraphError, GraphResult};
use crate::links::LinkStatus;
use crate::slugs;
use crate::storage::{Definition, Storage};

/// Parameters for creating a definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDefinition {
    /// Display text of the term (required, non-empty).
    pub term: String,
    /// Rich-text definition body.
    #[serde(default)]
    pub definition_html: Option<String>,
    /// Slugs of related definitions; may forward-reference.
    #[serde(default)]
    pub see_also: Option<Vec<String>>,
    /// Explicit slug override; derived from the term when absent.
    #[serde(default)]
    pub slug: Option<String>,
}

/// Parameters for a partial definition update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDefinition {
    /// New term text. Renaming never changes the slug.
    #[serde(default)]
    pub term: Option<String>,
    /// New definition body.
    #[serde(default)]
    pub definition_html: Option<String>,
    /// Replacement see-also list.
    #[serde(default)]
    pub see_also: Option<Vec<String>>,
}

/// A see-also reference with its current resolution.
#[derive(Debug, Clone, Serialize)]
pub struct SeeAlsoRef {
    /// Target definition slug as written.
    pub slug: String,
    /// Whether the target currently resolves.
    pub status: LinkStatus,
}

/// Definition as served to readers.
#[derive(Debug, Clone, Serialize)]
pub struct DefinitionView {
    /// Definition identifier.
    pub id: String,
    /// Display text of the term.
    pub term: String,
    /// Definition slug (immutable).
    pub slug: String,
    /// Raw definition body.
    pub definition_html: String,
    /// See-also references, resolved against current state.
    pub see_also: Vec<SeeAlsoRef>,
    /// When the definition was created.
    pub created_at: chrono::DateTime<Utc>,
    /// When the definition was last updated.
    pub updated_at: chrono::DateTime<Utc>,
}

impl GraphService {
    /// List an investigation's definitions with resolved see-also refs.
    pub async fn list_definitions(
        &self,
        investigation_slug: &str,
    ) -> GraphResult<Vec<DefinitionView>> {
        let investigation = self.require_investigation(investigation_slug).await?;
        self.definition_views(&investigation.id).await
    }

    /// Create a definition within an investigation.
    pub async fn create_definition(
        &self,
        investigation_slug: &str,
        params: CreateDefinition,
    ) -> GraphResult<DefinitionView> {
        let investigation = self.require_investigation(investigation_slug).await?;

        required("term", &params.term)?;
        let slug_base = slugs::slug_base("slug", &params.term, params.slug.as_deref())?;
        let see_also = validate_see_also(params.see_also.unwrap_or_default())?;

        let mut definition = Definition::new(&investigation.id, params.term);
        if let Some(body) = params.definition_html {
            definition = definition.with_body(body);
        }
        definition = definition.with_see_also(see_also);

        let definition = self.storage.create_definition(definition, &slug_base).await?;
        self.definition_view(definition).await
    }

    /// Partially update a definition; the slug never changes.
    pub async fn update_definition(
        &self,
        investigation_slug: &str,
        definition_slug: &str,
        params: UpdateDefinition,
    ) -> GraphResult<DefinitionView> {
        let investigation = self.require_investigation(investigation_slug).await?;

        let mut definition = self
            .storage
            .get_definition(&investigation.id, definition_slug)
            .await?
            .ok_or_else(|| GraphError::NotFound {
                kind: "definition".to_string(),
                reference: definition_slug.to_string(),
            })?;

        if let Some(term) = params.term {
            required("term", &term)?;
            definition.term = term;
        }
        if let Some(body) = params.definition_html {
            definition.definition_html = body;
        }
        if let Some(see_also) = params.see_also {
            definition.see_also = validate_see_also(see_also)?;
        }
        definition.updated_at = Utc::now();

        self.storage.update_definition(&definition).await?;
        self.definition_view(definition).await
    }

    /// Delete a definition, tombstoning its slug so links to it dangle
    /// instead of repointing.
    pub async fn delete_definition(
        &self,
        investigation_slug: &str,
        definition_slug: &str,
    ) -> GraphResult<()> {
        let investigation = self.require_investigation(investigation_slug).await?;
        self.storage
            .delete_definition(&investigation.id, definition_slug)
            .await?;
        Ok(())
    }

    pub(crate) async fn definition_views(
        &self,
        investigation_id: &str,
    ) -> GraphResult<Vec<DefinitionView>> {
        let mut views = Vec::new();
        for definition in self.storage.list_definitions(investigation_id).await? {
            views.push(self.definition_view(definition).await?);
        }
        Ok(views)
    }

    pub(crate) async fn definition_view(
        &self,
        definition: Definition,
    ) -> GraphResult<DefinitionView> {
        let mut see_also = Vec::with_capacity(definition.see_also.len());
        for slug in &definition.see_also {
            let status = if self
                .storage
                .resolve_slug(&definition.investigation_id, slug)
                .await?
                .is_some()
            {
                LinkStatus::Live
            } else {
                LinkStatus::Dangling
            };
            see_also.push(SeeAlsoRef {
                slug: slug.clone(),
                status,
            });
        }

        Ok(DefinitionView {
            id: definition.id,
            term: definition.term,
            slug: definition.slug,
            definition_html: definition.definition_html,
            see_also,
            created_at: definition.created_at,
            updated_at: definition.updated_at,
        })
    }
}

/// See-also entries must be well-formed slugs; they may still dangle.
fn validate_see_also(see_also: Vec<String>) -> GraphResult<Vec<String>> {
    for slug in &see_also {
        if !slugs::is_valid_slug(slug) {
            return Err(GraphError::Validation {
                field: "see_also".to_string(),
                reason: format!("'{}' is not a valid slug", slug),
            });
        }
    }
    Ok(see_also)
}
