//! Storage layer for the investigation knowledge graph.
//!
//! This module provides SQLite-based storage for investigations, definitions,
//! claims, counterarguments, evidence, and the slug index.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;
use crate::ordering::{Direction, MoveResult};

/// A top-level structured-argument document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investigation {
    /// Unique investigation identifier.
    pub id: String,
    /// Globally unique, immutable slug.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Rich-text overview body (may embed inline reference markers).
    pub overview_html: String,
    /// Publication status.
    pub status: InvestigationStatus,
    /// When the investigation was created.
    pub created_at: DateTime<Utc>,
    /// When the investigation was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Publication status of an investigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    /// Work in progress.
    #[default]
    Draft,
    /// Visible to readers.
    Published,
    /// Retired but retained.
    Archived,
}

impl std::fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvestigationStatus::Draft => write!(f, "draft"),
            InvestigationStatus::Published => write!(f, "published"),
            InvestigationStatus::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for InvestigationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(InvestigationStatus::Draft),
            "published" => Ok(InvestigationStatus::Published),
            "archived" => Ok(InvestigationStatus::Archived),
            _ => Err(format!("Unknown investigation status: {}", s)),
        }
    }
}

/// A term/body pair scoped to one investigation, addressed by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    /// Unique definition identifier.
    pub id: String,
    /// Owning investigation.
    pub investigation_id: String,
    /// Display text of the term.
    pub term: String,
    /// Slug, unique within the investigation, immutable.
    pub slug: String,
    /// Rich-text definition body.
    pub definition_html: String,
    /// Slugs of related definitions in the same investigation. May dangle;
    /// resolved at read time.
    pub see_also: Vec<String>,
    /// When the definition was created.
    pub created_at: DateTime<Utc>,
    /// When the definition was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An ordered assertion within an investigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique claim identifier.
    pub id: String,
    /// Owning investigation.
    pub investigation_id: String,
    /// Claim text (may embed inline reference markers).
    pub claim_text: String,
    /// Dense 0-based display position within the investigation.
    pub position: i64,
    /// When the claim was created.
    pub created_at: DateTime<Utc>,
    /// When the claim was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An objection to a claim, ordered within its claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterargument {
    /// Unique counterargument identifier.
    pub id: String,
    /// Owning claim.
    pub claim_id: String,
    /// The objection text.
    pub counter_text: String,
    /// Optional rebuttal to the objection.
    pub rebuttal_text: Option<String>,
    /// Dense 0-based display position within the claim.
    pub position: i64,
    /// When the counterargument was created.
    pub created_at: DateTime<Utc>,
    /// When the counterargument was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A sourced fact or quote supporting a claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique evidence identifier.
    pub id: String,
    /// Owning claim.
    pub claim_id: String,
    /// Title of the source.
    pub source_title: String,
    /// Kind of source.
    pub source_type: SourceType,
    /// Optional URL of the source.
    pub source_url: Option<String>,
    /// Optional verbatim quote.
    pub key_quote: Option<String>,
    /// Optional paraphrased takeaway.
    pub key_point: Option<String>,
    /// Optional back-reference to an external knowledge-base resource
    /// (opaque to this service).
    pub kb_resource_id: Option<String>,
    /// When the evidence was created.
    pub created_at: DateTime<Utc>,
    /// When the evidence was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Kind of evidence source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Peer-reviewed academic paper.
    AcademicPaper,
    /// News article.
    NewsArticle,
    /// Think-tank publication.
    ThinkTank,
    /// Government report.
    GovernmentReport,
    /// Book.
    Book,
    /// Interview.
    Interview,
    /// Dataset.
    Dataset,
    /// Legal document.
    LegalDocument,
    /// Opinion piece.
    Opinion,
    /// Primary source.
    PrimarySource,
    /// Free-form source kind.
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::AcademicPaper => write!(f, "academic_paper"),
            SourceType::NewsArticle => write!(f, "news_article"),
            SourceType::ThinkTank => write!(f, "think_tank"),
            SourceType::GovernmentReport => write!(f, "government_report"),
            SourceType::Book => write!(f, "book"),
            SourceType::Interview => write!(f, "interview"),
            SourceType::Dataset => write!(f, "dataset"),
            SourceType::LegalDocument => write!(f, "legal_document"),
            SourceType::Opinion => write!(f, "opinion"),
            SourceType::PrimarySource => write!(f, "primary_source"),
            SourceType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "academic_paper" => SourceType::AcademicPaper,
            "news_article" => SourceType::NewsArticle,
            "think_tank" => SourceType::ThinkTank,
            "government_report" => SourceType::GovernmentReport,
            "book" => SourceType::Book,
            "interview" => SourceType::Interview,
            "dataset" => SourceType::Dataset,
            "legal_document" => SourceType::LegalDocument,
            "opinion" => SourceType::Opinion,
            "primary_source" => SourceType::PrimarySource,
            other => SourceType::Other(other.to_string()),
        })
    }
}

/// Lightweight investigation listing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationSummary {
    /// Investigation identifier.
    pub id: String,
    /// Investigation slug.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Publication status.
    pub status: InvestigationStatus,
    /// Number of definitions.
    pub definition_count: i64,
    /// Number of claims.
    pub claim_count: i64,
    /// When the investigation was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Kind of searchable document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    /// A definition (term + body).
    Definition,
    /// A claim (text).
    Claim,
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocKind::Definition => write!(f, "definition"),
            DocKind::Claim => write!(f, "claim"),
        }
    }
}

impl std::str::FromStr for DocKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "definition" => Ok(DocKind::Definition),
            "claim" => Ok(DocKind::Claim),
            _ => Err(format!("Unknown document kind: {}", s)),
        }
    }
}

/// A searchable document flattened from the graph.
#[derive(Debug, Clone)]
pub struct SearchDoc {
    /// Document kind.
    pub kind: DocKind,
    /// Entity identifier.
    pub id: String,
    /// Containing investigation id.
    pub investigation_id: String,
    /// Containing investigation slug.
    pub investigation_slug: String,
    /// Term for definitions; None for claims.
    pub title: Option<String>,
    /// Body text (HTML for definitions, plain-ish for claims).
    pub body: String,
    /// When the entity was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Investigation {
    /// Create a new draft investigation. The slug is assigned at insert time
    /// by the slug index.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: String::new(),
            title: title.into(),
            overview_html: String::new(),
            status: InvestigationStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the overview body
    pub fn with_overview(mut self, overview_html: impl Into<String>) -> Self {
        self.overview_html = overview_html.into();
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: InvestigationStatus) -> Self {
        self.status = status;
        self
    }
}

impl Definition {
    /// Create a new definition for an investigation. The slug is assigned at
    /// insert time by the slug index.
    pub fn new(investigation_id: impl Into<String>, term: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            investigation_id: investigation_id.into(),
            term: term.into(),
            slug: String::new(),
            definition_html: String::new(),
            see_also: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the definition body
    pub fn with_body(mut self, definition_html: impl Into<String>) -> Self {
        self.definition_html = definition_html.into();
        self
    }

    /// Set the "see also" slugs
    pub fn with_see_also(mut self, see_also: Vec<String>) -> Self {
        self.see_also = see_also;
        self
    }
}

impl Claim {
    /// Create a new claim. The position is assigned at insert time
    /// (append at end).
    pub fn new(investigation_id: impl Into<String>, claim_text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            investigation_id: investigation_id.into(),
            claim_text: claim_text.into(),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Counterargument {
    /// Create a new counterargument. The position is assigned at insert time
    /// (append at end).
    pub fn new(claim_id: impl Into<String>, counter_text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            claim_id: claim_id.into(),
            counter_text: counter_text.into(),
            rebuttal_text: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the rebuttal text
    pub fn with_rebuttal(mut self, rebuttal_text: impl Into<String>) -> Self {
        self.rebuttal_text = Some(rebuttal_text.into());
        self
    }
}

impl Evidence {
    /// Create a new piece of evidence for a claim
    pub fn new(
        claim_id: impl Into<String>,
        source_title: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            claim_id: claim_id.into(),
            source_title: source_title.into(),
            source_type,
            source_url: None,
            key_quote: None,
            key_point: None,
            kb_resource_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the source URL
    pub fn with_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = Some(source_url.into());
        self
    }

    /// Set the key quote
    pub fn with_quote(mut self, key_quote: impl Into<String>) -> Self {
        self.key_quote = Some(key_quote.into());
        self
    }

    /// Set the key point
    pub fn with_point(mut self, key_point: impl Into<String>) -> Self {
        self.key_point = Some(key_point.into());
        self
    }

    /// Set the knowledge-base back-reference
    pub fn with_kb_resource(mut self, kb_resource_id: impl Into<String>) -> Self {
        self.kb_resource_id = Some(kb_resource_id.into());
        self
    }
}

/// Storage trait for database operations.
///
/// Defines all persistence for the knowledge graph: entity CRUD, the slug
/// index, sibling ordering, and the flattened search corpus. Operations that
/// touch a shared ordering sequence or the slug index execute inside a single
/// transaction, as do cascading deletes.
#[async_trait]
pub trait Storage: Send + Sync {
    // Investigation operations

    /// Insert an investigation, reserving its slug from `slug_base`
    /// (suffixing on collision). Returns the stored record with the final
    /// slug.
    async fn create_investigation(
        &self,
        investigation: Investigation,
        slug_base: &str,
    ) -> StorageResult<Investigation>;
    /// Get an investigation by id.
    async fn get_investigation(&self, id: &str) -> StorageResult<Option<Investigation>>;
    /// Get an investigation by slug.
    async fn get_investigation_by_slug(&self, slug: &str)
        -> StorageResult<Option<Investigation>>;
    /// List investigation summaries, most recently updated first.
    async fn list_investigation_summaries(&self) -> StorageResult<Vec<InvestigationSummary>>;
    /// Update an existing investigation (title, overview, status).
    async fn update_investigation(&self, investigation: &Investigation) -> StorageResult<()>;
    /// Delete an investigation and cascade to all children, atomically
    /// tombstoning every slug in its scope.
    async fn delete_investigation(&self, id: &str) -> StorageResult<()>;

    // Definition operations

    /// Insert a definition, reserving its slug within the investigation
    /// scope. Returns the stored record with the final slug.
    async fn create_definition(
        &self,
        definition: Definition,
        slug_base: &str,
    ) -> StorageResult<Definition>;
    /// Get a definition by investigation id and slug.
    async fn get_definition(
        &self,
        investigation_id: &str,
        slug: &str,
    ) -> StorageResult<Option<Definition>>;
    /// List all definitions of an investigation, by term.
    async fn list_definitions(&self, investigation_id: &str) -> StorageResult<Vec<Definition>>;
    /// Update an existing definition (term, body, see-also; never the slug).
    async fn update_definition(&self, definition: &Definition) -> StorageResult<()>;
    /// Delete a definition and tombstone its slug.
    async fn delete_definition(&self, investigation_id: &str, slug: &str) -> StorageResult<()>;

    // Claim operations

    /// Insert a claim at the end of its investigation's sequence. Returns the
    /// stored record with the assigned position.
    async fn create_claim(&self, claim: Claim) -> StorageResult<Claim>;
    /// Get a claim by id.
    async fn get_claim(&self, id: &str) -> StorageResult<Option<Claim>>;
    /// List all claims of an investigation in display order.
    async fn list_claims(&self, investigation_id: &str) -> StorageResult<Vec<Claim>>;
    /// Update an existing claim's text.
    async fn update_claim(&self, claim: &Claim) -> StorageResult<()>;
    /// Delete a claim, cascade to its children, and compact sibling
    /// positions.
    async fn delete_claim(&self, id: &str) -> StorageResult<()>;
    /// Move a claim one step up or down. Positions are re-read inside the
    /// transaction; a boundary move reports `moved: false` with the current
    /// position.
    async fn move_claim(&self, id: &str, direction: Direction) -> StorageResult<MoveResult>;

    // Counterargument operations

    /// Insert a counterargument at the end of its claim's sequence.
    async fn create_counterargument(
        &self,
        counterargument: Counterargument,
    ) -> StorageResult<Counterargument>;
    /// Get a counterargument by id.
    async fn get_counterargument(&self, id: &str) -> StorageResult<Option<Counterargument>>;
    /// List all counterarguments of a claim in display order.
    async fn list_counterarguments(&self, claim_id: &str) -> StorageResult<Vec<Counterargument>>;
    /// Update an existing counterargument.
    async fn update_counterargument(&self, counterargument: &Counterargument)
        -> StorageResult<()>;
    /// Delete a counterargument and compact sibling positions.
    async fn delete_counterargument(&self, id: &str) -> StorageResult<()>;
    /// Move a counterargument one step up or down.
    async fn move_counterargument(
        &self,
        id: &str,
        direction: Direction,
    ) -> StorageResult<MoveResult>;

    // Evidence operations

    /// Insert a piece of evidence.
    async fn create_evidence(&self, evidence: Evidence) -> StorageResult<Evidence>;
    /// Get evidence by id.
    async fn get_evidence(&self, id: &str) -> StorageResult<Option<Evidence>>;
    /// List all evidence of a claim, oldest first.
    async fn list_evidence(&self, claim_id: &str) -> StorageResult<Vec<Evidence>>;
    /// Update existing evidence.
    async fn update_evidence(&self, evidence: &Evidence) -> StorageResult<()>;
    /// Delete evidence by id.
    async fn delete_evidence(&self, id: &str) -> StorageResult<()>;

    // Slug index

    /// Resolve a live slug within a scope to its entity id. Tombstoned slugs
    /// do not resolve.
    async fn resolve_slug(&self, scope: &str, slug: &str) -> StorageResult<Option<String>>;

    // Search corpus

    /// Flatten all definitions and claims into searchable documents.
    async fn search_docs(&self) -> StorageResult<Vec<SearchDoc>>;
}
