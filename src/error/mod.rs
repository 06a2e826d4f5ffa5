use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(#[from] KbError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Investigation not found: {reference}")]
    InvestigationNotFound { reference: String },

    #[error("Definition not found: {slug}")]
    DefinitionNotFound { slug: String },

    #[error("Claim not found: {claim_id}")]
    ClaimNotFound { claim_id: String },

    #[error("Counterargument not found: {counterargument_id}")]
    CounterargumentNotFound { counterargument_id: String },

    #[error("Evidence not found: {evidence_id}")]
    EvidenceNotFound { evidence_id: String },

    #[error("No free slug for '{base}' in scope {scope}")]
    SlugSpaceExhausted { scope: String, base: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Domain errors surfaced to API callers.
///
/// Every condition here is deterministic given the same input and state, so
/// nothing in this taxonomy is retried internally.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("{kind} not found: {reference}")]
    NotFound { kind: String, reference: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<StorageError> for GraphError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvestigationNotFound { reference } => GraphError::NotFound {
                kind: "investigation".to_string(),
                reference,
            },
            StorageError::DefinitionNotFound { slug } => GraphError::NotFound {
                kind: "definition".to_string(),
                reference: slug,
            },
            StorageError::ClaimNotFound { claim_id } => GraphError::NotFound {
                kind: "claim".to_string(),
                reference: claim_id,
            },
            StorageError::CounterargumentNotFound { counterargument_id } => GraphError::NotFound {
                kind: "counterargument".to_string(),
                reference: counterargument_id,
            },
            StorageError::EvidenceNotFound { evidence_id } => GraphError::NotFound {
                kind: "evidence".to_string(),
                reference: evidence_id,
            },
            StorageError::SlugSpaceExhausted { scope, base } => GraphError::Conflict {
                message: format!("no free slug for '{}' in scope {}", base, scope),
            },
            other => GraphError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// Knowledge-base collaborator errors
#[derive(Debug, Error)]
pub enum KbError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for domain operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for knowledge-base operations
pub type KbResult<T> = Result<T, KbError>;
