use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::{
    Claim, Counterargument, Definition, DocKind, Evidence, Investigation, InvestigationSummary,
    SearchDoc, Storage,
};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::ordering::{plan_move, Direction, MoveOutcome, MoveResult};
use crate::slugs::{self, GLOBAL_SCOPE, MAX_CANDIDATES};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory storage instance (tests)
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .foreign_keys(true);

        // A single never-idle connection: closing it would drop the database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Reserve the first free slug candidate within a scope, inside the
    /// caller's transaction.
    async fn reserve_slug(
        tx: &mut Transaction<'_, Sqlite>,
        scope: &str,
        base: &str,
        entity_id: &str,
        now: &DateTime<Utc>,
    ) -> StorageResult<String> {
        for attempt in 0..MAX_CANDIDATES {
            let candidate = slugs::candidate(base, attempt);
            let taken: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM slugs WHERE scope = ? AND slug = ?")
                    .bind(scope)
                    .bind(&candidate)
                    .fetch_optional(&mut **tx)
                    .await?;

            if taken.is_none() {
                sqlx::query(
                    "INSERT INTO slugs (scope, slug, entity_id, released_at, created_at) \
                     VALUES (?, ?, ?, NULL, ?)",
                )
                .bind(scope)
                .bind(&candidate)
                .bind(entity_id)
                .bind(now.to_rfc3339())
                .execute(&mut **tx)
                .await?;
                return Ok(candidate);
            }
        }

        Err(StorageError::SlugSpaceExhausted {
            scope: scope.to_string(),
            base: base.to_string(),
        })
    }

    /// Ensure an investigation row exists, inside the caller's transaction.
    async fn require_investigation(
        tx: &mut Transaction<'_, Sqlite>,
        investigation_id: &str,
    ) -> StorageResult<()> {
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM investigations WHERE id = ?")
                .bind(investigation_id)
                .fetch_optional(&mut **tx)
                .await?;
        if exists.is_none() {
            return Err(StorageError::InvestigationNotFound {
                reference: investigation_id.to_string(),
            });
        }
        Ok(())
    }

    /// Swap two sibling positions, re-reading current state inside one
    /// transaction. Shared by claims and counterarguments; `table` and
    /// `parent_col` name the sibling set.
    async fn move_row(
        &self,
        table: &str,
        parent_col: &str,
        id: &str,
        direction: Direction,
    ) -> StorageResult<Option<MoveResult>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, i64)> = sqlx::query_as(&format!(
            "SELECT {}, position FROM {} WHERE id = ?",
            parent_col, table
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((parent_id, position)) = row else {
            return Ok(None);
        };

        let (len,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            table, parent_col
        ))
        .bind(&parent_id)
        .fetch_one(&mut *tx)
        .await?;

        match plan_move(position, len, direction) {
            MoveOutcome::AtBoundary => Ok(Some(MoveResult {
                position,
                moved: false,
            })),
            MoveOutcome::SwapWith(target) => {
                let (neighbor_id,): (String,) = sqlx::query_as(&format!(
                    "SELECT id FROM {} WHERE {} = ? AND position = ?",
                    table, parent_col
                ))
                .bind(&parent_id)
                .bind(target)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StorageError::Query {
                    message: format!(
                        "position sequence corrupt in {} for parent {}",
                        table, parent_id
                    ),
                })?;

                let now = Utc::now().to_rfc3339();
                sqlx::query(&format!(
                    "UPDATE {} SET position = ?, updated_at = ? WHERE id = ?",
                    table
                ))
                .bind(target)
                .bind(&now)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                sqlx::query(&format!(
                    "UPDATE {} SET position = ?, updated_at = ? WHERE id = ?",
                    table
                ))
                .bind(position)
                .bind(&now)
                .bind(&neighbor_id)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;

                Ok(Some(MoveResult {
                    position: target,
                    moved: true,
                }))
            }
        }
    }

    /// Delete a row and close the position gap it leaves, inside one
    /// transaction. Returns false when the row does not exist.
    async fn delete_and_compact(
        &self,
        table: &str,
        parent_col: &str,
        id: &str,
    ) -> StorageResult<bool> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, i64)> = sqlx::query_as(&format!(
            "SELECT {}, position FROM {} WHERE id = ?",
            parent_col, table
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((parent_id, position)) = row else {
            return Ok(false);
        };

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(&format!(
            "UPDATE {} SET position = position - 1 WHERE {} = ? AND position > ?",
            table, parent_col
        ))
        .bind(&parent_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_investigation(
        &self,
        mut investigation: Investigation,
        slug_base: &str,
    ) -> StorageResult<Investigation> {
        let mut tx = self.pool.begin().await?;

        let slug = Self::reserve_slug(
            &mut tx,
            GLOBAL_SCOPE,
            slug_base,
            &investigation.id,
            &investigation.created_at,
        )
        .await?;
        investigation.slug = slug;

        sqlx::query(
            r#"
            INSERT INTO investigations (id, slug, title, overview_html, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&investigation.id)
        .bind(&investigation.slug)
        .bind(&investigation.title)
        .bind(&investigation.overview_html)
        .bind(investigation.status.to_string())
        .bind(investigation.created_at.to_rfc3339())
        .bind(investigation.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(investigation)
    }

    async fn get_investigation(&self, id: &str) -> StorageResult<Option<Investigation>> {
        let row: Option<InvestigationRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, overview_html, status, created_at, updated_at
            FROM investigations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_investigation_by_slug(
        &self,
        slug: &str,
    ) -> StorageResult<Option<Investigation>> {
        let row: Option<InvestigationRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, overview_html, status, created_at, updated_at
            FROM investigations
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_investigation_summaries(&self) -> StorageResult<Vec<InvestigationSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.slug, i.title, i.status, i.updated_at,
                   (SELECT COUNT(*) FROM definitions d WHERE d.investigation_id = i.id) AS definition_count,
                   (SELECT COUNT(*) FROM claims c WHERE c.investigation_id = i.id) AS claim_count
            FROM investigations i
            ORDER BY i.updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_investigation(&self, investigation: &Investigation) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE investigations
            SET title = ?, overview_html = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&investigation.title)
        .bind(&investigation.overview_html)
        .bind(investigation.status.to_string())
        .bind(investigation.updated_at.to_rfc3339())
        .bind(&investigation.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::InvestigationNotFound {
                reference: investigation.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_investigation(&self, id: &str) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        Self::require_investigation(&mut tx, id).await?;

        // Tombstone the investigation's own slug and every definition slug in
        // its scope; the row delete cascades to all children.
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE slugs
            SET released_at = ?
            WHERE released_at IS NULL
              AND (scope = ? OR (scope = ? AND entity_id = ?))
            "#,
        )
        .bind(&now)
        .bind(id)
        .bind(GLOBAL_SCOPE)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM investigations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_definition(
        &self,
        mut definition: Definition,
        slug_base: &str,
    ) -> StorageResult<Definition> {
        let mut tx = self.pool.begin().await?;

        Self::require_investigation(&mut tx, &definition.investigation_id).await?;

        let slug = Self::reserve_slug(
            &mut tx,
            &definition.investigation_id,
            slug_base,
            &definition.id,
            &definition.created_at,
        )
        .await?;
        definition.slug = slug;

        let see_also = serde_json::to_string(&definition.see_also).map_err(|e| {
            StorageError::Query {
                message: format!("Failed to encode see_also: {}", e),
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO definitions (id, investigation_id, term, slug, definition_html, see_also, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&definition.id)
        .bind(&definition.investigation_id)
        .bind(&definition.term)
        .bind(&definition.slug)
        .bind(&definition.definition_html)
        .bind(&see_also)
        .bind(definition.created_at.to_rfc3339())
        .bind(definition.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(definition)
    }

    async fn get_definition(
        &self,
        investigation_id: &str,
        slug: &str,
    ) -> StorageResult<Option<Definition>> {
        let row: Option<DefinitionRow> = sqlx::query_as(
            r#"
            SELECT id, investigation_id, term, slug, definition_html, see_also, created_at, updated_at
            FROM definitions
            WHERE investigation_id = ? AND slug = ?
            "#,
        )
        .bind(investigation_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_definitions(&self, investigation_id: &str) -> StorageResult<Vec<Definition>> {
        let rows: Vec<DefinitionRow> = sqlx::query_as(
            r#"
            SELECT id, investigation_id, term, slug, definition_html, see_also, created_at, updated_at
            FROM definitions
            WHERE investigation_id = ?
            ORDER BY term COLLATE NOCASE ASC
            "#,
        )
        .bind(investigation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_definition(&self, definition: &Definition) -> StorageResult<()> {
        let see_also = serde_json::to_string(&definition.see_also).map_err(|e| {
            StorageError::Query {
                message: format!("Failed to encode see_also: {}", e),
            }
        })?;

        let result = sqlx::query(
            r#"
            UPDATE definitions
            SET term = ?, definition_html = ?, see_also = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&definition.term)
        .bind(&definition.definition_html)
        .bind(&see_also)
        .bind(definition.updated_at.to_rfc3339())
        .bind(&definition.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::DefinitionNotFound {
                slug: definition.slug.clone(),
            });
        }

        Ok(())
    }

    async fn delete_definition(&self, investigation_id: &str, slug: &str) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM definitions WHERE investigation_id = ? AND slug = ?")
                .bind(investigation_id)
                .bind(slug)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((definition_id,)) = row else {
            return Err(StorageError::DefinitionNotFound {
                slug: slug.to_string(),
            });
        };

        sqlx::query(
            "UPDATE slugs SET released_at = ? WHERE scope = ? AND slug = ? AND released_at IS NULL",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(investigation_id)
        .bind(slug)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM definitions WHERE id = ?")
            .bind(&definition_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_claim(&self, mut claim: Claim) -> StorageResult<Claim> {
        let mut tx = self.pool.begin().await?;

        Self::require_investigation(&mut tx, &claim.investigation_id).await?;

        let (position,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM claims WHERE investigation_id = ?",
        )
        .bind(&claim.investigation_id)
        .fetch_one(&mut *tx)
        .await?;
        claim.position = position;

        sqlx::query(
            r#"
            INSERT INTO claims (id, investigation_id, claim_text, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&claim.id)
        .bind(&claim.investigation_id)
        .bind(&claim.claim_text)
        .bind(claim.position)
        .bind(claim.created_at.to_rfc3339())
        .bind(claim.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(claim)
    }

    async fn get_claim(&self, id: &str) -> StorageResult<Option<Claim>> {
        let row: Option<ClaimRow> = sqlx::query_as(
            r#"
            SELECT id, investigation_id, claim_text, position, created_at, updated_at
            FROM claims
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_claims(&self, investigation_id: &str) -> StorageResult<Vec<Claim>> {
        let rows: Vec<ClaimRow> = sqlx::query_as(
            r#"
            SELECT id, investigation_id, claim_text, position, created_at, updated_at
            FROM claims
            WHERE investigation_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(investigation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_claim(&self, claim: &Claim) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE claims
            SET claim_text = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&claim.claim_text)
        .bind(claim.updated_at.to_rfc3339())
        .bind(&claim.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::ClaimNotFound {
                claim_id: claim.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_claim(&self, id: &str) -> StorageResult<()> {
        if !self.delete_and_compact("claims", "investigation_id", id).await? {
            return Err(StorageError::ClaimNotFound {
                claim_id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn move_claim(&self, id: &str, direction: Direction) -> StorageResult<MoveResult> {
        self.move_row("claims", "investigation_id", id, direction)
            .await?
            .ok_or_else(|| StorageError::ClaimNotFound {
                claim_id: id.to_string(),
            })
    }

    async fn create_counterargument(
        &self,
        mut counterargument: Counterargument,
    ) -> StorageResult<Counterargument> {
        let mut tx = self.pool.begin().await?;

        let claim_exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM claims WHERE id = ?")
            .bind(&counterargument.claim_id)
            .fetch_optional(&mut *tx)
            .await?;
        if claim_exists.is_none() {
            return Err(StorageError::ClaimNotFound {
                claim_id: counterargument.claim_id.clone(),
            });
        }

        let (position,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM counterarguments WHERE claim_id = ?",
        )
        .bind(&counterargument.claim_id)
        .fetch_one(&mut *tx)
        .await?;
        counterargument.position = position;

        sqlx::query(
            r#"
            INSERT INTO counterarguments (id, claim_id, counter_text, rebuttal_text, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&counterargument.id)
        .bind(&counterargument.claim_id)
        .bind(&counterargument.counter_text)
        .bind(&counterargument.rebuttal_text)
        .bind(counterargument.position)
        .bind(counterargument.created_at.to_rfc3339())
        .bind(counterargument.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(counterargument)
    }

    async fn get_counterargument(&self, id: &str) -> StorageResult<Option<Counterargument>> {
        let row: Option<CounterargumentRow> = sqlx::query_as(
            r#"
            SELECT id, claim_id, counter_text, rebuttal_text, position, created_at, updated_at
            FROM counterarguments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_counterarguments(&self, claim_id: &str) -> StorageResult<Vec<Counterargument>> {
        let rows: Vec<CounterargumentRow> = sqlx::query_as(
            r#"
            SELECT id, claim_id, counter_text, rebuttal_text, position, created_at, updated_at
            FROM counterarguments
            WHERE claim_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_counterargument(
        &self,
        counterargument: &Counterargument,
    ) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE counterarguments
            SET counter_text = ?, rebuttal_text = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&counterargument.counter_text)
        .bind(&counterargument.rebuttal_text)
        .bind(counterargument.updated_at.to_rfc3339())
        .bind(&counterargument.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::CounterargumentNotFound {
                counterargument_id: counterargument.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_counterargument(&self, id: &str) -> StorageResult<()> {
        if !self.delete_and_compact("counterarguments", "claim_id", id).await? {
            return Err(StorageError::CounterargumentNotFound {
                counterargument_id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn move_counterargument(
        &self,
        id: &str,
        direction: Direction,
    ) -> StorageResult<MoveResult> {
        self.move_row("counterarguments", "claim_id", id, direction)
            .await?
            .ok_or_else(|| StorageError::CounterargumentNotFound {
                counterargument_id: id.to_string(),
            })
    }

    async fn create_evidence(&self, evidence: Evidence) -> StorageResult<Evidence> {
        let claim_exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM claims WHERE id = ?")
            .bind(&evidence.claim_id)
            .fetch_optional(&self.pool)
            .await?;
        if claim_exists.is_none() {
            return Err(StorageError::ClaimNotFound {
                claim_id: evidence.claim_id.clone(),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO evidence (id, claim_id, source_title, source_type, source_url, key_quote, key_point, kb_resource_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&evidence.id)
        .bind(&evidence.claim_id)
        .bind(&evidence.source_title)
        .bind(evidence.source_type.to_string())
        .bind(&evidence.source_url)
        .bind(&evidence.key_quote)
        .bind(&evidence.key_point)
        .bind(&evidence.kb_resource_id)
        .bind(evidence.created_at.to_rfc3339())
        .bind(evidence.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(evidence)
    }

    async fn get_evidence(&self, id: &str) -> StorageResult<Option<Evidence>> {
        let row: Option<EvidenceRow> = sqlx::query_as(
            r#"
            SELECT id, claim_id, source_title, source_type, source_url, key_quote, key_point, kb_resource_id, created_at, updated_at
            FROM evidence
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_evidence(&self, claim_id: &str) -> StorageResult<Vec<Evidence>> {
        let rows: Vec<EvidenceRow> = sqlx::query_as(
            r#"
            SELECT id, claim_id, source_title, source_type, source_url, key_quote, key_point, kb_resource_id, created_at, updated_at
            FROM evidence
            WHERE claim_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_evidence(&self, evidence: &Evidence) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE evidence
            SET source_title = ?, source_type = ?, source_url = ?, key_quote = ?, key_point = ?, kb_resource_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&evidence.source_title)
        .bind(evidence.source_type.to_string())
        .bind(&evidence.source_url)
        .bind(&evidence.key_quote)
        .bind(&evidence.key_point)
        .bind(&evidence.kb_resource_id)
        .bind(evidence.updated_at.to_rfc3339())
        .bind(&evidence.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::EvidenceNotFound {
                evidence_id: evidence.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_evidence(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM evidence WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::EvidenceNotFound {
                evidence_id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn resolve_slug(&self, scope: &str, slug: &str) -> StorageResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT entity_id FROM slugs WHERE scope = ? AND slug = ? AND released_at IS NULL",
        )
        .bind(scope)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(entity_id,)| entity_id))
    }

    async fn search_docs(&self) -> StorageResult<Vec<SearchDoc>> {
        let definition_rows: Vec<SearchDocRow> = sqlx::query_as(
            r#"
            SELECT d.id, d.investigation_id, i.slug AS investigation_slug,
                   d.term AS title, d.definition_html AS body, d.updated_at
            FROM definitions d
            JOIN investigations i ON i.id = d.investigation_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let claim_rows: Vec<SearchDocRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.investigation_id, i.slug AS investigation_slug,
                   NULL AS title, c.claim_text AS body, c.updated_at
            FROM claims c
            JOIN investigations i ON i.id = c.investigation_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut docs = Vec::with_capacity(definition_rows.len() + claim_rows.len());
        docs.extend(definition_rows.into_iter().map(|r| r.into_doc(DocKind::Definition)));
        docs.extend(claim_rows.into_iter().map(|r| r.into_doc(DocKind::Claim)));
        Ok(docs)
    }
}

// Internal row types for SQLx mapping

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[derive(sqlx::FromRow)]
struct InvestigationRow {
    id: String,
    slug: String,
    title: String,
    overview_html: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl From<InvestigationRow> for Investigation {
    fn from(row: InvestigationRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            overview_html: row.overview_html,
            status: row.status.parse().unwrap_or_default(),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: String,
    slug: String,
    title: String,
    status: String,
    updated_at: String,
    definition_count: i64,
    claim_count: i64,
}

impl From<SummaryRow> for InvestigationSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            status: row.status.parse().unwrap_or_default(),
            definition_count: row.definition_count,
            claim_count: row.claim_count,
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct DefinitionRow {
    id: String,
    investigation_id: String,
    term: String,
    slug: String,
    definition_html: String,
    see_also: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<DefinitionRow> for Definition {
    fn from(row: DefinitionRow) -> Self {
        Self {
            id: row.id,
            investigation_id: row.investigation_id,
            term: row.term,
            slug: row.slug,
            definition_html: row.definition_html,
            see_also: row
                .see_also
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    id: String,
    investigation_id: String,
    claim_text: String,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl From<ClaimRow> for Claim {
    fn from(row: ClaimRow) -> Self {
        Self {
            id: row.id,
            investigation_id: row.investigation_id,
            claim_text: row.claim_text,
            position: row.position,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CounterargumentRow {
    id: String,
    claim_id: String,
    counter_text: String,
    rebuttal_text: Option<String>,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl From<CounterargumentRow> for Counterargument {
    fn from(row: CounterargumentRow) -> Self {
        Self {
            id: row.id,
            claim_id: row.claim_id,
            counter_text: row.counter_text,
            rebuttal_text: row.rebuttal_text,
            position: row.position,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct EvidenceRow {
    id: String,
    claim_id: String,
    source_title: String,
    source_type: String,
    source_url: Option<String>,
    key_quote: Option<String>,
    key_point: Option<String>,
    kb_resource_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<EvidenceRow> for Evidence {
    fn from(row: EvidenceRow) -> Self {
        Self {
            id: row.id,
            claim_id: row.claim_id,
            source_title: row.source_title,
            source_type: row
                .source_type
                .parse()
                .unwrap_or(super::SourceType::Other(String::new())),
            source_url: row.source_url,
            key_quote: row.key_quote,
            key_point: row.key_point,
            kb_resource_id: row.kb_resource_id,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct SearchDocRow {
    id: String,
    investigation_id: String,
    investigation_slug: String,
    title: Option<String>,
    body: String,
    updated_at: String,
}

impl SearchDocRow {
    fn into_doc(self, kind: DocKind) -> SearchDoc {
        SearchDoc {
            kind,
            id: self.id,
            investigation_id: self.investigation_id,
            investigation_slug: self.investigation_slug,
            title: self.title,
            body: self.body,
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}
