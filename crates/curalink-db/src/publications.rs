//! Publication cache repository.

use chrono::{DateTime, Utc};
use curalink_common::Result;
use tracing::debug;

use crate::database::Database;
use crate::schema::{Publication, PublicationRecord};
use crate::CacheOutcome;

/// Raw row as stored; authors are kept as a JSON array string.
#[derive(Debug, sqlx::FromRow)]
struct PublicationRow {
    id: i64,
    external_id: String,
    source: String,
    title: String,
    authors: String,
    abstract_text: String,
    journal: String,
    publication_year: String,
    url: String,
    ai_summary: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PublicationRow> for Publication {
    fn from(row: PublicationRow) -> Self {
        Publication {
            id: row.id,
            external_id: row.external_id,
            source: row.source,
            title: row.title,
            authors: serde_json::from_str(&row.authors).unwrap_or_default(),
            abstract_text: row.abstract_text,
            journal: row.journal,
            publication_year: row.publication_year,
            url: row.url,
            ai_summary: row.ai_summary,
            created_at: row.created_at,
        }
    }
}

/// Repository for the `external_publications` cache table.
#[derive(Debug, Clone)]
pub struct PublicationRepository {
    db: Database,
}

impl PublicationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert the record unless a row with its `external_id` already exists,
    /// then return the surviving row.
    ///
    /// Atomicity rests on the unique index: the insert either wins or is a
    /// no-op, and the follow-up select always observes the winner. There is
    /// no application-level check-then-act window.
    pub async fn get_or_insert(
        &self,
        record: &PublicationRecord,
    ) -> Result<CacheOutcome<Publication>> {
        let authors_json = serde_json::to_string(&record.authors)
            .map_err(|e| anyhow::anyhow!("author list serialization failed: {}", e))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO external_publications
                (external_id, source, title, authors, abstract_text,
                 journal, publication_year, url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO NOTHING
            "#,
        )
        .bind(&record.external_id)
        .bind(record.source.as_str())
        .bind(&record.title)
        .bind(&authors_json)
        .bind(&record.abstract_text)
        .bind(&record.journal)
        .bind(&record.publication_year)
        .bind(&record.url)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?
        .rows_affected();

        let was_new = inserted > 0;
        debug!(
            external_id = %record.external_id,
            was_new,
            "Publication reconciled against cache"
        );

        let row = sqlx::query_as::<_, PublicationRow>(
            "SELECT * FROM external_publications WHERE external_id = ?",
        )
        .bind(&record.external_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(CacheOutcome {
            record: row.into(),
            was_new,
        })
    }

    /// Look up a cached publication by its external identifier.
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Publication>> {
        let row = sqlx::query_as::<_, PublicationRow>(
            "SELECT * FROM external_publications WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    /// Record an AI-generated summary. Written by the summarization
    /// collaborator after creation; this core never calls it for itself.
    pub async fn set_ai_summary(&self, external_id: &str, summary: &str) -> Result<()> {
        sqlx::query("UPDATE external_publications SET ai_summary = ? WHERE external_id = ?")
            .bind(summary)
            .bind(external_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Total cached publications.
    pub async fn count(&self) -> Result<i64> {
        let n: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM external_publications")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n.0)
    }
}
