//! Clinical trial cache repository.

use chrono::{DateTime, Utc};
use curalink_common::Result;
use tracing::debug;

use crate::database::Database;
use crate::schema::{Trial, TrialRecord};
use crate::CacheOutcome;

#[derive(Debug, sqlx::FromRow)]
struct TrialRow {
    id: i64,
    external_id: String,
    title: String,
    condition: String,
    phase: String,
    status: String,
    location: String,
    description: String,
    contact_email: String,
    url: String,
    ai_summary: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TrialRow> for Trial {
    fn from(row: TrialRow) -> Self {
        Trial {
            id: row.id,
            external_id: row.external_id,
            title: row.title,
            condition: row.condition,
            phase: row.phase,
            status: row.status,
            location: row.location,
            description: row.description,
            contact_email: row.contact_email,
            url: row.url,
            ai_summary: row.ai_summary,
            created_at: row.created_at,
        }
    }
}

/// Repository for the `external_trials` cache table.
#[derive(Debug, Clone)]
pub struct TrialRepository {
    db: Database,
}

impl TrialRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert-if-absent keyed on the registry identifier; first write wins.
    pub async fn get_or_insert(&self, record: &TrialRecord) -> Result<CacheOutcome<Trial>> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO external_trials
                (external_id, title, condition, phase, status,
                 location, description, contact_email, url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO NOTHING
            "#,
        )
        .bind(&record.external_id)
        .bind(&record.title)
        .bind(&record.condition)
        .bind(&record.phase)
        .bind(&record.status)
        .bind(&record.location)
        .bind(&record.description)
        .bind(&record.contact_email)
        .bind(&record.url)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?
        .rows_affected();

        let was_new = inserted > 0;
        debug!(
            external_id = %record.external_id,
            was_new,
            "Trial reconciled against cache"
        );

        let row =
            sqlx::query_as::<_, TrialRow>("SELECT * FROM external_trials WHERE external_id = ?")
                .bind(&record.external_id)
                .fetch_one(self.db.pool())
                .await?;

        Ok(CacheOutcome {
            record: row.into(),
            was_new,
        })
    }

    /// Look up a cached trial by its registry identifier.
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Trial>> {
        let row =
            sqlx::query_as::<_, TrialRow>("SELECT * FROM external_trials WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(Into::into))
    }

    /// Record an AI-generated summary; collaborator boundary, see
    /// `PublicationRepository::set_ai_summary`.
    pub async fn set_ai_summary(&self, external_id: &str, summary: &str) -> Result<()> {
        sqlx::query("UPDATE external_trials SET ai_summary = ? WHERE external_id = ?")
            .bind(summary)
            .bind(external_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Total cached trials.
    pub async fn count(&self) -> Result<i64> {
        let n: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM external_trials")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n.0)
    }
}
