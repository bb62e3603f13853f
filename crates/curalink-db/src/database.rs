//! Database connection and schema management.

use std::str::FromStr;
use std::time::Duration;

use curalink_common::{CuraLinkError, DatabaseConfig, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Main database handle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create the database described by the configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| CuraLinkError::Config(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            // WAL lets concurrent readers proceed while one writer commits.
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the cache tables if absent.
    ///
    /// The inline UNIQUE constraint on `external_id` is what makes
    /// `get_or_insert` atomic: two concurrent inserts for the same
    /// identifier cannot both succeed, and the loser fetches the winner's
    /// row. It must be declared in the CREATE TABLE itself — a separately
    /// created index is invisible to `ON CONFLICT` clauses prepared against
    /// a connection's earlier schema snapshot.
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS external_publications (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id      TEXT NOT NULL UNIQUE,
                source           TEXT NOT NULL,
                title            TEXT NOT NULL,
                authors          TEXT NOT NULL,
                abstract_text    TEXT NOT NULL,
                journal          TEXT NOT NULL,
                publication_year TEXT NOT NULL,
                url              TEXT NOT NULL,
                ai_summary       TEXT,
                created_at       TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS external_trials (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id   TEXT NOT NULL UNIQUE,
                title         TEXT NOT NULL,
                condition     TEXT NOT NULL,
                phase         TEXT NOT NULL,
                status        TEXT NOT NULL,
                location      TEXT NOT NULL,
                description   TEXT NOT NULL,
                contact_email TEXT NOT NULL,
                url           TEXT NOT NULL,
                ai_summary    TEXT,
                created_at    TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
