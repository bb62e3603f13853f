//! CuraLink Dedup Cache Store
//!
//! Persistence layer for externally-sourced records. One relational table per
//! record type, unique-indexed on `external_id`, so re-ingesting the same
//! external entity never creates a second row — including under concurrent
//! insertion, where the unique index arbitrates and exactly one insert wins.
//!
//! The store is write-once by design: `get_or_insert` returns the first
//! writer's row unchanged and discards a later caller's possibly-fresher
//! field values. The only post-creation mutation is `set_ai_summary`, written
//! by the external summarization collaborator.
//!
//! # Example
//!
//! ```rust,no_run
//! use curalink_db::{Database, PublicationRepository};
//! use curalink_common::DatabaseConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect(&DatabaseConfig::default()).await?;
//!     db.initialize().await?;
//!
//!     let publications = PublicationRepository::new(db.clone());
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod publications;
pub mod schema;
pub mod trials;

pub use database::Database;
pub use publications::PublicationRepository;
pub use schema::{Publication, PublicationRecord, PublicationSource, Trial, TrialRecord};
pub use trials::TrialRepository;

/// Result of a `get_or_insert` call.
#[derive(Debug, Clone)]
pub struct CacheOutcome<T> {
    pub record: T,
    /// True when this call created the row; false when an earlier ingestion
    /// (or a concurrent one that won the race) already stored it.
    pub was_new: bool,
}
