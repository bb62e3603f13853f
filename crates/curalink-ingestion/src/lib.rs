//! curalink-ingestion — External-data ingestion and caching.
//!
//! Queries three heterogeneous upstream sources:
//! - PubMed E-utilities (two-step ID search, then batch XML detail fetch)
//! - ClinicalTrials.gov v2 (deeply nested JSON studies document)
//! - ORCID public API (JSON work-summary groups)
//!
//! Each adapter normalizes its source's native format into the canonical
//! record shapes and the pipeline reconciles every record against the dedup
//! cache, so the same external entity is stored at most once no matter how
//! often or how concurrently it is queried.

pub mod models;
pub mod pipeline;
pub mod sources;

pub use pipeline::{AggregateOutcome, IngestionPipeline, SearchOutcome};
