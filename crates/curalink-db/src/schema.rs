//! Record shapes for the dedup cache tables.
//!
//! `PublicationRecord`/`TrialRecord` are the canonical, source-agnostic
//! shapes every adapter maps into — pure data, no behavior, unowned until
//! handed to the store. `Publication`/`Trial` are their stored counterparts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of an externally-sourced publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationSource {
    PubMed,
    Orcid,
}

impl PublicationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationSource::PubMed => "pubmed",
            PublicationSource::Orcid => "orcid",
        }
    }
}

/// A normalized publication produced by a source adapter, not yet stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Source-assigned identifier; the dedup key.
    pub external_id: String,
    pub source: PublicationSource,
    pub title: String,
    /// "Given Family" author names, in source order. May be empty.
    pub authors: Vec<String>,
    /// Already truncated by the adapter; never longer than the cap plus
    /// its marker.
    pub abstract_text: String,
    pub journal: String,
    /// May be a non-numeric placeholder ("Unknown").
    pub publication_year: String,
    /// Derived deterministically from `external_id`.
    pub url: String,
}

/// A publication row in the dedup cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: i64,
    pub external_id: String,
    pub source: String,
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: String,
    pub journal: String,
    pub publication_year: String,
    pub url: String,
    /// Populated asynchronously by the summarization collaborator.
    pub ai_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A normalized clinical trial produced by the registry adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Registry identifier (NCT number); the dedup key.
    pub external_id: String,
    pub title: String,
    /// Comma-joined condition list, "Unknown" when absent.
    pub condition: String,
    /// Comma-joined phase list, "Unknown" when absent.
    pub phase: String,
    /// Enum-like status string: Recruiting/Completed/…/Unknown.
    pub status: String,
    /// First known site city, "Unknown" when absent.
    pub location: String,
    pub description: String,
    /// May be empty when the registry lists no central contact.
    pub contact_email: String,
    pub url: String,
}

/// A clinical trial row in the dedup cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub condition: String,
    pub phase: String,
    pub status: String,
    pub location: String,
    pub description: String,
    pub contact_email: String,
    pub url: String,
    pub ai_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}
