//! Ingestion orchestrator.
//!
//! Ties one search request together: invoke the adapter for the requested
//! source, reconcile every normalized record against the dedup cache in the
//! adapter's returned order, and apply any post-hoc filter to the returned
//! set only — filtering never affects which records get cached, since a
//! later unfiltered query may want them.
//!
//! Whole-response source failures degrade to an empty outcome carrying the
//! error text instead of failing the request; callers can tell "upstream had
//! zero matches" from "upstream was unreachable".

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use curalink_common::{Result, SourcesConfig};
use curalink_db::schema::{Publication, PublicationRecord, Trial};
use curalink_db::{Database, PublicationRepository, TrialRepository};

use crate::sources::clinicaltrials::ClinicalTrialsSource;
use crate::sources::orcid::OrcidSource;
use crate::sources::pubmed::PubMedSource;
use crate::sources::SourceAdapter;

/// Result of one search against one source, after cache reconciliation.
///
/// Cached and freshly inserted records are returned identically, in adapter
/// order; the new/cached split is telemetry. `source_error` is set when the
/// source was unreachable or unparseable — the required distinction from a
/// legitimately empty result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome<T> {
    pub records: Vec<T>,
    pub newly_inserted: usize,
    pub already_cached: usize,
    pub source_error: Option<String>,
}

impl<T> SearchOutcome<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            newly_inserted: 0,
            already_cached: 0,
            source_error: None,
        }
    }

    fn source_down(error: String) -> Self {
        Self {
            records: Vec::new(),
            newly_inserted: 0,
            already_cached: 0,
            source_error: Some(error),
        }
    }

    /// False when the empty result is due to the source being down, not a
    /// true zero-match.
    pub fn source_available(&self) -> bool {
        self.source_error.is_none()
    }
}

/// Cross-source aggregation result; each source degrades independently.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateOutcome {
    pub publications: SearchOutcome<Publication>,
    pub trials: SearchOutcome<Trial>,
}

/// Orchestrates the source adapters and the dedup cache store.
pub struct IngestionPipeline {
    publications: PublicationRepository,
    trials: TrialRepository,
    pubmed: PubMedSource,
    registry: ClinicalTrialsSource,
    orcid: OrcidSource,
}

impl IngestionPipeline {
    pub fn new(db: Database, config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            publications: PublicationRepository::new(db.clone()),
            trials: TrialRepository::new(db),
            pubmed: PubMedSource::new(config)?,
            registry: ClinicalTrialsSource::new(config)?,
            orcid: OrcidSource::new(config)?,
        })
    }

    /// The publication cache repository (shared with collaborators such as
    /// the summarization worker).
    pub fn publications(&self) -> &PublicationRepository {
        &self.publications
    }

    /// The trial cache repository.
    pub fn trials(&self) -> &TrialRepository {
        &self.trials
    }

    /// Search the literature index and reconcile results against the cache.
    #[instrument(skip(self), fields(job_id = %Uuid::new_v4()))]
    pub async fn search_publications(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<SearchOutcome<Publication>> {
        let records = match self.pubmed.search(query, max_results).await {
            Ok(records) => records,
            Err(e) if e.is_source_failure() => {
                warn!(error = %e, "Literature index unavailable, degrading to empty result");
                return Ok(SearchOutcome::source_down(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        self.reconcile_publications(records).await
    }

    /// Search the trials registry. Every parsed trial is cached; the status
    /// filter (case-insensitive substring) shapes only the returned set.
    #[instrument(skip(self), fields(job_id = %Uuid::new_v4()))]
    pub async fn search_trials(
        &self,
        condition: &str,
        status_filter: Option<&str>,
        max_results: usize,
    ) -> Result<SearchOutcome<Trial>> {
        let records = match self.registry.search(condition, max_results).await {
            Ok(records) => records,
            Err(e) if e.is_source_failure() => {
                warn!(error = %e, "Trials registry unavailable, degrading to empty result");
                return Ok(SearchOutcome::source_down(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let mut outcome = SearchOutcome::new();
        for record in &records {
            let cached = self.trials.get_or_insert(record).await?;
            if cached.was_new {
                outcome.newly_inserted += 1;
            } else {
                outcome.already_cached += 1;
            }
            outcome.records.push(cached.record);
        }

        if let Some(filter) = status_filter {
            outcome.records.retain(|t| status_matches(&t.status, filter));
        }

        info!(
            returned = outcome.records.len(),
            newly_inserted = outcome.newly_inserted,
            already_cached = outcome.already_cached,
            "Trial search reconciled"
        );
        Ok(outcome)
    }

    /// Fetch a researcher's works from the identity registry and cache them.
    ///
    /// Errors propagate: the ORCID iD is a directly-addressed resource, so a
    /// missing profile or unreachable registry is the caller's to see.
    #[instrument(skip(self), fields(job_id = %Uuid::new_v4()))]
    pub async fn researcher_works(&self, orcid_id: &str) -> Result<SearchOutcome<Publication>> {
        let records = self.orcid.fetch_works(orcid_id).await?;
        self.reconcile_publications(records).await
    }

    /// Query the literature index and the trials registry concurrently.
    /// Neither source blocks or reorders the other; each degrades on its own.
    #[instrument(skip(self), fields(job_id = %Uuid::new_v4()))]
    pub async fn search_all(&self, query: &str, max_results: usize) -> Result<AggregateOutcome> {
        let (publications, trials) = tokio::join!(
            self.search_publications(query, max_results),
            self.search_trials(query, None, max_results),
        );

        Ok(AggregateOutcome {
            publications: publications?,
            trials: trials?,
        })
    }

    async fn reconcile_publications(
        &self,
        records: Vec<PublicationRecord>,
    ) -> Result<SearchOutcome<Publication>> {
        let mut outcome = SearchOutcome::new();
        for record in &records {
            let cached = self.publications.get_or_insert(record).await?;
            if cached.was_new {
                outcome.newly_inserted += 1;
            } else {
                outcome.already_cached += 1;
            }
            outcome.records.push(cached.record);
        }

        info!(
            returned = outcome.records.len(),
            newly_inserted = outcome.newly_inserted,
            already_cached = outcome.already_cached,
            "Publication search reconciled"
        );
        Ok(outcome)
    }
}

/// Case-insensitive substring match on the trial's status field.
fn status_matches(status: &str, filter: &str) -> bool {
    status.to_lowercase().contains(&filter.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_match_is_case_insensitive_substring() {
        assert!(status_matches("Recruiting", "recruiting"));
        assert!(status_matches("ACTIVE_NOT_RECRUITING", "recruiting"));
        assert!(status_matches("Completed", "comp"));
        assert!(!status_matches("Completed", "recruiting"));
    }

    #[test]
    fn test_outcome_availability_flag() {
        let ok: SearchOutcome<Publication> = SearchOutcome::new();
        assert!(ok.source_available());

        let down: SearchOutcome<Publication> =
            SearchOutcome::source_down("connection timed out".to_string());
        assert!(!down.source_available());
        assert!(down.records.is_empty());
    }
}
