//! External source adapters.

pub mod clinicaltrials;
pub mod orcid;
pub mod pubmed;

use async_trait::async_trait;
use curalink_common::Result;

/// Common capability shape for the source adapters.
///
/// The three adapters share only this surface; their internal parsing is
/// structurally unrelated (two-step XML batch, nested JSON walk, grouped
/// JSON summaries). Adapters know nothing about each other or the cache.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Record;

    /// Query the source and normalize its response.
    ///
    /// An empty list is a legitimate zero-match success. Unreachable or
    /// unparseable upstreams fail with `SourceUnavailable`/
    /// `MalformedPayload`; single bad items inside a batch are skipped and
    /// counted, never surfaced as errors.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Self::Record>>;
}
