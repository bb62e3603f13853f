use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::CuraLinkError;

/// Default per-request timeout for all upstream calls. A single failed
/// attempt is final; there is no retry-with-backoff in this layer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An allowlist-capped HTTP client that only issues requests to approved
/// upstream hosts. Keeps the ingestion layer from ever talking to a domain
/// that is not one of the configured data sources.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SourceClient {
    /// Creates a client with the default allowlist of CuraLink data sources
    /// and the bounded default timeout.
    pub fn new() -> Result<Self, CuraLinkError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, CuraLinkError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "eutils.ncbi.nlm.nih.gov",   // PubMed E-utilities
            "pubmed.ncbi.nlm.nih.gov",   // PubMed article pages
            "clinicaltrials.gov",        // ClinicalTrials.gov v2 API
            "pub.orcid.org",             // ORCID public API
            "localhost",                 // local stubs
            "127.0.0.1",                 // localhost alt
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| CuraLinkError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Appends the host of a configured base URL to the allowlist. Invalid
    /// or host-less URLs are ignored; the request itself will fail later.
    pub fn allow_url(&mut self, url: &str) {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                self.allowlist.insert(host.to_string());
            }
        }
    }

    /// Validates whether a URL is permitted under the current allowlist.
    /// Subdomains of an allowed domain are permitted.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Builds a GET request after validating the target against the
    /// allowlist.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, CuraLinkError> {
        if !self.is_allowed(url) {
            return Err(CuraLinkError::DomainBlocked(url.to_string()));
        }
        Ok(self.client.get(url))
    }
}
