//! Configuration loading for CuraLink.
//! Reads curalink.toml from the current directory or the path in the
//! CURALINK_CONFIG env var; every field has a usable default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CuraLinkError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url()    -> String { "sqlite://curalink.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 5 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_pubmed_base_url")]
    pub pubmed_base_url: String,
    #[serde(default = "default_clinicaltrials_base_url")]
    pub clinicaltrials_base_url: String,
    #[serde(default = "default_orcid_base_url")]
    pub orcid_base_url: String,
    /// Bounded per-request timeout; a single failed attempt is final.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Page size requested from each source when the caller does not say.
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
    /// Optional NCBI API key for higher PubMed rate limits.
    pub pubmed_api_key: Option<String>,
}

fn default_pubmed_base_url()         -> String { "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string() }
fn default_clinicaltrials_base_url() -> String { "https://clinicaltrials.gov/api/v2".to_string() }
fn default_orcid_base_url()          -> String { "https://pub.orcid.org/v3.0".to_string() }
fn default_request_timeout_secs()    -> u64 { 10 }
fn default_max_results()             -> usize { 10 }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            pubmed_base_url: default_pubmed_base_url(),
            clinicaltrials_base_url: default_clinicaltrials_base_url(),
            orcid_base_url: default_orcid_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            default_max_results: default_max_results(),
            pubmed_api_key: None,
        }
    }
}

impl Config {
    /// Parse a TOML string into a Config with defaults filled in.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| CuraLinkError::Config(format!("Invalid config: {}", e)))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CuraLinkError::Config(format!(
                "Could not read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&raw)
    }

    /// Load configuration from CURALINK_CONFIG, falling back to
    /// ./curalink.toml, falling back to built-in defaults.
    pub fn load_from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path =
            std::env::var("CURALINK_CONFIG").unwrap_or_else(|_| "curalink.toml".to_string());
        if Path::new(&path).exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
