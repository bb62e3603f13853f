//! ClinicalTrials.gov v2 API adapter.
//!
//! One GET against `/studies` with condition and page-size parameters; the
//! response nests each study's fields under a fixed path of optional
//! sub-objects (identification, status, description, conditions, design,
//! contacts). Any absent segment yields that section's placeholder.
//!
//! Status filtering is NOT done here: the orchestrator applies it after
//! parsing so that filtered-out trials are still cached.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use curalink_common::{CuraLinkError, Result, SourceClient, SourcesConfig};

use super::SourceAdapter;
use crate::models::{truncate_text, TrialRecord, NO_DESCRIPTION, NO_TITLE, UNKNOWN};

const STUDY_URL_BASE: &str = "https://clinicaltrials.gov/study";

pub struct ClinicalTrialsSource {
    client: SourceClient,
    base_url: String,
}

impl ClinicalTrialsSource {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let mut client =
            SourceClient::with_timeout(std::time::Duration::from_secs(config.request_timeout_secs))?;
        client.allow_url(&config.clinicaltrials_base_url);

        Ok(Self {
            client,
            base_url: config.clinicaltrials_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_studies(&self, condition: &str, max_results: usize) -> Result<Vec<Value>> {
        let body = self
            .client
            .get(&format!("{}/studies", self.base_url))?
            .query(&[
                ("query.cond", condition),
                ("pageSize", &max_results.to_string()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let resp: Value =
            serde_json::from_str(&body).map_err(|e| CuraLinkError::MalformedPayload {
                origin: "clinicaltrials".to_string(),
                message: e.to_string(),
            })?;

        Ok(resp["studies"].as_array().cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SourceAdapter for ClinicalTrialsSource {
    type Record = TrialRecord;

    #[instrument(skip(self))]
    async fn search(&self, condition: &str, max_results: usize) -> Result<Vec<TrialRecord>> {
        let studies = self.fetch_studies(condition, max_results).await?;
        debug!(count = studies.len(), "ClinicalTrials.gov studies retrieved");

        let mut records = Vec::with_capacity(studies.len());
        let mut skipped = 0usize;
        for study in &studies {
            match normalize_study(study) {
                Some(record) => records.push(record),
                None => {
                    warn!("Skipping study node without an NCT identifier");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "Skipped incomplete study nodes");
        }

        Ok(records)
    }
}

/// Walk one study's nested protocol sections into a normalized record.
/// Returns None when the study lacks its NCT identifier — the only field
/// the cache cannot substitute a placeholder for.
fn normalize_study(study: &Value) -> Option<TrialRecord> {
    let proto = &study["protocolSection"];
    let identification = &proto["identificationModule"];
    let status_module = &proto["statusModule"];
    let description = &proto["descriptionModule"];
    let conditions = &proto["conditionsModule"];
    let design = &proto["designModule"];
    let contacts = &proto["contactsLocationsModule"];

    let nct_id = identification["nctId"].as_str().unwrap_or("");
    if nct_id.is_empty() {
        return None;
    }

    let condition = join_or_unknown(&conditions["conditions"]);
    let phase = join_or_unknown(&design["phases"]);
    let status = status_module["overallStatus"].as_str().unwrap_or(UNKNOWN);
    let brief_summary = description["briefSummary"].as_str().unwrap_or(NO_DESCRIPTION);

    let location = contacts["locations"][0]["city"].as_str().unwrap_or(UNKNOWN);
    let contact_email = contacts["centralContacts"][0]["email"].as_str().unwrap_or("");

    Some(TrialRecord {
        external_id: nct_id.to_string(),
        title: identification["briefTitle"].as_str().unwrap_or(NO_TITLE).to_string(),
        condition,
        phase,
        status: status.to_string(),
        location: location.to_string(),
        description: truncate_text(brief_summary),
        contact_email: contact_email.to_string(),
        url: format!("{}/{}", STUDY_URL_BASE, nct_id),
    })
}

/// Comma-join a JSON string array, "Unknown" when absent or empty.
fn join_or_unknown(value: &Value) -> String {
    let items: Vec<&str> = value
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    if items.is_empty() {
        UNKNOWN.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MAX_TEXT_LEN, TRUNCATION_MARKER};
    use serde_json::json;

    fn study(nct_id: &str, status: &str) -> Value {
        json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": nct_id,
                    "briefTitle": "Metformin in early T2D"
                },
                "statusModule": { "overallStatus": status },
                "descriptionModule": { "briefSummary": "A brief summary." },
                "conditionsModule": { "conditions": ["Type 2 Diabetes", "Obesity"] },
                "designModule": { "phases": ["PHASE2", "PHASE3"] },
                "contactsLocationsModule": {
                    "locations": [{ "city": "Boston" }, { "city": "Austin" }],
                    "centralContacts": [{ "email": "trials@example.org" }]
                }
            }
        })
    }

    #[test]
    fn test_normalize_complete_study() {
        let r = normalize_study(&study("NCT01234567", "Recruiting")).unwrap();
        assert_eq!(r.external_id, "NCT01234567");
        assert_eq!(r.title, "Metformin in early T2D");
        assert_eq!(r.condition, "Type 2 Diabetes, Obesity");
        assert_eq!(r.phase, "PHASE2, PHASE3");
        assert_eq!(r.status, "Recruiting");
        assert_eq!(r.location, "Boston");
        assert_eq!(r.description, "A brief summary.");
        assert_eq!(r.contact_email, "trials@example.org");
        assert_eq!(r.url, "https://clinicaltrials.gov/study/NCT01234567");
    }

    #[test]
    fn test_absent_sections_yield_placeholders() {
        let bare = json!({
            "protocolSection": {
                "identificationModule": { "nctId": "NCT00000001" }
            }
        });
        let r = normalize_study(&bare).unwrap();
        assert_eq!(r.title, NO_TITLE);
        assert_eq!(r.condition, UNKNOWN);
        assert_eq!(r.phase, UNKNOWN);
        assert_eq!(r.status, UNKNOWN);
        assert_eq!(r.location, UNKNOWN);
        assert_eq!(r.description, NO_DESCRIPTION);
        assert_eq!(r.contact_email, "");
    }

    #[test]
    fn test_study_without_nct_id_is_dropped() {
        let anonymous = json!({
            "protocolSection": {
                "identificationModule": { "briefTitle": "No registry number" }
            }
        });
        assert!(normalize_study(&anonymous).is_none());
    }

    #[test]
    fn test_long_description_is_truncated() {
        let mut s = study("NCT09999999", "Completed");
        s["protocolSection"]["descriptionModule"]["briefSummary"] =
            Value::String("d".repeat(MAX_TEXT_LEN + 1));
        let r = normalize_study(&s).unwrap();
        assert_eq!(
            r.description.chars().count(),
            MAX_TEXT_LEN + TRUNCATION_MARKER.len()
        );
    }

    #[test]
    fn test_status_is_parsed_verbatim_not_filtered() {
        // Filtering is the orchestrator's job; the adapter keeps every study.
        let r = normalize_study(&study("NCT05555555", "Completed")).unwrap();
        assert_eq!(r.status, "Completed");
    }
}
