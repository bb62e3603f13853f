//! ORCID public API adapter.
//!
//! One GET per lookup: `<base>/<orcid_id>/works` returns the researcher's
//! works as a `group` list, where each group collects the duplicate versions
//! of one work. Only the first work-summary per group is taken, and the
//! result is capped at the first 10 groups regardless of how many the
//! registry returns.
//!
//! Unlike the other adapters, a non-2xx here is `NotFound`: the ORCID iD
//! itself is the resource being looked up, so a missing profile is a
//! user-visible failure rather than a zero-match success.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use curalink_common::{CuraLinkError, Result, SourceClient, SourcesConfig};

use super::SourceAdapter;
use crate::models::{PublicationRecord, PublicationSource, NO_ABSTRACT, NO_TITLE, UNKNOWN};

const PROFILE_URL_BASE: &str = "https://orcid.org";

/// Duplicate-version groups taken per lookup.
const MAX_WORK_GROUPS: usize = 10;

pub struct OrcidSource {
    client: SourceClient,
    base_url: String,
}

impl OrcidSource {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let mut client =
            SourceClient::with_timeout(std::time::Duration::from_secs(config.request_timeout_secs))?;
        client.allow_url(&config.orcid_base_url);

        Ok(Self {
            client,
            base_url: config.orcid_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a researcher's works by ORCID iD.
    #[instrument(skip(self))]
    pub async fn fetch_works(&self, orcid_id: &str) -> Result<Vec<PublicationRecord>> {
        let url = format!("{}/{}/works", self.base_url, orcid_id);
        let resp = self
            .client
            .get(&url)?
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CuraLinkError::NotFound(format!(
                "ORCID profile {}",
                orcid_id
            )));
        }

        let body = resp.text().await?;
        let data: Value =
            serde_json::from_str(&body).map_err(|e| CuraLinkError::MalformedPayload {
                origin: "orcid".to_string(),
                message: e.to_string(),
            })?;

        let records = parse_work_groups(orcid_id, &data);
        debug!(count = records.len(), "ORCID works normalized");
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for OrcidSource {
    type Record = PublicationRecord;

    /// The query is the ORCID iD; `max_results` does not lift the hard
    /// group cap.
    async fn search(&self, orcid_id: &str, _max_results: usize) -> Result<Vec<PublicationRecord>> {
        self.fetch_works(orcid_id).await
    }
}

/// Take the first work-summary of each of the first 10 groups. A summary
/// without a put-code has no dedup key and is skipped.
fn parse_work_groups(orcid_id: &str, data: &Value) -> Vec<PublicationRecord> {
    let empty = vec![];
    let groups = data["group"].as_array().unwrap_or(&empty);

    let mut records = Vec::new();
    for group in groups.iter().take(MAX_WORK_GROUPS) {
        let summary = match group["work-summary"].as_array().and_then(|s| s.first()) {
            Some(s) => s,
            None => continue,
        };

        let put_code = match summary["put-code"].as_i64() {
            Some(code) => code,
            None => {
                warn!("Skipping work summary without a put-code");
                continue;
            }
        };

        let title = summary["title"]["title"]["value"].as_str().unwrap_or(NO_TITLE);
        let journal = summary["journal-title"]["value"].as_str().unwrap_or(UNKNOWN);
        let year = summary["publication-date"]["year"]["value"]
            .as_str()
            .unwrap_or(UNKNOWN);

        records.push(PublicationRecord {
            // Put-codes are only unique within one researcher's record.
            external_id: format!("{}:{}", orcid_id, put_code),
            source: PublicationSource::Orcid,
            title: title.to_string(),
            authors: vec![],
            abstract_text: NO_ABSTRACT.to_string(),
            journal: journal.to_string(),
            publication_year: year.to_string(),
            url: format!("{}/{}", PROFILE_URL_BASE, orcid_id),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn work_group(put_code: i64, title: &str) -> Value {
        json!({
            "work-summary": [
                {
                    "put-code": put_code,
                    "title": { "title": { "value": title } },
                    "journal-title": { "value": "The Lancet" },
                    "publication-date": { "year": { "value": "2019" } }
                },
                {
                    "put-code": put_code + 1000,
                    "title": { "title": { "value": "Duplicate version" } }
                }
            ]
        })
    }

    #[test]
    fn test_first_summary_per_group_is_taken() {
        let data = json!({ "group": [work_group(77, "CRISPR screening")] });
        let records = parse_work_groups("0000-0001-2345-6789", &data);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.external_id, "0000-0001-2345-6789:77");
        assert_eq!(r.source, PublicationSource::Orcid);
        assert_eq!(r.title, "CRISPR screening");
        assert_eq!(r.journal, "The Lancet");
        assert_eq!(r.publication_year, "2019");
        assert_eq!(r.url, "https://orcid.org/0000-0001-2345-6789");
    }

    #[test]
    fn test_groups_capped_at_ten() {
        let groups: Vec<Value> = (0..25).map(|i| work_group(i, "Work")).collect();
        let data = json!({ "group": groups });
        let records = parse_work_groups("0000-0002-0000-0000", &data);
        assert_eq!(records.len(), 10);
    }

    #[test]
    fn test_missing_fields_resolve_to_placeholders() {
        let data = json!({
            "group": [{ "work-summary": [{ "put-code": 5 }] }]
        });
        let records = parse_work_groups("0000-0003-0000-0000", &data);
        assert_eq!(records[0].title, NO_TITLE);
        assert_eq!(records[0].journal, UNKNOWN);
        assert_eq!(records[0].publication_year, UNKNOWN);
        assert_eq!(records[0].abstract_text, NO_ABSTRACT);
        assert!(records[0].authors.is_empty());
    }

    #[test]
    fn test_summary_without_put_code_is_skipped() {
        let data = json!({
            "group": [
                { "work-summary": [{ "title": { "title": { "value": "No key" } } }] },
                work_group(12, "Keyed work")
            ]
        });
        let records = parse_work_groups("0000-0004-0000-0000", &data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].external_id, "0000-0004-0000-0000:12");
    }

    #[test]
    fn test_empty_group_list() {
        let records = parse_work_groups("0000-0005-0000-0000", &json!({}));
        assert!(records.is_empty());
    }
}
