//! PubMed E-utilities adapter.
//!
//! Two sequential calls per search:
//!   esearch: JSON list of PMIDs matching the query
//!   efetch:  one batch XML document with the details for every PMID
//!
//! The second call is not issued until the first completes; its input is
//! entirely the first call's ID list. An empty ID list is a zero-match
//! success, not an error.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use curalink_common::{CuraLinkError, Result, SourceClient, SourcesConfig};

use super::SourceAdapter;
use crate::models::{
    truncate_text, PublicationRecord, PublicationSource, NO_ABSTRACT, NO_TITLE, UNKNOWN,
};

/// Article pages live on a different host than the E-utilities API.
const ARTICLE_URL_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

pub struct PubMedSource {
    client: SourceClient,
    base_url: String,
    api_key: Option<String>,
}

impl PubMedSource {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let mut client =
            SourceClient::with_timeout(std::time::Duration::from_secs(config.request_timeout_secs))?;
        client.allow_url(&config.pubmed_base_url);

        Ok(Self {
            client,
            base_url: config.pubmed_base_url.trim_end_matches('/').to_string(),
            api_key: config.pubmed_api_key.clone(),
        })
    }

    /// Search PubMed and return the matching PMIDs.
    #[instrument(skip(self))]
    async fn esearch(&self, query: &str, max: usize) -> Result<Vec<String>> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", query.to_string()),
            ("retmax", max.to_string()),
            ("retmode", "json".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let body = self
            .client
            .get(&format!("{}/esearch.fcgi", self.base_url))?
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let resp: Value =
            serde_json::from_str(&body).map_err(|e| CuraLinkError::MalformedPayload {
                origin: "pubmed".to_string(),
                message: e.to_string(),
            })?;

        // Missing keys mean zero matches, mirroring the upstream contract.
        let ids: Vec<String> = resp["esearchresult"]["idlist"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();

        debug!(count = ids.len(), "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    /// Fetch the batch XML for a list of PMIDs and normalize it.
    #[instrument(skip(self))]
    async fn efetch(&self, pmids: &[String]) -> Result<Vec<PublicationRecord>> {
        if pmids.is_empty() {
            return Ok(vec![]);
        }

        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("rettype", "abstract".to_string()),
            ("retmode", "xml".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let xml = self
            .client
            .get(&format!("{}/efetch.fcgi", self.base_url))?
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let (records, skipped) = parse_pubmed_xml(&xml)?;
        if skipped > 0 {
            warn!(skipped, "Skipped incomplete PubMed article nodes");
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for PubMedSource {
    type Record = PublicationRecord;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<PublicationRecord>> {
        let pmids = self.esearch(query, max_results).await?;
        self.efetch(&pmids).await
    }
}

#[derive(Default)]
struct ArticleBuilder {
    pmid: String,
    title: String,
    abstract_text: String,
    journal: String,
    year: String,
    authors: Vec<String>,
}

impl ArticleBuilder {
    /// An article without its PMID has no dedup key and cannot be kept.
    fn finish(self) -> Option<PublicationRecord> {
        if self.pmid.is_empty() {
            return None;
        }
        let url = format!("{}/{}/", ARTICLE_URL_BASE, self.pmid);
        Some(PublicationRecord {
            external_id: self.pmid,
            source: PublicationSource::PubMed,
            title: or_placeholder(self.title, NO_TITLE),
            authors: self.authors,
            abstract_text: truncate_text(&or_placeholder(self.abstract_text, NO_ABSTRACT)),
            journal: or_placeholder(self.journal, UNKNOWN),
            publication_year: or_placeholder(self.year, UNKNOWN),
            url,
        })
    }
}

fn or_placeholder(value: String, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}

/// Parse efetch abstract XML (`<PubmedArticleSet><PubmedArticle>…`) into
/// normalized records plus a count of skipped article nodes.
///
/// Each article node is walked independently: one incomplete node reduces
/// the result count, it never aborts the batch. Only an unparseable
/// document as a whole is an error.
fn parse_pubmed_xml(xml: &str) -> Result<(Vec<PublicationRecord>, usize)> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<ArticleBuilder> = None;
    let mut in_pmid = false;
    let mut in_title = false;
    let mut in_abstract = false;
    let mut in_journal = false;
    let mut in_journal_title = false;
    let mut in_pub_date = false;
    let mut in_year = false;
    let mut in_author = false;
    let mut in_last_name = false;
    let mut in_fore_name = false;
    let mut current_last = String::new();
    let mut current_fore = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"PubmedArticle" => current = Some(ArticleBuilder::default()),
                b"PMID" => in_pmid = true,
                b"ArticleTitle" => in_title = true,
                b"AbstractText" => in_abstract = true,
                b"Journal" => in_journal = true,
                b"Title" if in_journal => in_journal_title = true,
                b"PubDate" => in_pub_date = true,
                b"Year" if in_pub_date => in_year = true,
                b"Author" => {
                    in_author = true;
                    current_last.clear();
                    current_fore.clear();
                }
                b"LastName" if in_author => in_last_name = true,
                b"ForeName" if in_author => in_fore_name = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut a) = current {
                    if in_pmid && a.pmid.is_empty() {
                        a.pmid = text;
                    } else if in_title {
                        a.title = text;
                    } else if in_abstract && a.abstract_text.is_empty() {
                        a.abstract_text = text;
                    } else if in_journal_title {
                        a.journal = text;
                    } else if in_year && a.year.is_empty() {
                        a.year = text;
                    } else if in_last_name {
                        current_last = text;
                    } else if in_fore_name {
                        current_fore = text;
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"PMID" => in_pmid = false,
                b"ArticleTitle" => in_title = false,
                b"AbstractText" => in_abstract = false,
                b"Journal" => in_journal = false,
                b"Title" => in_journal_title = false,
                b"PubDate" => in_pub_date = false,
                b"Year" => in_year = false,
                b"LastName" => in_last_name = false,
                b"ForeName" => in_fore_name = false,
                b"Author" => {
                    if in_author {
                        // Both name parts required for a "Given Family" entry.
                        if !current_fore.is_empty() && !current_last.is_empty() {
                            if let Some(ref mut a) = current {
                                a.authors.push(format!("{} {}", current_fore, current_last));
                            }
                        }
                        in_author = false;
                    }
                }
                b"PubmedArticle" => {
                    if let Some(a) = current.take() {
                        match a.finish() {
                            Some(record) => records.push(record),
                            None => {
                                warn!("Skipping article node without a PMID");
                                skipped += 1;
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CuraLinkError::MalformedPayload {
                    origin: "pubmed".to_string(),
                    message: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok((records, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MAX_TEXT_LEN, TRUNCATION_MARKER};

    fn article(pmid: &str, title: &str) -> String {
        format!(
            r#"<PubmedArticle>
  <MedlineCitation>
    <PMID>{pmid}</PMID>
    <Article>
      <Journal>
        <Title>Nature Medicine</Title>
        <JournalIssue><PubDate><Year>2022</Year></PubDate></JournalIssue>
      </Journal>
      <ArticleTitle>{title}</ArticleTitle>
      <Abstract><AbstractText>Some findings.</AbstractText></Abstract>
      <AuthorList>
        <Author><LastName>Curie</LastName><ForeName>Marie</ForeName></Author>
      </AuthorList>
    </Article>
  </MedlineCitation>
</PubmedArticle>"#
        )
    }

    fn wrap(articles: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\"?>\n<PubmedArticleSet>{}</PubmedArticleSet>",
            articles.join("\n")
        )
    }

    #[test]
    fn test_parse_complete_article() {
        let xml = wrap(&[article("12345678", "Insulin signaling in T2D")]);
        let (records, skipped) = parse_pubmed_xml(&xml).unwrap();

        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.external_id, "12345678");
        assert_eq!(r.source, PublicationSource::PubMed);
        assert_eq!(r.title, "Insulin signaling in T2D");
        assert_eq!(r.authors, vec!["Marie Curie".to_string()]);
        assert_eq!(r.abstract_text, "Some findings.");
        assert_eq!(r.journal, "Nature Medicine");
        assert_eq!(r.publication_year, "2022");
        assert_eq!(r.url, "https://pubmed.ncbi.nlm.nih.gov/12345678/");
    }

    #[test]
    fn test_article_missing_pmid_is_skipped_not_fatal() {
        let bad = r#"<PubmedArticle>
  <MedlineCitation>
    <Article><ArticleTitle>Orphan article</ArticleTitle></Article>
  </MedlineCitation>
</PubmedArticle>"#
            .to_string();

        let xml = wrap(&[
            article("1", "A"),
            article("2", "B"),
            bad,
            article("4", "D"),
            article("5", "E"),
        ]);
        let (records, skipped) = parse_pubmed_xml(&xml).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(skipped, 1);
        let ids: Vec<&str> = records.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4", "5"]);
    }

    #[test]
    fn test_missing_optional_fields_resolve_to_placeholders() {
        let xml = wrap(&["<PubmedArticle><MedlineCitation><PMID>42</PMID></MedlineCitation></PubmedArticle>"
            .to_string()]);
        let (records, _) = parse_pubmed_xml(&xml).unwrap();

        let r = &records[0];
        assert_eq!(r.title, NO_TITLE);
        assert_eq!(r.abstract_text, NO_ABSTRACT);
        assert_eq!(r.journal, UNKNOWN);
        assert_eq!(r.publication_year, UNKNOWN);
        assert!(r.authors.is_empty());
    }

    #[test]
    fn test_author_without_forename_is_dropped() {
        let xml = wrap(&[r#"<PubmedArticle>
  <MedlineCitation>
    <PMID>7</PMID>
    <Article>
      <AuthorList>
        <Author><LastName>Collective</LastName></Author>
        <Author><LastName>Doe</LastName><ForeName>Jane</ForeName></Author>
      </AuthorList>
    </Article>
  </MedlineCitation>
</PubmedArticle>"#
            .to_string()]);
        let (records, _) = parse_pubmed_xml(&xml).unwrap();

        assert_eq!(records[0].authors, vec!["Jane Doe".to_string()]);
    }

    #[test]
    fn test_long_abstract_is_truncated() {
        let long = "x".repeat(MAX_TEXT_LEN + 500);
        let xml = wrap(&[format!(
            "<PubmedArticle><MedlineCitation><PMID>9</PMID><Article>\
             <Abstract><AbstractText>{long}</AbstractText></Abstract>\
             </Article></MedlineCitation></PubmedArticle>"
        )]);
        let (records, _) = parse_pubmed_xml(&xml).unwrap();

        let text = &records[0].abstract_text;
        assert_eq!(text.chars().count(), MAX_TEXT_LEN + TRUNCATION_MARKER.len());
        assert!(text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_unparseable_document_is_malformed_payload() {
        let err = parse_pubmed_xml("<PubmedArticleSet><PMID></Oops>").unwrap_err();
        assert!(matches!(err, CuraLinkError::MalformedPayload { .. }));
    }
}
