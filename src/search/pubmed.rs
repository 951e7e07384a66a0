//! PubMed via NCBI E-utilities: `esearch` for PMIDs, then `esummary` for titles.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SearchResult, Source, truncate_snippet};
use crate::backend::{self, BackendError, BackendErrorKind, Provider};
use crate::config::{ApiKey, Config};

const SNIPPET_CHARS: usize = 200;
const ARTICLE_URL_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: Option<ESearchResult>,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    idlist: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    result: Option<ESummaryResult>,
}

/// `{"uids": [..], "<pmid>": {..}, ...}`
#[derive(Debug, Deserialize)]
struct ESummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    entries: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DocSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    pubdate: String,
    #[serde(default)]
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Clone)]
pub struct PubMedClient {
    http: Client,
    api_key: Option<ApiKey>,
    base_url: String,
}

impl PubMedClient {
    pub fn from_config(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.credentials.ncbi_api_key.clone(),
            base_url: config.endpoints.eutils.clone(),
        }
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.expose().to_string()));
        }
        params
    }

    pub async fn search(&self, terms: &str, max: usize) -> Result<Vec<SearchResult>, BackendError> {
        let pmids = self.esearch(terms, max).await?;
        debug!(count = pmids.len(), "pubmed esearch returned PMIDs");
        if pmids.is_empty() {
            return Ok(Vec::new());
        }
        self.esummary(&pmids).await
    }

    async fn esearch(&self, terms: &str, max: usize) -> Result<Vec<String>, BackendError> {
        let mut params = self.base_params();
        params.push(("term", terms.to_string()));
        params.push(("retmax", max.to_string()));
        params.push(("sort", "relevance".to_string()));

        let response: ESearchResponse = backend::send_json(
            Provider::PubMed,
            self.http
                .get(format!("{}/esearch.fcgi", self.base_url))
                .query(&params),
        )
        .await?;

        let mut ids = response
            .esearchresult
            .and_then(|r| r.idlist)
            .ok_or_else(|| BackendError::missing(Provider::PubMed, "esearchresult.idlist"))?;
        ids.truncate(max);
        Ok(ids)
    }

    async fn esummary(&self, pmids: &[String]) -> Result<Vec<SearchResult>, BackendError> {
        let mut params = self.base_params();
        params.push(("id", pmids.join(",")));

        let response: ESummaryResponse = backend::send_json(
            Provider::PubMed,
            self.http
                .get(format!("{}/esummary.fcgi", self.base_url))
                .query(&params),
        )
        .await?;

        let mut result = response
            .result
            .ok_or_else(|| BackendError::missing(Provider::PubMed, "result"))?;

        // `uids` preserves esearch relevance order; the keyed entries do not.
        result
            .uids
            .iter()
            .filter_map(|uid| result.entries.remove(uid).map(|entry| (uid, entry)))
            .map(|(uid, entry)| {
                let doc: DocSummary = serde_json::from_value(entry).map_err(|e| {
                    BackendError::new(Provider::PubMed, BackendErrorKind::Decode, e.to_string())
                })?;
                Ok(to_search_result(uid, doc))
            })
            .collect()
    }
}

fn to_search_result(pmid: &str, doc: DocSummary) -> SearchResult {
    let authors = match doc.authors.as_slice() {
        [] => String::new(),
        [only] => only.name.clone(),
        [first, ..] => format!("{} et al.", first.name),
    };
    let snippet = [authors.as_str(), doc.source.as_str(), doc.pubdate.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" · ");
    let title = if doc.title.is_empty() {
        format!("PMID {pmid}")
    } else {
        doc.title
    };

    SearchResult {
        title,
        snippet: truncate_snippet(&snippet, SNIPPET_CHARS),
        url: format!("{ARTICLE_URL_BASE}/{pmid}/"),
        source: Source::Pubmed,
    }
}
