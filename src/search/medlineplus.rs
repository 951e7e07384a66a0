//! MedlinePlus health topics via the NLM web service, which only speaks XML:
//!
//! ```xml
//! <nlmSearchResult>
//!   <list num="2" start="0" per="3">
//!     <document rank="0" url="https://medlineplus.gov/headache.html">
//!       <content name="title">&lt;span class="qt0"&gt;Headache&lt;/span&gt;</content>
//!       <content name="FullSummary">...</content>
//!     </document>
//!   </list>
//! </nlmSearchResult>
//! ```

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SearchResult, Source, strip_markup, truncate_snippet};
use crate::backend::{self, BackendError, BackendErrorKind, Provider};
use crate::config::Config;

const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
#[serde(rename = "nlmSearchResult")]
struct NlmSearchResult {
    list: Option<DocumentList>,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(rename = "document", default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "@url")]
    url: String,
    #[serde(rename = "content", default)]
    fields: Vec<ContentField>,
}

#[derive(Debug, Deserialize)]
struct ContentField {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    text: String,
}

impl Document {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.text.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct MedlinePlusClient {
    http: Client,
    base_url: String,
}

impl MedlinePlusClient {
    pub fn from_config(http: Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.endpoints.medlineplus.clone(),
        }
    }

    pub async fn search(&self, terms: &str, max: usize) -> Result<Vec<SearchResult>, BackendError> {
        let max_param = max.to_string();
        let xml = backend::send_text(
            Provider::MedlinePlus,
            self.http.get(&self.base_url).query(&[
                ("db", "healthTopics"),
                ("term", terms),
                ("retmax", max_param.as_str()),
            ]),
        )
        .await?;

        let results = parse_health_topics(&xml, max)?;
        debug!(count = results.len(), "medlineplus search complete");
        Ok(results)
    }
}

fn parse_health_topics(xml: &str, max: usize) -> Result<Vec<SearchResult>, BackendError> {
    let parsed: NlmSearchResult = quick_xml::de::from_str(xml).map_err(|e| {
        BackendError::new(Provider::MedlinePlus, BackendErrorKind::Decode, e.to_string())
    })?;

    let documents = parsed.list.map(|l| l.documents).unwrap_or_default();
    Ok(documents
        .iter()
        .filter(|doc| !doc.url.is_empty())
        .take(max)
        .map(|doc| {
            let title = doc
                .field("title")
                .map(strip_markup)
                .unwrap_or_else(|| doc.url.clone());
            let summary = doc
                .field("FullSummary")
                .or_else(|| doc.field("snippet"))
                .map(strip_markup)
                .unwrap_or_default();
            SearchResult {
                title,
                snippet: truncate_snippet(&summary, SNIPPET_CHARS),
                url: doc.url.clone(),
                source: Source::Medlineplus,
            }
        })
        .collect())
}
