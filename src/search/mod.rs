//! Multi-source search: one client per knowledge source and the fan-out
//! aggregator that merges their results.

pub(crate) mod aggregator;
mod medlineplus;
mod pubmed;
mod site;
mod source;

pub use aggregator::aggregate;
pub use medlineplus::MedlinePlusClient;
pub use pubmed::PubMedClient;
pub use site::{Site, SiteSearchClient};
pub use source::{Source, SourceSelection};

use reqwest::Client;
use serde::Serialize;

use crate::backend::BackendError;
use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub source: Source,
}

/// Searches one source. `Ok(vec![])` is a valid "nothing found".
pub trait SourceBackend {
    async fn search(&self, source: Source, terms: &str) -> Result<Vec<SearchResult>, BackendError>;
}

/// Production backends for every [`Source`].
#[derive(Clone)]
pub struct SearchBackends {
    pubmed: PubMedClient,
    medlineplus: MedlinePlusClient,
    sites: SiteSearchClient,
}

impl SearchBackends {
    pub fn from_config(http: Client, config: &Config) -> Self {
        Self {
            pubmed: PubMedClient::from_config(http.clone(), config),
            medlineplus: MedlinePlusClient::from_config(http.clone(), config),
            sites: SiteSearchClient::from_config(http, config),
        }
    }
}

impl SourceBackend for SearchBackends {
    async fn search(&self, source: Source, terms: &str) -> Result<Vec<SearchResult>, BackendError> {
        match source {
            Source::Pubmed => self.pubmed.search(terms, source.result_cap()).await,
            Source::Medlineplus => self.medlineplus.search(terms, source.result_cap()).await,
            Source::MayoClinic => {
                let max = source.result_cap();
                self.sites.search(Site::MayoClinic, terms, max).await
            }
            Source::ClevelandClinic => {
                let max = source.result_cap();
                self.sites.search(Site::ClevelandClinic, terms, max).await
            }
        }
    }
}

/// Truncates to at most `max` characters, marking the cut with `...`.
pub(crate) fn truncate_snippet(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((end, _)) => format!("{}...", text[..end].trim_end()),
    }
}

/// Removes markup tags and collapses whitespace. Inline highlight tags vanish;
/// any other tag acts as a word break.
pub(crate) fn strip_markup(text: &str) -> String {
    const INLINE: [&str; 5] = ["span", "b", "i", "em", "strong"];

    let mut out = String::with_capacity(text.len());
    let mut tag: Option<String> = None;
    for c in text.chars() {
        match tag.as_mut() {
            None if c == '<' => tag = Some(String::new()),
            None => out.push(c),
            Some(inner) if c == '>' => {
                let name = inner
                    .trim_start_matches('/')
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                if !INLINE.contains(&name.as_str()) {
                    out.push(' ');
                }
                tag = None;
            }
            Some(inner) => inner.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
