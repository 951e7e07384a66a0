//! Site-restricted search through the Google Programmable Search JSON API.
//!
//! Without `GOOGLE_CSE_API_KEY` and `GOOGLE_CSE_ID` every site search returns a
//! single link to the site's own search page instead of failing.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::form_urlencoded;

use super::{SearchResult, Source, truncate_snippet};
use crate::backend::{self, BackendError, Provider};
use crate::config::{ApiKey, Config};

const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct CseResponse {
    /// Absent when the search matched nothing.
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// Sources served by site-restricted search rather than a dedicated API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    MayoClinic,
    ClevelandClinic,
}

impl Site {
    pub fn source(self) -> Source {
        match self {
            Site::MayoClinic => Source::MayoClinic,
            Site::ClevelandClinic => Source::ClevelandClinic,
        }
    }

    /// The site's own search page; takes the terms as `q`.
    fn search_page(self) -> &'static str {
        match self {
            Site::MayoClinic => "https://www.mayoclinic.org/search/search-results",
            Site::ClevelandClinic => "https://my.clevelandclinic.org/search",
        }
    }
}

#[derive(Clone)]
struct CseCredentials {
    api_key: ApiKey,
    engine_id: String,
}

#[derive(Clone)]
pub struct SiteSearchClient {
    http: Client,
    base_url: String,
    credentials: Option<CseCredentials>,
}

impl SiteSearchClient {
    pub fn from_config(http: Client, config: &Config) -> Self {
        let creds = &config.credentials;
        let credentials = match (&creds.google_cse_api_key, &creds.google_cse_id) {
            (Some(api_key), Some(engine_id)) => Some(CseCredentials {
                api_key: api_key.clone(),
                engine_id: engine_id.clone(),
            }),
            _ => None,
        };
        Self {
            http,
            base_url: config.endpoints.google_cse.clone(),
            credentials,
        }
    }

    pub async fn search(
        &self,
        site: Site,
        terms: &str,
        max: usize,
    ) -> Result<Vec<SearchResult>, BackendError> {
        let source = site.source();
        let Some(credentials) = &self.credentials else {
            info!(%source, "no search credentials, returning direct search link");
            return Ok(vec![direct_search_result(site, terms)]);
        };

        let num = max.clamp(1, 10).to_string();
        let response: CseResponse = backend::send_json(
            Provider::GoogleCse,
            self.http.get(&self.base_url).query(&[
                ("key", credentials.api_key.expose()),
                ("cx", credentials.engine_id.as_str()),
                ("q", terms),
                ("siteSearch", source.domain()),
                ("num", num.as_str()),
            ]),
        )
        .await?;

        let results: Vec<SearchResult> = response
            .items
            .into_iter()
            .filter_map(|item| {
                let url = item.link.filter(|l| !l.is_empty())?;
                Some(SearchResult {
                    title: item.title.unwrap_or_else(|| url.clone()),
                    snippet: truncate_snippet(
                        &item.snippet.unwrap_or_default().replace('\n', " "),
                        SNIPPET_CHARS,
                    ),
                    url,
                    source,
                })
            })
            .take(max)
            .collect();
        debug!(%source, count = results.len(), "site search complete");
        Ok(results)
    }
}

/// Link to the site's own search page, used when inline results are unavailable.
fn direct_search_url(site: Site, terms: &str) -> String {
    let query: String = form_urlencoded::byte_serialize(terms.as_bytes()).collect();
    format!("{}?q={query}", site.search_page())
}

fn direct_search_result(site: Site, terms: &str) -> SearchResult {
    let source = site.source();
    SearchResult {
        title: format!("Search {} for \"{terms}\"", source.display_name()),
        snippet: format!(
            "Inline results are unavailable; open this link to search {} directly. \
             Set GOOGLE_CSE_API_KEY and GOOGLE_CSE_ID to enable them.",
            source.domain()
        ),
        url: direct_search_url(site, terms),
        source,
    }
}
