//! Explicit runtime configuration. The pipeline never reads the process
//! environment itself; `Config::from_env` is only called from `main`.

use std::env;
use std::fmt;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const EUTILS_API_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const MEDLINEPLUS_API_URL: &str = "https://wsearch.nlm.nih.gov/ws/query";
const GOOGLE_CSE_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[cfg(test)]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Named credential values. Presence selects providers; absence degrades.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub gemini_api_key: Option<ApiKey>,
    pub openai_api_key: Option<ApiKey>,
    pub anthropic_api_key: Option<ApiKey>,
    pub ncbi_api_key: Option<ApiKey>,
    pub google_cse_api_key: Option<ApiKey>,
    pub google_cse_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub gemini: String,
    pub openai: String,
    pub anthropic: String,
    pub eutils: String,
    pub medlineplus: String,
    pub google_cse: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini: GEMINI_API_BASE.to_string(),
            openai: OPENAI_API_BASE.to_string(),
            anthropic: ANTHROPIC_API_BASE.to_string(),
            eutils: EUTILS_API_BASE.to_string(),
            medlineplus: MEDLINEPLUS_API_URL.to_string(),
            google_cse: GOOGLE_CSE_API_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Routes every provider to one mock server, each under a distinct path.
    #[cfg(test)]
    pub(crate) fn mock(base: &str) -> Self {
        Self {
            gemini: format!("{base}/v1beta/models"),
            openai: format!("{base}/openai/v1"),
            anthropic: format!("{base}/anthropic/v1"),
            eutils: format!("{base}/entrez/eutils"),
            medlineplus: format!("{base}/ws/query"),
            google_cse: format!("{base}/customsearch/v1"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Models {
    pub gemini: String,
    pub openai: String,
    pub anthropic: String,
}

impl Default for Models {
    fn default() -> Self {
        Self {
            gemini: DEFAULT_GEMINI_MODEL.to_string(),
            openai: DEFAULT_OPENAI_MODEL.to_string(),
            anthropic: DEFAULT_ANTHROPIC_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub models: Models,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let key = |name: &str| value(name).map(ApiKey);

        let defaults = Models::default();
        Self {
            credentials: Credentials {
                gemini_api_key: key("GEMINI_API_KEY"),
                openai_api_key: key("OPENAI_API_KEY"),
                anthropic_api_key: key("ANTHROPIC_API_KEY"),
                ncbi_api_key: key("NCBI_API_KEY"),
                google_cse_api_key: key("GOOGLE_CSE_API_KEY"),
                google_cse_id: value("GOOGLE_CSE_ID"),
            },
            endpoints: Endpoints::default(),
            models: Models {
                gemini: value("GEMINI_MODEL").unwrap_or(defaults.gemini),
                openai: value("OPENAI_MODEL").unwrap_or(defaults.openai),
                anthropic: value("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic),
            },
        }
    }
}
