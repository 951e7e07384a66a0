//! Symptom text → medical terminology, via exactly one provider per call.
//!
//! Provider priority is Gemini, then OpenAI, then Anthropic, decided purely by
//! which credentials are configured. A configured provider that fails is
//! reported as a failure; there is no fallthrough to the next paid provider.
//! Only when no provider is configured does the local keyword mapper run.

mod fallback;
mod providers;

pub use fallback::map_terms;
pub use providers::{AnthropicClient, OpenAiClient};

use reqwest::Client;
use tracing::{debug, info};

use crate::backend::{BackendError, Provider};
use crate::config::{Config, Credentials};
use crate::gemini::GeminiClient;

pub trait TermTranslator {
    async fn translate(&self, query: &str) -> Result<String, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationProvider {
    Gemini,
    OpenAi,
    Anthropic,
}

/// First provider, in priority order, whose credential is present.
pub fn select_provider(credentials: &Credentials) -> Option<TranslationProvider> {
    if credentials.gemini_api_key.is_some() {
        Some(TranslationProvider::Gemini)
    } else if credentials.openai_api_key.is_some() {
        Some(TranslationProvider::OpenAi)
    } else if credentials.anthropic_api_key.is_some() {
        Some(TranslationProvider::Anthropic)
    } else {
        None
    }
}

/// The translation strategy chosen for one request.
pub enum Translator {
    Gemini(GeminiClient),
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
    Local,
}

impl Translator {
    pub fn select(http: &Client, config: &Config) -> Self {
        let selected = match select_provider(&config.credentials) {
            Some(TranslationProvider::Gemini) => {
                GeminiClient::from_config(http.clone(), config).map(Translator::Gemini)
            }
            Some(TranslationProvider::OpenAi) => {
                OpenAiClient::from_config(http.clone(), config).map(Translator::OpenAi)
            }
            Some(TranslationProvider::Anthropic) => {
                AnthropicClient::from_config(http.clone(), config).map(Translator::Anthropic)
            }
            None => None,
        };
        selected.unwrap_or(Translator::Local)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Translator::Gemini(_) => "gemini",
            Translator::OpenAi(_) => "openai",
            Translator::Anthropic(_) => "anthropic",
            Translator::Local => "local",
        }
    }
}

impl TermTranslator for Translator {
    async fn translate(&self, query: &str) -> Result<String, BackendError> {
        debug!(provider = self.name(), "translating symptom description");
        let terms = match self {
            Translator::Gemini(client) => client.translate(query).await?,
            Translator::OpenAi(client) => client.translate(query).await?,
            Translator::Anthropic(client) => client.translate(query).await?,
            Translator::Local => {
                info!("no translation provider configured, using keyword mapping");
                map_terms(query)
            }
        };
        info!(provider = self.name(), terms = %terms, "translation complete");
        Ok(terms)
    }
}

pub(crate) fn translation_prompt(query: &str) -> String {
    format!(
        "Translate the following patient symptom description into precise medical terminology. \
         Respond with the medical terms only, comma-separated, with no explanation.\n\n\
         Description: {query}"
    )
}

/// Cleans model output; empty output is an error rather than empty terms.
pub(crate) fn normalize_terms(provider: Provider, raw: &str) -> Result<String, BackendError> {
    let terms = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .trim_end_matches('.')
        .trim();
    if terms.is_empty() {
        return Err(BackendError::missing(provider, "translated terms"));
    }
    Ok(terms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendErrorKind;
    use crate::config::ApiKey;

    fn credentials(gemini: bool, openai: bool, anthropic: bool) -> Credentials {
        let key = |on: bool| on.then(|| ApiKey::new("k"));
        Credentials {
            gemini_api_key: key(gemini),
            openai_api_key: key(openai),
            anthropic_api_key: key(anthropic),
            ..Default::default()
        }
    }

    #[test]
    fn priority_order_is_gemini_openai_anthropic() {
        assert_eq!(
            select_provider(&credentials(true, true, true)),
            Some(TranslationProvider::Gemini)
        );
        assert_eq!(
            select_provider(&credentials(false, true, true)),
            Some(TranslationProvider::OpenAi)
        );
        assert_eq!(
            select_provider(&credentials(false, false, true)),
            Some(TranslationProvider::Anthropic)
        );
        assert_eq!(select_provider(&credentials(false, false, false)), None);
    }

    #[test]
    fn unrelated_credentials_do_not_select_a_provider() {
        let creds = Credentials {
            ncbi_api_key: Some(ApiKey::new("n")),
            google_cse_api_key: Some(ApiKey::new("g")),
            google_cse_id: Some("cx".into()),
            ..Default::default()
        };
        assert_eq!(select_provider(&creds), None);
    }

    #[test]
    fn select_builds_matching_strategy() {
        let config = Config::from_lookup(|name| (name == "ANTHROPIC_API_KEY").then(|| "k".into()));
        assert_eq!(Translator::select(&Client::new(), &config).name(), "anthropic");

        let config = Config::from_lookup(|_| None);
        assert_eq!(Translator::select(&Client::new(), &config).name(), "local");
    }

    #[tokio::test]
    async fn local_translation_uses_keyword_table() {
        let terms = Translator::Local
            .translate("bad headache with light sensitivity")
            .await
            .unwrap();
        assert_eq!(terms, "cephalgia, photophobia");
    }

    #[tokio::test]
    async fn local_translation_without_match_keeps_query() {
        let terms = Translator::Local.translate("odd tingling").await.unwrap();
        assert_eq!(terms, "odd tingling");
    }

    #[test]
    fn normalize_strips_quotes_and_period() {
        assert_eq!(
            normalize_terms(Provider::OpenAi, "  \"dyspnea, tachycardia.\"\n").unwrap(),
            "dyspnea, tachycardia"
        );
    }

    #[test]
    fn normalize_rejects_blank_output() {
        let err = normalize_terms(Provider::Gemini, " \"\" . ").unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::MissingField);
    }

    #[test]
    fn prompt_embeds_query() {
        assert!(translation_prompt("sore throat").contains("Description: sore throat"));
    }
}
