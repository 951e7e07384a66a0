//! Orchestration facade: translation first, then the grounded answer and the
//! source search side by side.

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::answer::{self, AnswerRequest};
use crate::backend::{BackendError, Provider};
use crate::config::Config;
use crate::gemini::{GeminiClient, Source as CitedSource};
use crate::search::{self, SearchBackends, SearchResult, SourceSelection};
use crate::translate::{TermTranslator, Translator};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("translation failed: {0}")]
    Translation(BackendError),

    #[error("AI search failed: {0}")]
    Generation(BackendError),
}

impl PipelineError {
    /// HTTP-equivalent status for the presentation layer.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::EmptyQuery => 400,
            PipelineError::Translation(_) | PipelineError::Generation(_) => 502,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let error = match self {
            PipelineError::EmptyQuery => "Invalid request",
            PipelineError::Translation(_) => "Failed to translate symptoms",
            PipelineError::Generation(_) => "Failed to generate AI answer",
        };
        ErrorResponse {
            error: error.to_string(),
            details: self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub medical_terms: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSearchResponse {
    pub answer: String,
    pub sources: Vec<CitedSource>,
    pub has_grounding: bool,
    pub used_grounding: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct StageFailure {
    pub stage: &'static str,
    pub error: String,
    pub details: String,
}

/// Everything one consultation produced; failed stages are listed, not fatal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub query: String,
    pub medical_terms: String,
    pub answer: Option<AiSearchResponse>,
    pub results: Vec<SearchResult>,
    pub failures: Vec<StageFailure>,
}

/// Stateless request pipeline. Every call builds fresh results from `config`.
pub struct Pipeline {
    http: Client,
    config: Config,
    search: SearchBackends,
    gemini: Option<GeminiClient>,
}

impl Pipeline {
    pub fn new(config: Config, http: Client) -> Self {
        let search = SearchBackends::from_config(http.clone(), &config);
        let gemini = GeminiClient::from_config(http.clone(), &config);
        Self {
            http,
            config,
            search,
            gemini,
        }
    }

    pub async fn translate(&self, query: &str) -> Result<TranslateResponse, PipelineError> {
        let query = validate(query)?;
        info!(query, "translate");
        let medical_terms = self.translate_terms(query).await?;
        Ok(TranslateResponse { medical_terms })
    }

    pub async fn ai_search(
        &self,
        query: &str,
        medical_terms: &str,
        sources: &SourceSelection,
    ) -> Result<AiSearchResponse, PipelineError> {
        let query = validate(query)?;
        let terms = match medical_terms.trim() {
            "" => query,
            terms => terms,
        };
        info!(query, terms, "ai search");
        self.answer(query, terms, sources).await
    }

    pub async fn search(
        &self,
        query: &str,
        sources: &SourceSelection,
    ) -> Result<SearchResponse, PipelineError> {
        let query = validate(query)?;
        let results = search::aggregate(&self.search, query, sources).await;
        Ok(SearchResponse { results })
    }

    /// Translate, then answer and search concurrently. Only translation
    /// failure (or an empty query) fails the whole call.
    pub async fn consult(
        &self,
        query: &str,
        sources: &SourceSelection,
    ) -> Result<Consultation, PipelineError> {
        let query = validate(query)?;
        info!(query, "consult");
        let medical_terms = self.translate_terms(query).await?;

        let (answer, results) = tokio::join!(
            self.answer(query, &medical_terms, sources),
            search::aggregate(&self.search, &medical_terms, sources),
        );

        let mut failures = Vec::new();
        let answer = match answer {
            Ok(answer) => Some(answer),
            Err(e) => {
                warn!(error = %e, "AI answer unavailable (returning search results only)");
                let response = e.to_response();
                failures.push(StageFailure {
                    stage: "ai-search",
                    error: response.error,
                    details: response.details,
                });
                None
            }
        };

        info!(
            results = results.len(),
            answered = answer.is_some(),
            "consult complete"
        );
        Ok(Consultation {
            query: query.to_string(),
            medical_terms,
            answer,
            results,
            failures,
        })
    }

    async fn translate_terms(&self, query: &str) -> Result<String, PipelineError> {
        Translator::select(&self.http, &self.config)
            .translate(query)
            .await
            .map_err(PipelineError::Translation)
    }

    async fn answer(
        &self,
        query: &str,
        terms: &str,
        sources: &SourceSelection,
    ) -> Result<AiSearchResponse, PipelineError> {
        let gemini = self.gemini.as_ref().ok_or_else(|| {
            PipelineError::Generation(BackendError::not_configured(
                Provider::Gemini,
                "GEMINI_API_KEY",
            ))
        })?;

        let request = AnswerRequest {
            query,
            terms,
            sources,
        };
        let grounded = answer::resolve(gemini, &request)
            .await
            .map_err(PipelineError::Generation)?;

        Ok(AiSearchResponse {
            has_grounding: !grounded.grounding_sources.is_empty(),
            used_grounding: grounded.is_grounded,
            answer: grounded.answer_text,
            sources: grounded.grounding_sources,
        })
    }
}

fn validate(query: &str) -> Result<&str, PipelineError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PipelineError::EmptyQuery);
    }
    Ok(query)
}
