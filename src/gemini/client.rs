use reqwest::Client;
use tracing::{debug, warn};

use super::grounding::extract_grounded_result;
use super::types::{ApiError, GenerateContentRequest, GenerateContentResponse, GroundedResult};
use crate::backend::{self, BackendError, BackendErrorKind, Provider};
use crate::config::{ApiKey, Config};

/// Substrings Gemini uses when the search tool cannot be combined with the
/// selected model. The API exposes no dedicated error code for this.
const UNSUPPORTED_MARKERS: [&str; 2] = ["not supported", "unsupported"];
const CAPABILITY_MARKERS: [&str; 3] = ["search", "grounding", "tool"];

/// Text generation with optional Google Search grounding.
/// Implemented by `GeminiClient` for production; fakes are used in tests.
pub trait GenerationBackend {
    async fn generate(&self, prompt: &str, grounded: bool) -> Result<GroundedResult, BackendError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Returns `None` when no Gemini key is configured.
    pub fn from_config(http: Client, config: &Config) -> Option<Self> {
        let api_key = config.credentials.gemini_api_key.clone()?;
        Some(Self {
            http,
            api_key,
            model: config.models.gemini.clone(),
            base_url: config.endpoints.gemini.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            model: "gemini-2.5-flash".to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub(crate) async fn generate_content(
        &self,
        prompt: &str,
        grounded: bool,
        temperature: Option<f32>,
    ) -> Result<GenerateContentResponse, BackendError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let request = GenerateContentRequest::new(prompt, grounded, temperature);

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let body: GenerateContentResponse = backend::send_json(
            Provider::Gemini,
            self.http
                .post(&url)
                .header("x-goog-api-key", self.api_key.expose())
                .json(&request),
        )
        .await
        .map_err(classify_status_error)?;

        debug!(model = %self.model, grounded, "gemini generation complete");

        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "Gemini API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

impl GenerationBackend for GeminiClient {
    async fn generate(&self, prompt: &str, grounded: bool) -> Result<GroundedResult, BackendError> {
        let response = self.generate_content(prompt, grounded, None).await?;
        extract_grounded_result(&response)
    }
}

fn is_grounding_unsupported(message: &str) -> bool {
    let lower = message.to_lowercase();
    UNSUPPORTED_MARKERS.iter().any(|m| lower.contains(m))
        && CAPABILITY_MARKERS.iter().any(|m| lower.contains(m))
}

/// Refines the generic status error from the shared helper with
/// Gemini-specific meanings.
fn classify_status_error(err: BackendError) -> BackendError {
    match err.kind {
        BackendErrorKind::Status(_) if is_grounding_unsupported(&err.message) => {
            BackendError { kind: BackendErrorKind::CapabilityUnsupported, ..err }
        }
        BackendErrorKind::Status(403) => {
            BackendError { kind: BackendErrorKind::QuotaExhausted, ..err }
        }
        _ => err,
    }
}

fn classify_api_error(err: &ApiError) -> BackendError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    let kind = match err.code {
        _ if is_grounding_unsupported(&message) => BackendErrorKind::CapabilityUnsupported,
        Some(429) => BackendErrorKind::RateLimited,
        Some(403) => BackendErrorKind::QuotaExhausted,
        Some(code) => BackendErrorKind::Status(code),
        None => BackendErrorKind::Status(0),
    };
    BackendError::new(Provider::Gemini, kind, message)
}
