//! Shared plumbing for every external provider: the typed failure every client
//! returns, and the request helper that turns HTTP outcomes into it.

use std::fmt;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const ERROR_SNIPPET_BYTES: usize = 200;

/// External provider a backend client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
    PubMed,
    MedlinePlus,
    GoogleCse,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::PubMed => "pubmed",
            Provider::MedlinePlus => "medlineplus",
            Provider::GoogleCse => "google-cse",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Transport,
    RateLimited,
    QuotaExhausted,
    Status(u16),
    Decode,
    MissingField,
    /// The provider rejected a requested capability (e.g. search grounding).
    CapabilityUnsupported,
    NotConfigured,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::Transport => f.write_str("network error"),
            BackendErrorKind::RateLimited => f.write_str("rate limited"),
            BackendErrorKind::QuotaExhausted => f.write_str("quota exhausted"),
            BackendErrorKind::Status(code) => write!(f, "HTTP {code}"),
            BackendErrorKind::Decode => f.write_str("malformed response"),
            BackendErrorKind::MissingField => f.write_str("incomplete response"),
            BackendErrorKind::CapabilityUnsupported => f.write_str("capability unsupported"),
            BackendErrorKind::NotConfigured => f.write_str("not configured"),
        }
    }
}

/// Failure of one external call. Clients never panic or leak transport errors
/// past this type.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{provider} {kind}: {message}")]
pub struct BackendError {
    pub provider: Provider,
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(provider: Provider, kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn transport(provider: Provider, err: &reqwest::Error) -> Self {
        Self::new(provider, BackendErrorKind::Transport, err.to_string())
    }

    pub fn missing(provider: Provider, field: &str) -> Self {
        Self::new(
            provider,
            BackendErrorKind::MissingField,
            format!("response is missing `{field}`"),
        )
    }

    pub fn not_configured(provider: Provider, what: &str) -> Self {
        Self::new(provider, BackendErrorKind::NotConfigured, format!("{what} not set"))
    }

    pub fn is_capability_unsupported(&self) -> bool {
        self.kind == BackendErrorKind::CapabilityUnsupported
    }
}

/// Sends `request` and returns the raw body of a 2xx response.
pub(crate) async fn send_text(
    provider: Provider,
    request: RequestBuilder,
) -> Result<String, BackendError> {
    let response = request
        .header("User-Agent", crate::USER_AGENT)
        .send()
        .await
        .map_err(|e| BackendError::transport(provider, &e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::transport(provider, &e))?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(%provider, "rate limited");
        return Err(BackendError::new(
            provider,
            BackendErrorKind::RateLimited,
            extract_error_message(&text).unwrap_or_else(|| "retry later".to_string()),
        ));
    }
    if !status.is_success() {
        let message = extract_error_message(&text).unwrap_or_else(|| body_snippet(&text));
        warn!(%provider, status = %status, "provider returned error status");
        return Err(BackendError::new(
            provider,
            BackendErrorKind::Status(status.as_u16()),
            message,
        ));
    }

    debug!(%provider, bytes = text.len(), "provider response received");
    Ok(text)
}

/// Sends `request` and decodes a 2xx JSON body into `T`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<T, BackendError> {
    let text = send_text(provider, request).await?;
    serde_json::from_str(&text)
        .map_err(|e| BackendError::new(provider, BackendErrorKind::Decode, e.to_string()))
}

/// Pulls a human-readable message out of the common JSON error envelopes:
/// `{"error": {"message": ..}}`, `{"error": ".."}`, `{"message": ".."}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value
        .pointer("/error/message")
        .or_else(|| value.get("error").filter(|e| e.is_string()))
        .or_else(|| value.get("message"))?
        .as_str()?
        .trim();
    (!message.is_empty()).then(|| message.to_string())
}

fn body_snippet(text: &str) -> String {
    if text.len() > ERROR_SNIPPET_BYTES {
        let end = text.floor_char_boundary(ERROR_SNIPPET_BYTES);
        text[..end].to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extracts_nested_error_message() {
        let body = r#"{"error": {"code": 400, "message": "bad request"}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("bad request"));
    }

    #[test]
    fn extracts_flat_error_fields() {
        assert_eq!(
            extract_error_message(r#"{"error": "nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(
            extract_error_message(r#"{"message": "denied"}"#).as_deref(),
            Some("denied")
        );
    }

    #[test]
    fn non_json_body_has_no_message() {
        assert!(extract_error_message("<html>oops</html>").is_none());
        assert!(extract_error_message(r#"{"error": {"code": 1}}"#).is_none());
    }

    #[test]
    fn snippet_respects_char_boundary() {
        let text = "é".repeat(150);
        let snippet = body_snippet(&text);
        assert!(snippet.len() <= ERROR_SNIPPET_BYTES);
        assert!(snippet.chars().all(|c| c == 'é'));
    }

    #[test]
    fn error_display_names_provider_and_kind() {
        let err = BackendError::new(Provider::PubMed, BackendErrorKind::Status(503), "down");
        assert_eq!(err.to_string(), "pubmed HTTP 503: down");
    }

    #[tokio::test]
    async fn send_json_maps_429_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let http = Client::new();
        let result: Result<serde_json::Value, _> =
            send_json(Provider::OpenAi, http.get(server.uri())).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::RateLimited);
        assert_eq!(err.provider, Provider::OpenAi);
    }

    #[tokio::test]
    async fn send_json_maps_bad_status_with_body_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": {"message": "invalid key"}})),
            )
            .mount(&server)
            .await;

        let http = Client::new();
        let err = send_json::<serde_json::Value>(Provider::Anthropic, http.get(server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Status(401));
        assert_eq!(err.message, "invalid key");
    }

    #[tokio::test]
    async fn send_json_reports_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        #[derive(Debug, serde::Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            field: String,
        }

        let http = Client::new();
        let err = send_json::<Shape>(Provider::PubMed, http.get(server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Decode);
    }

    #[tokio::test]
    async fn send_text_reports_transport_failure() {
        let http = Client::new();
        let err = send_text(Provider::MedlinePlus, http.get("http://127.0.0.1:1/"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Transport);
    }
}
