use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{TermTranslator, normalize_terms, translation_prompt};
use crate::backend::{self, BackendError, Provider};
use crate::config::{ApiKey, Config};
use crate::gemini::GeminiClient;
use crate::gemini::grounding::extract_grounded_result;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 200;

impl TermTranslator for GeminiClient {
    async fn translate(&self, query: &str) -> Result<String, BackendError> {
        let response = self
            .generate_content(&translation_prompt(query), false, Some(0.0))
            .await?;
        let result = extract_grounded_result(&response)?;
        normalize_terms(Provider::Gemini, &result.answer)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI Chat Completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn from_config(http: Client, config: &Config) -> Option<Self> {
        Some(Self {
            http,
            api_key: config.credentials.openai_api_key.clone()?,
            model: config.models.openai.clone(),
            base_url: config.endpoints.openai.clone(),
        })
    }
}

impl TermTranslator for OpenAiClient {
    async fn translate(&self, query: &str) -> Result<String, BackendError> {
        let prompt = translation_prompt(query);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        let response: ChatResponse = backend::send_json(
            Provider::OpenAi,
            self.http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(self.api_key.expose())
                .json(&request),
        )
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| BackendError::missing(Provider::OpenAi, "choices[0].message.content"))?;
        normalize_terms(Provider::OpenAi, &content)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn from_config(http: Client, config: &Config) -> Option<Self> {
        Some(Self {
            http,
            api_key: config.credentials.anthropic_api_key.clone()?,
            model: config.models.anthropic.clone(),
            base_url: config.endpoints.anthropic.clone(),
        })
    }
}

impl TermTranslator for AnthropicClient {
    async fn translate(&self, query: &str) -> Result<String, BackendError> {
        let prompt = translation_prompt(query);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response: MessagesResponse = backend::send_json(
            Provider::Anthropic,
            self.http
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", self.api_key.expose())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request),
        )
        .await?;

        let text = response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| BackendError::missing(Provider::Anthropic, "content[].text"))?;
        normalize_terms(Provider::Anthropic, &text)
    }
}
