//! Wire schema for `models/{model}:generateContent`. The request side borrows
//! the prompt; the response side keeps only what answer extraction reads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: [UserTurn<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<[SearchTool; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    /// Single user turn. `grounded` attaches the Google Search tool.
    pub fn new(prompt: &'a str, grounded: bool, temperature: Option<f32>) -> Self {
        Self {
            contents: [UserTurn {
                role: "user",
                parts: [PromptPart { text: prompt }],
            }],
            tools: grounded.then(|| [SearchTool::default()]),
            generation_config: temperature.map(|temperature| GenerationConfig { temperature }),
        }
    }
}

#[derive(Debug, Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    parts: [PromptPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PromptPart<'a> {
    text: &'a str,
}

/// Serializes as `{"google_search": {}}`.
#[derive(Debug, Default, Serialize)]
struct SearchTool {
    google_search: EmptyObject,
}

#[derive(Debug, Default, Serialize)]
struct EmptyObject {}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Some failures arrive in-band with a 200 status.
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

impl Candidate {
    /// All text parts concatenated in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .flat_map(|content| &content.parts)
            .map(|part| part.text.as_str())
            .collect()
    }

    pub fn web_citations(&self) -> impl Iterator<Item = &WebCitation> {
        self.grounding_metadata
            .iter()
            .flat_map(|metadata| &metadata.grounding_chunks)
            .filter_map(|chunk| chunk.web.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
pub struct TextPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebCitation>,
}

#[derive(Debug, Deserialize)]
pub struct WebCitation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: Option<String>,
}

/// Generated text plus the web sources Gemini cited while producing it.
#[derive(Debug)]
pub struct GroundedResult {
    pub answer: String,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grounded_request_carries_search_tool() {
        let body = serde_json::to_value(GenerateContentRequest::new("q", true, None)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "q"}]}],
                "tools": [{"google_search": {}}]
            })
        );
    }

    #[test]
    fn plain_request_omits_tools_and_keeps_temperature() {
        let body = serde_json::to_value(GenerateContentRequest::new("q", false, Some(0.0))).unwrap();
        assert!(body.get("tools").is_none());
        assert_eq!(body["generationConfig"]["temperature"], json!(0.0));
    }

    #[test]
    fn candidate_without_content_has_empty_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(response.candidates[0].text(), "");
        assert_eq!(response.candidates[0].web_citations().count(), 0);
    }
}
