//! Search-grounded answers with a single ungrounded retry when the model
//! cannot use the search tool.

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::BackendError;
use crate::gemini::{GenerationBackend, Source as CitedSource};
use crate::search::SourceSelection;

pub const UNGROUNDED_DISCLAIMER: &str = "\n\n_Note: live search grounding was unavailable, so this answer was generated without cited sources._";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundedAnswer {
    pub answer_text: String,
    pub grounding_sources: Vec<CitedSource>,
    pub is_grounded: bool,
}

pub struct AnswerRequest<'a> {
    pub query: &'a str,
    pub terms: &'a str,
    pub sources: &'a SourceSelection,
}

pub async fn resolve(
    backend: &impl GenerationBackend,
    request: &AnswerRequest<'_>,
) -> Result<GroundedAnswer, BackendError> {
    let scope = source_scope(request.sources);
    let prompt = grounded_prompt(request.query, request.terms, scope.as_deref());

    match backend.generate(&prompt, true).await {
        Ok(result) => {
            info!(sources = result.sources.len(), "grounded answer complete");
            Ok(GroundedAnswer {
                answer_text: result.answer,
                grounding_sources: result.sources,
                is_grounded: true,
            })
        }
        Err(e) if e.is_capability_unsupported() => {
            warn!(error = %e, "search grounding unsupported, retrying without it");
            let prompt = relaxed_prompt(request.query, request.terms, scope.as_deref());
            let result = backend.generate(&prompt, false).await?;
            Ok(GroundedAnswer {
                answer_text: format!("{}{UNGROUNDED_DISCLAIMER}", result.answer),
                grounding_sources: Vec::new(),
                is_grounded: false,
            })
        }
        Err(e) => Err(e),
    }
}

/// Names the enabled sources; `None` when nothing is enabled.
fn source_scope(selection: &SourceSelection) -> Option<String> {
    let names: Vec<String> = selection
        .enabled()
        .into_iter()
        .map(|s| format!("{} ({})", s.display_name(), s.domain()))
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn grounded_prompt(query: &str, terms: &str, scope: Option<&str>) -> String {
    let scope_line = match scope {
        Some(scope) => format!("Use only information from these sources: {scope}."),
        None => "Use only reputable medical sources.".to_string(),
    };
    format!(
        "A patient describes their symptoms as: \"{query}\".\n\
         Relevant medical terms: {terms}.\n\
         {scope_line}\n\
         Explain what these symptoms may indicate, common causes, and when to seek medical care. \
         Do not give a diagnosis."
    )
}

fn relaxed_prompt(query: &str, terms: &str, scope: Option<&str>) -> String {
    let scope_line = match scope {
        Some(scope) => format!("Prefer information consistent with these sources: {scope}."),
        None => String::new(),
    };
    format!(
        "A patient describes their symptoms as: \"{query}\".\n\
         Relevant medical terms: {terms}.\n\
         Answer from general medical knowledge. {scope_line}\n\
         Explain what these symptoms may indicate, common causes, and when to seek medical care. \
         Do not give a diagnosis."
    )
}
