use std::collections::HashSet;

use tracing::warn;

use super::types::{GenerateContentResponse, GroundedResult, Source};
use crate::backend::{BackendError, Provider};

/// Pulls the answer text and cited web sources out of a Gemini response.
///
/// Missing grounding metadata is normal (ungrounded requests, or nothing
/// citable was found) and yields an empty source list. Missing answer text is
/// an error.
pub fn extract_grounded_result(
    response: &GenerateContentResponse,
) -> Result<GroundedResult, BackendError> {
    let candidate = response.candidates.first();

    let answer = candidate
        .map(|c| c.text().trim().to_string())
        .filter(|text| !text.is_empty());
    let (Some(candidate), Some(answer)) = (candidate, answer) else {
        warn!("Gemini returned empty answer (safety filter or empty response)");
        return Err(BackendError::missing(
            Provider::Gemini,
            "candidates[0].content.parts[].text",
        ));
    };

    let mut seen = HashSet::new();
    let sources = candidate
        .web_citations()
        .filter_map(|web| {
            let url = web.uri.as_ref().filter(|u| !u.is_empty())?.clone();
            Some(Source {
                title: web.title.clone().unwrap_or_else(|| url.clone()),
                url,
            })
        })
        .filter(|source| seen.insert(source.url.clone()))
        .collect();

    Ok(GroundedResult { answer, sources })
}
