//! Markdown rendering of a consultation for terminal reading.

use crate::pipeline::Consultation;
use crate::search::Source;

pub fn format_consultation(consultation: &Consultation) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Symptoms: {}\n\n", single_line(&consultation.query)));
    out.push_str(&format!("**Medical terms:** {}\n\n", consultation.medical_terms));

    if let Some(answer) = &consultation.answer {
        out.push_str("## AI Summary\n\n");
        out.push_str(&answer.answer);
        out.push_str("\n\n");
        if !answer.sources.is_empty() {
            out.push_str("**Cited sources:**\n");
            for source in &answer.sources {
                out.push_str(&format!("- {}\n", link(&source.title, &source.url)));
            }
            out.push('\n');
        }
    }

    for source in Source::ALL {
        let results: Vec<_> = consultation
            .results
            .iter()
            .filter(|r| r.source == source)
            .collect();
        if results.is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n\n", source.display_name()));
        for result in results {
            out.push_str(&format!("- {}\n", link(&result.title, &result.url)));
            if !result.snippet.is_empty() {
                out.push_str(&format!("  {}\n", single_line(&result.snippet)));
            }
        }
        out.push('\n');
    }

    if consultation.results.is_empty() {
        out.push_str("_No search results._\n\n");
    }

    if !consultation.failures.is_empty() {
        out.push_str("## Unavailable\n\n");
        for failure in &consultation.failures {
            out.push_str(&format!("- {}: {}\n", failure.stage, failure.details));
        }
    }

    out
}

fn link(title: &str, url: &str) -> String {
    format!("[{}]({})", escape_link_text(title), escape_link_text(url))
}

/// Backslash-escapes the characters that terminate Markdown link parts.
fn escape_link_text(s: &str) -> String {
    s.chars().fold(String::with_capacity(s.len()), |mut out, c| {
        if matches!(c, '[' | ']' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
        out
    })
}

fn single_line(s: &str) -> String {
    s.split(['\n', '\r']).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::Source as CitedSource;
    use crate::pipeline::{AiSearchResponse, StageFailure};
    use crate::search::SearchResult;

    fn result(source: Source, title: &str) -> SearchResult {
        SearchResult {
            title: title.into(),
            snippet: "snippet text".into(),
            url: format!("https://{}/x", source.domain()),
            source,
        }
    }

    fn consultation() -> Consultation {
        Consultation {
            query: "bad headache\nwith light sensitivity".into(),
            medical_terms: "cephalgia, photophobia".into(),
            answer: Some(AiSearchResponse {
                answer: "Possibly migraine.".into(),
                sources: vec![CitedSource {
                    title: "Migraine (overview)".into(),
                    url: "https://medlineplus.gov/migraine.html".into(),
                }],
                has_grounding: true,
                used_grounding: true,
            }),
            results: vec![
                result(Source::Pubmed, "Photophobia [review]"),
                result(Source::MayoClinic, "Migraine"),
            ],
            failures: vec![],
        }
    }

    #[test]
    fn renders_sections_per_source() {
        let text = format_consultation(&consultation());
        assert!(text.contains("# Symptoms: bad headache with light sensitivity"));
        assert!(text.contains("**Medical terms:** cephalgia, photophobia"));
        assert!(text.contains("## AI Summary"));
        assert!(text.contains("## PubMed"));
        assert!(text.contains("## Mayo Clinic"));
        assert!(!text.contains("## MedlinePlus"));
    }

    #[test]
    fn source_section_layout() {
        let text = format_consultation(&consultation());
        assert!(text.contains(
            "## PubMed\n\n- [Photophobia \\[review\\]](https://pubmed.ncbi.nlm.nih.gov/x)\n  snippet text\n\n"
        ));
        assert!(text.starts_with("# Symptoms: bad headache with light sensitivity\n\n**Medical terms:**"));
    }

    #[test]
    fn escapes_link_text() {
        let text = format_consultation(&consultation());
        assert!(text.contains(r"[Migraine \(overview\)](https://medlineplus.gov/migraine.html)"));
        assert!(text.contains(r"[Photophobia \[review\]]"));
    }

    #[test]
    fn lists_failures_and_empty_results() {
        let mut c = consultation();
        c.answer = None;
        c.results.clear();
        c.failures.push(StageFailure {
            stage: "ai-search",
            error: "Failed to generate AI answer".into(),
            details: "gemini not configured: GEMINI_API_KEY not set".into(),
        });

        let text = format_consultation(&c);
        assert!(!text.contains("## AI Summary"));
        assert!(text.contains("_No search results._"));
        assert!(text.contains("- ai-search: gemini not configured"));
    }
}
