use futures::future::join_all;
use tracing::{info, warn};

use super::{SearchResult, SourceBackend, SourceSelection};

/// Queries every enabled source concurrently and merges the results.
///
/// Waits for all sources to settle. A failing source contributes nothing and
/// never fails the aggregate. Output is grouped per source in fixed invocation
/// order regardless of which call finished first, each group capped at the
/// source's result cap.
pub async fn aggregate(
    backend: &impl SourceBackend,
    terms: &str,
    selection: &SourceSelection,
) -> Vec<SearchResult> {
    let sources = selection.enabled();
    info!(terms, sources = sources.len(), "searching sources");

    let outcomes = join_all(sources.iter().map(|&source| backend.search(source, terms))).await;

    let mut merged = Vec::new();
    let mut failed = 0usize;
    for (source, outcome) in sources.into_iter().zip(outcomes) {
        match outcome {
            Ok(results) => merged.extend(results.into_iter().take(source.result_cap())),
            Err(e) => {
                failed += 1;
                warn!(%source, error = %e, "source failed (continuing with other sources)");
            }
        }
    }

    info!(results = merged.len(), failed, "search complete");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendErrorKind, Provider};
    use crate::search::Source;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeBackend {
        responses: HashMap<Source, Result<Vec<SearchResult>, BackendError>>,
        delays: HashMap<Source, Duration>,
        calls: Mutex<Vec<(Source, String)>>,
    }

    impl FakeBackend {
        fn with(mut self, source: Source, response: Result<Vec<SearchResult>, BackendError>) -> Self {
            self.responses.insert(source, response);
            self
        }

        fn delayed(mut self, source: Source, millis: u64) -> Self {
            self.delays.insert(source, Duration::from_millis(millis));
            self
        }

        fn called_sources(&self) -> Vec<Source> {
            self.calls.lock().unwrap().iter().map(|(s, _)| *s).collect()
        }
    }

    impl SourceBackend for FakeBackend {
        async fn search(
            &self,
            source: Source,
            terms: &str,
        ) -> Result<Vec<SearchResult>, BackendError> {
            self.calls.lock().unwrap().push((source, terms.to_string()));
            if let Some(delay) = self.delays.get(&source) {
                tokio::time::sleep(*delay).await;
            }
            self.responses.get(&source).cloned().unwrap_or(Ok(Vec::new()))
        }
    }

    fn results(source: Source, n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| SearchResult {
                title: format!("{source} {i}"),
                snippet: String::new(),
                url: format!("https://{}/{i}", source.domain()),
                source,
            })
            .collect()
    }

    fn failure() -> BackendError {
        BackendError::new(Provider::PubMed, BackendErrorKind::Status(503), "unavailable")
    }

    fn titles(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn caps_each_source_before_merge() {
        let backend = FakeBackend::default()
            .with(Source::Pubmed, Ok(results(Source::Pubmed, 9)))
            .with(Source::Medlineplus, Ok(results(Source::Medlineplus, 7)));

        let merged = aggregate(
            &backend,
            "cephalgia",
            &SourceSelection::only(&[Source::Pubmed, Source::Medlineplus]),
        )
        .await;

        let count = |s: Source| merged.iter().filter(|r| r.source == s).count();
        assert_eq!(count(Source::Pubmed), 5);
        assert_eq!(count(Source::Medlineplus), 3);
    }

    #[tokio::test]
    async fn failed_source_contributes_nothing() {
        let backend = FakeBackend::default()
            .with(Source::Pubmed, Err(failure()))
            .with(Source::Medlineplus, Ok(results(Source::Medlineplus, 2)))
            .with(Source::MayoClinic, Ok(results(Source::MayoClinic, 1)));

        let merged = aggregate(
            &backend,
            "x",
            &SourceSelection::excluding(&[Source::ClevelandClinic]),
        )
        .await;

        assert_eq!(
            titles(&merged),
            ["medlineplus 0", "medlineplus 1", "mayo-clinic 0"]
        );
    }

    #[tokio::test]
    async fn all_sources_failing_is_empty_not_error() {
        let backend = FakeBackend::default()
            .with(Source::Pubmed, Err(failure()))
            .with(Source::Medlineplus, Err(failure()))
            .with(Source::MayoClinic, Err(failure()))
            .with(Source::ClevelandClinic, Err(failure()));

        let merged = aggregate(&backend, "x", &SourceSelection::default()).await;
        assert!(merged.is_empty());
        assert_eq!(backend.called_sources().len(), 4);
    }

    #[tokio::test]
    async fn merge_order_ignores_completion_order() {
        let backend = FakeBackend::default()
            .with(Source::Pubmed, Ok(results(Source::Pubmed, 1)))
            .with(Source::ClevelandClinic, Ok(results(Source::ClevelandClinic, 1)))
            .delayed(Source::Pubmed, 50);

        let merged = aggregate(
            &backend,
            "x",
            &SourceSelection::only(&[Source::Pubmed, Source::ClevelandClinic]),
        )
        .await;

        assert_eq!(titles(&merged), ["pubmed 0", "cleveland-clinic 0"]);
    }

    #[tokio::test]
    async fn disabled_sources_are_never_called() {
        let backend = FakeBackend::default();
        let selection = SourceSelection::only(&[Source::MayoClinic]);

        aggregate(&backend, "vertigo", &selection).await;

        assert_eq!(backend.called_sources(), vec![Source::MayoClinic]);
        assert_eq!(backend.calls.lock().unwrap()[0].1, "vertigo");
    }

    #[tokio::test]
    async fn no_enabled_sources_returns_empty() {
        let backend = FakeBackend::default();
        let merged = aggregate(&backend, "x", &SourceSelection::only(&[])).await;
        assert!(merged.is_empty());
        assert!(backend.called_sources().is_empty());
    }

    #[tokio::test]
    async fn repeated_calls_return_identical_results() {
        let backend = FakeBackend::default()
            .with(Source::Pubmed, Ok(results(Source::Pubmed, 3)))
            .with(Source::MayoClinic, Ok(results(Source::MayoClinic, 2)));
        let selection = SourceSelection::default();

        let first = aggregate(&backend, "x", &selection).await;
        let second = aggregate(&backend, "x", &selection).await;
        assert_eq!(first, second);
    }
}
