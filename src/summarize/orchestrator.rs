// Runs every facet prompt concurrently and assembles the summary
use crate::summarize::facets::Facet;
use crate::summarize::llm::{complete_with_retry, LlmClient, RetryPolicy};
use crate::types::PaperError;
use futures::future::join_all;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Raw completion text per facet; a failed facet is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryFacets {
    pub authors: String,
    pub summary: String,
    pub key_results: String,
    pub keywords: String,
    pub limitations: String,
}

impl SummaryFacets {
    pub fn get(&self, facet: Facet) -> &str {
        match facet {
            Facet::Authors => &self.authors,
            Facet::Summary => &self.summary,
            Facet::KeyResults => &self.key_results,
            Facet::Keywords => &self.keywords,
            Facet::Limitations => &self.limitations,
        }
    }

    fn set(&mut self, facet: Facet, value: String) {
        let slot = match facet {
            Facet::Authors => &mut self.authors,
            Facet::Summary => &mut self.summary,
            Facet::KeyResults => &mut self.key_results,
            Facet::Keywords => &mut self.keywords,
            Facet::Limitations => &mut self.limitations,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SummaryOutcome {
    pub facets: SummaryFacets,
    pub failed: Vec<Facet>,
}

pub struct SummarizationOrchestrator {
    client: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl SummarizationOrchestrator {
    pub fn new(client: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Never fails as a whole: each facet either succeeds or is recorded as failed.
    pub async fn summarize(&self, full_text: &str) -> SummaryOutcome {
        let start = Instant::now();
        let calls = Facet::ALL.iter().map(|&facet| async move {
            let request = facet.request(full_text);
            let result = complete_with_retry(self.client.as_ref(), &request, &self.policy).await;
            (facet, result)
        });

        let mut outcome = SummaryOutcome::default();
        for (facet, result) in join_all(calls).await {
            match result {
                Ok(text) => outcome.facets.set(facet, text),
                Err(e) => {
                    let err = PaperError::SummaryFacetFailed {
                        facet: facet.name().to_string(),
                        reason: e.to_string(),
                    };
                    warn!("⚠️ {}", err);
                    outcome.failed.push(facet);
                }
            }
        }

        info!(
            "🧠 Summary facets: {}/{} succeeded in {:?}",
            Facet::ALL.len() - outcome.failed.len(),
            Facet::ALL.len(),
            start.elapsed()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::llm::{CompletionRequest, LlmError};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Answers with the facet instruction's first word; fails one facet.
    struct FacetEcho {
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl LlmClient for FacetEcho {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            if let Some(marker) = self.fail_on {
                if request.prompt.contains(marker) {
                    return Err(LlmError::Auth("denied".to_string()));
                }
            }
            let instruction = request.prompt.rsplit("\n\n").next().unwrap_or_default();
            Ok(format!("  {}  ", instruction.split_whitespace().next().unwrap_or_default()))
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn all_facets_stored_verbatim() {
        let orchestrator = SummarizationOrchestrator::new(Arc::new(FacetEcho { fail_on: None }), policy());
        let outcome = orchestrator.summarize("Attention is all you need").await;
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.facets.authors, "  Who  ");
        assert_eq!(outcome.facets.summary, "  Summarize  ");
        assert_eq!(outcome.facets.limitations, "  Give  ");
    }

    #[tokio::test]
    async fn one_failed_facet_leaves_others_intact() {
        let orchestrator = SummarizationOrchestrator::new(
            Arc::new(FacetEcho {
                fail_on: Some("authors of this paper"),
            }),
            policy(),
        );
        let outcome = orchestrator.summarize("Some paper text").await;
        assert_eq!(outcome.failed, vec![Facet::Authors]);
        assert_eq!(outcome.facets.authors, "");
        assert_eq!(outcome.facets.get(Facet::Summary), "  Summarize  ");
        assert_eq!(outcome.facets.get(Facet::Keywords), "  Give  ");
    }
}
