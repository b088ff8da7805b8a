// LLM-backed paper summarization
pub mod facets;
pub mod llm;
pub mod orchestrator;

pub use facets::Facet;
pub use llm::{CompletionRequest, LlmClient, LlmError, OpenAiCompletionClient, RetryPolicy};
pub use orchestrator::{SummarizationOrchestrator, SummaryFacets, SummaryOutcome};
