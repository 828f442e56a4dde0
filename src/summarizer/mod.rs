pub mod ollama;
pub mod orchestrator;

use async_trait::async_trait;

use crate::error::Result;

pub use ollama::OllamaClient;
pub use orchestrator::{ComposedSummary, SummaryOrchestrator, SummaryOutcome};

/// Boundary to an external text-generation service.
///
/// Adapters convert transport failures into `PolicyLensError::SummarizationUnavailable`
/// before they reach the orchestrator.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Bounded-time liveness probe
    async fn is_available(&self) -> bool;

    /// Request a summary of already-sanitized text. Returns the raw reply body.
    async fn summarize(&self, text: &str, hint: &str) -> Result<String>;

    /// Where the service lives, for advisory messages
    fn endpoint(&self) -> &str;
}
