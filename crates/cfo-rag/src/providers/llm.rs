//! Completion provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// A single stateless generation request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Fully rendered prompt
    pub prompt: String,
    /// Output token budget
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Trait for text-in/text-out generation
///
/// Implementations:
/// - `OllamaCompletion`: Ollama `/api/generate`
/// - `RunPodCompletion`: RunPod serverless submit/poll
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate raw text for the prompt
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
