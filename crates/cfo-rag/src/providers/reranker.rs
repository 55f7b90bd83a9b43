//! Reranker trait for re-scoring retrieved documents

use async_trait::async_trait;
use crate::error::Result;

/// Second-pass relevance scoring over a small candidate set
///
/// Implementations:
/// - `CohereReranker`: Cohere rerank API
/// - `PassthroughReranker`: keeps retrieval order
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Best `top_n` documents, most relevant first
    ///
    /// Implementations return an empty list for empty input without any remote call.
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<String>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// A reranker that keeps the retrieval order and truncates to `top_n`
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughReranker;

#[async_trait]
impl Reranker for PassthroughReranker {
    async fn rerank(&self, _query: &str, docs: &[String], top_n: usize) -> Result<Vec<String>> {
        Ok(docs.iter().take(top_n).cloned().collect())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}
