//! Vector retrieval, metadata resolution and reranking

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::services::RagServices;
use crate::types::{DocumentChunk, RetrievalHit};

/// Retrieves the chunk texts most relevant to a question
#[derive(Clone)]
pub struct Retriever {
    services: RagServices,
    /// Candidates handed back by the reranker
    rerank_top_n: usize,
    /// Reranked documents kept for the prompt
    keep_top_n: usize,
}

impl Retriever {
    /// Create a retriever
    pub fn new(services: RagServices, rerank_top_n: usize, keep_top_n: usize) -> Self {
        Self {
            services,
            rerank_top_n,
            keep_top_n,
        }
    }

    /// Create from config
    pub fn from_config(services: RagServices, config: &RagConfig) -> Self {
        Self::new(services, config.rerank.top_n, config.query.keep_top_n)
    }

    /// Embed the question and return the `top_k` nearest chunk ids, best first
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalHit>> {
        let query_vector = self
            .services
            .embedder
            .embed_texts(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("embedder returned no vector for the query"))?;

        let points = self
            .services
            .vector_index
            .search(&query_vector, top_k)
            .await?;

        tracing::debug!("Vector search returned {} hits", points.len());
        Ok(points.iter().map(RetrievalHit::from).collect())
    }

    /// Look up each hit's content, dropping hits the metadata store cannot resolve
    pub async fn resolve(&self, hits: &[RetrievalHit]) -> Result<Vec<String>> {
        let mut docs = Vec::with_capacity(hits.len());

        for hit in hits {
            let record = self.services.metadata.get_metadata(&hit.chunk_id).await?;
            match DocumentChunk::from_metadata(hit.chunk_id, record) {
                Some(chunk) => docs.push(chunk.content),
                None => tracing::warn!("{}, skipping", Error::MetadataMiss(hit.chunk_id)),
            }
        }

        Ok(docs)
    }

    /// Search, resolve and rerank; any service failure is returned to the caller
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let hits = self.search(query, top_k).await?;
        let docs = self.resolve(&hits).await?;

        let mut ranked = self
            .services
            .reranker
            .rerank(query, &docs, self.rerank_top_n)
            .await?;
        ranked.truncate(self.keep_top_n);

        tracing::debug!(
            "Retrieved {} documents, kept {} after {} rerank",
            docs.len(),
            ranked.len(),
            self.services.reranker.name()
        );
        Ok(ranked)
    }

    /// Like [`Retriever::retrieve`], but unreachable leaf services yield an empty context
    pub async fn retrieve_or_empty(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        match self.retrieve(query, top_k).await {
            Ok(docs) => Ok(docs),
            Err(e) if e.is_retrieval_failure() => {
                tracing::warn!("{}", Error::RetrievalDegraded(e.to_string()));
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
