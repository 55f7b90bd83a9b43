//! Service handles shared by the ingestion and query pipelines

use std::sync::Arc;

use crate::config::{CompletionBackend, RagConfig};
use crate::error::Result;
use crate::generation::OllamaClient;
use crate::providers::{
    cohere::CohereReranker,
    local::{InMemoryMetadataStore, InMemoryVectorIndex},
    ollama::{OllamaCompletion, OllamaEmbedder},
    qdrant::QdrantIndex,
    redis_store::RedisMetadataStore,
    reranker::PassthroughReranker,
    runpod::RunPodCompletion,
    CompletionProvider, EmbeddingProvider, MetadataStore, Reranker, VectorIndex,
};

/// Every external collaborator the pipelines talk to
///
/// Built once at process start and cloned cheaply into each pipeline.
#[derive(Clone)]
pub struct RagServices {
    /// Text to vector
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Chunk vectors
    pub vector_index: Arc<dyn VectorIndex>,
    /// Chunk content and provenance
    pub metadata: Arc<dyn MetadataStore>,
    /// Second-pass relevance
    pub reranker: Arc<dyn Reranker>,
    /// Answer generation
    pub completion: Arc<dyn CompletionProvider>,
}

impl RagServices {
    /// Assemble from explicit providers
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
        metadata: Arc<dyn MetadataStore>,
        reranker: Arc<dyn Reranker>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedder,
            vector_index,
            metadata,
            reranker,
            completion,
        }
    }

    /// Connect the configured backends
    ///
    /// Reranking falls back to retrieval order when no Cohere key is configured.
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG services (completion: {:?})...", config.completion.backend);

        let ollama = Arc::new(OllamaClient::new(&config.llm)?);
        let embedder = Arc::new(OllamaEmbedder::from_client(
            Arc::clone(&ollama),
            config.embeddings.dimensions,
        ));
        tracing::info!("Ollama client initialized (using {} for embeddings)", config.llm.embed_model);

        let vector_index = Arc::new(QdrantIndex::new(&config.vector_db)?);
        tracing::info!(
            "Qdrant index at {} (collection '{}')",
            config.vector_db.url,
            config.vector_db.collection
        );

        let metadata = Arc::new(RedisMetadataStore::connect(&config.metadata).await?);

        let reranker: Arc<dyn Reranker> = if config.rerank.api_key.is_some() {
            Arc::new(CohereReranker::new(&config.rerank)?)
        } else {
            tracing::warn!("COHERE_API_KEY not set, reranking keeps retrieval order");
            Arc::new(PassthroughReranker)
        };

        let completion: Arc<dyn CompletionProvider> = match config.completion.backend {
            CompletionBackend::Ollama => Arc::new(OllamaCompletion::from_client(ollama)),
            CompletionBackend::Runpod => Arc::new(RunPodCompletion::new(&config.completion)?),
        };
        tracing::info!(
            "Completion via {} ({})",
            completion.name(),
            completion.model()
        );

        Ok(Self::new(embedder, vector_index, metadata, reranker, completion))
    }

    /// Process-local index and metadata store with the given model-facing providers
    pub fn in_memory(
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn Reranker>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self::new(
            embedder,
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(InMemoryMetadataStore::new()),
            reranker,
            completion,
        )
    }
}
