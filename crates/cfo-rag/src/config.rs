//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Ollama configuration (embeddings and direct generation)
    pub llm: LlmConfig,
    /// Completion backend configuration
    pub completion: CompletionConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Metadata store configuration
    pub metadata: MetadataConfig,
    /// Reranker configuration
    pub rerank: RerankConfig,
    /// Query pipeline tuning
    pub query: QueryConfig,
    /// Local data sources
    pub data: DataConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Overlay service endpoints and secrets from the environment
    pub fn apply_env(mut self) -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        if let Some(url) = var("QDRANT_URL") {
            self.vector_db.url = url;
        }
        if let Some(key) = var("QDRANT_API_KEY") {
            self.vector_db.api_key = Some(key);
        }
        if let Some(collection) = var("QDRANT_COLLECTION") {
            self.vector_db.collection = collection;
        }
        if let Some(url) = var("REDIS_URL") {
            self.metadata.redis_url = url;
        }
        if let Some(key) = var("COHERE_API_KEY") {
            self.rerank.api_key = Some(key);
        }
        if let Some(key) = var("RUNPOD_API_KEY") {
            self.completion.runpod_api_key = Some(key);
        }
        if let Some(endpoint) = var("RUNPOD_ENDPOINT_ID") {
            self.completion.runpod_endpoint_id = endpoint;
        }
        if let Some(url) = var("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        self
    }

    /// Reject settings that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.query.top_k == 0 {
            return Err(Error::config("query.top_k must be greater than zero"));
        }
        if self.vector_db.upsert_batch_size == 0 {
            return Err(Error::config("vector_db.upsert_batch_size must be greater than zero"));
        }
        if self.completion.max_poll_attempts == 0 {
            return Err(Error::config("completion.max_poll_attempts must be greater than zero"));
        }
        Ok(())
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimensions (384 for MiniLM, 768 for nomic-embed-text)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

/// Word-window chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in words
    pub chunk_size: usize,
    /// Words shared between consecutive windows
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "phi3".to_string(),
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Completion backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionBackend {
    /// Direct request/response against Ollama
    #[default]
    Ollama,
    /// Submit-and-poll against a RunPod serverless vLLM endpoint
    Runpod,
}

/// Completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Which backend generates answers
    pub backend: CompletionBackend,
    /// Maximum tokens the model may generate
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Hard wall-clock limit for one completion, in seconds
    pub timeout_secs: u64,
    /// Seconds between status polls
    pub poll_interval_secs: u64,
    /// Maximum number of status polls before giving up
    pub max_poll_attempts: u32,
    /// RunPod API base URL
    pub runpod_base_url: String,
    /// RunPod serverless endpoint id
    pub runpod_endpoint_id: String,
    /// RunPod API key
    pub runpod_api_key: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: CompletionBackend::Ollama,
            max_output_tokens: 1024,
            temperature: 0.0,
            timeout_secs: 300,
            poll_interval_secs: 3,
            max_poll_attempts: 100,
            runpod_base_url: "https://api.runpod.ai".to_string(),
            runpod_endpoint_id: String::new(),
            runpod_api_key: None,
        }
    }
}

/// Vector database (Qdrant) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Qdrant REST URL
    pub url: String,
    /// Optional API key
    pub api_key: Option<String>,
    /// Collection holding chunk vectors
    pub collection: String,
    /// Points per upsert request
    pub upsert_batch_size: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "financial_docs".to_string(),
            upsert_batch_size: 100,
        }
    }
}

/// Metadata store (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Redis connection URL
    pub redis_url: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
        }
    }
}

/// Reranker (Cohere) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Cohere API base URL
    pub base_url: String,
    /// Cohere API key; reranking falls back to retrieval order when unset
    pub api_key: Option<String>,
    /// Rerank model
    pub model: String,
    /// Documents returned by the reranker
    pub top_n: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.ai".to_string(),
            api_key: None,
            model: "rerank-english-v3.0".to_string(),
            top_n: 3,
            timeout_secs: 30,
        }
    }
}

/// Query pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Nearest neighbours fetched from the vector index
    pub top_k: usize,
    /// Reranked hits kept in the prompt context
    pub keep_top_n: usize,
    /// Character budget for each context section
    pub max_section_len: usize,
    /// Appended to a section that was cut
    pub ellipsis: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: 20,
            keep_top_n: 2,
            max_section_len: 5000,
            ellipsis: "...".to_string(),
        }
    }
}

/// Local data sources read on every query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Accounts receivable invoices
    pub ar_invoices: PathBuf,
    /// Accounts payable invoices
    pub ap_invoices: PathBuf,
    /// Purchase order terms and conditions
    pub po_terms: PathBuf,
    /// Regulations document
    pub regulations: PathBuf,
    /// Prompt templates (JSON object of name -> template)
    pub templates: PathBuf,
    /// Marker file recording the last daily refresh
    pub refresh_marker: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ar_invoices: PathBuf::from("data/AR_Invoice.csv"),
            ap_invoices: PathBuf::from("data/AP_Invoice.csv"),
            po_terms: PathBuf::from("data/PO_T&C.pdf"),
            regulations: PathBuf::from("data/RPSR_RPSCSR_UAE.pdf"),
            templates: PathBuf::from("prompts/insights.json"),
            refresh_marker: PathBuf::from("data/last_update_date.txt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.query.max_section_len, 5000);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = 500;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[vector_db]\ncollection = \"ledger\"\n\n[completion]\nbackend = \"runpod\"\ntimeout_secs = 60"
        )
        .unwrap();

        let config = RagConfig::load(file.path()).unwrap();
        assert_eq!(config.vector_db.collection, "ledger");
        assert_eq!(config.vector_db.upsert_batch_size, 100);
        assert_eq!(config.completion.backend, CompletionBackend::Runpod);
        assert_eq!(config.completion.timeout_secs, 60);
        assert_eq!(config.completion.max_output_tokens, 1024);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = RagConfig::load(Path::new("/nonexistent/cfo-rag.toml")).unwrap();
        assert_eq!(config.query.top_k, 20);
    }
}
