//! Provider abstractions for embeddings, vector search, metadata, reranking and completion
//!
//! Every external service sits behind a trait so the pipelines can be wired
//! with remote backends in production and in-memory doubles in tests.

pub mod cohere;
pub mod embedding;
pub mod llm;
pub mod local;
pub mod metadata_store;
pub mod ollama;
pub mod qdrant;
pub mod redis_store;
pub mod reranker;
pub mod runpod;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{CompletionProvider, CompletionRequest};
pub use metadata_store::MetadataStore;
pub use reranker::Reranker;
pub use vector_store::VectorIndex;
