//! Error types for the RAG system

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to the user when generation times out
pub const TIMEOUT_MESSAGE: &str =
    "The assistant took too long to respond. Please try again in a moment.";

/// Message returned to the user when the generation backend reports failure
pub const FAILURE_MESSAGE: &str =
    "The assistant could not generate an answer right now. Please try again.";

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (includes invalid chunking parameters)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No parser exists for the given file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Document parser could not extract text
    #[error("Failed to parse file '{filename}': {message}")]
    Parse { filename: String, message: String },

    /// Embedding, search or rerank was unavailable; the query continues without retrieval
    #[error("Retrieval degraded: {0}")]
    RetrievalDegraded(String),

    /// A chunk id returned by the vector index has no content in the metadata store
    #[error("No metadata for chunk {0}")]
    MetadataMiss(Uuid),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Metadata store error
    #[error("Metadata store error: {0}")]
    MetadataStore(String),

    /// Reranker error
    #[error("Rerank failed: {0}")]
    Rerank(String),

    /// Transport-level completion error
    #[error("LLM error: {0}")]
    Completion(String),

    /// Generation exceeded its deadline
    #[error("LLM request timed out after {0} seconds")]
    CompletionTimeout(u64),

    /// Completion backend reported a failed job
    #[error("LLM job failed: {0}")]
    CompletionFailure(String),

    /// Template store error
    #[error("Template error: {0}")]
    Template(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Redis error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// TOML config error
    #[error("Config file error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create a metadata store error
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::MetadataStore(message.into())
    }

    /// Create a rerank error
    pub fn rerank(message: impl Into<String>) -> Self {
        Self::Rerank(message.into())
    }

    /// Create a completion transport error
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion(message.into())
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Leaf-service failures that the query pipeline downgrades to an empty
    /// retrieval context instead of aborting.
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            Self::RetrievalDegraded(_)
                | Self::MetadataMiss(_)
                | Self::Embedding(_)
                | Self::VectorDb(_)
                | Self::MetadataStore(_)
                | Self::Rerank(_)
                | Self::Http(_)
                | Self::Redis(_)
        )
    }

    /// User-facing text for generation errors, `None` for everything else.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::CompletionTimeout(_) => Some(TIMEOUT_MESSAGE.to_string()),
            Self::CompletionFailure(_) => Some(FAILURE_MESSAGE.to_string()),
            Self::Completion(msg) => Some(format!("Error communicating with LLM service: {}", msg)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_failures_are_downgradable() {
        assert!(Error::embedding("down").is_retrieval_failure());
        assert!(Error::vector_db("down").is_retrieval_failure());
        assert!(Error::rerank("down").is_retrieval_failure());
        assert!(!Error::parse("a.pdf", "corrupt").is_retrieval_failure());
        assert!(!Error::CompletionTimeout(60).is_retrieval_failure());
    }

    #[test]
    fn test_user_message_only_for_generation() {
        assert_eq!(
            Error::CompletionTimeout(60).user_message().as_deref(),
            Some(TIMEOUT_MESSAGE)
        );
        assert_eq!(
            Error::CompletionFailure("boom".into()).user_message().as_deref(),
            Some(FAILURE_MESSAGE)
        );
        assert!(Error::config("bad").user_message().is_none());
    }
}
