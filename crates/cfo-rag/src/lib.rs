//! cfo-rag: retrieval-augmented question answering for a CFO console
//!
//! Answers questions about receivables, payables, purchase-order terms and
//! regulations by combining vector retrieval over ingested documents with
//! invoice tables filtered by the question's intent, then asking an LLM.
//!
//! Every external service (embeddings, vector index, metadata store, reranker,
//! completion) sits behind a trait in [`providers`] and is wired once through
//! [`RagServices`].

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod invoices;
pub mod pipeline;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod services;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{IngestPipeline, IngestReport};
pub use pipeline::QueryPipeline;
pub use processing::DailyRefresh;
pub use services::RagServices;
pub use types::{DocumentChunk, DocumentKind};
