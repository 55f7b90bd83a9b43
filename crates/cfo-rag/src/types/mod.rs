//! Core types for the RAG system

pub mod document;
pub mod retrieval;

pub use document::{DocumentChunk, DocumentKind, CHUNK_ID_KEY};
pub use retrieval::{RetrievalHit, ScoredPoint, VectorPoint};
