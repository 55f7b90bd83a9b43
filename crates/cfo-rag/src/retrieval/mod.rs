//! Retrieval: embedding search, metadata lookup and reranking

mod search;

pub use search::Retriever;
