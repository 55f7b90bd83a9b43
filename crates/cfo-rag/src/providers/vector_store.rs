//! Vector index trait for storing and searching chunk embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{ScoredPoint, VectorPoint};

/// Nearest-neighbour index over chunk vectors
///
/// Points carry only the chunk id; content lives in the metadata store.
///
/// Implementations:
/// - `QdrantIndex`: Qdrant REST API
/// - `InMemoryVectorIndex`: process-local cosine search
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection with the given dimensionality if it does not exist
    ///
    /// Never drops existing data.
    async fn init_collection(&self, dimensions: usize) -> Result<()>;

    /// Insert or replace points, batched internally
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()>;

    /// Up to `top_k` nearest points by cosine similarity, best first
    ///
    /// An empty or missing collection yields an empty list.
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredPoint>>;

    /// Drop the collection and everything in it
    async fn delete_collection(&self) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
