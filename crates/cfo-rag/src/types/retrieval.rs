//! Vector index points and retrieval results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A vector written to the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Point id (same as the chunk id)
    pub id: Uuid,
    /// Embedding
    pub vector: Vec<f32>,
    /// Minimal payload, `{chunk_id}` only
    pub payload: HashMap<String, String>,
}

impl VectorPoint {
    /// Build a point whose payload carries only the chunk id
    pub fn for_chunk(chunk_id: Uuid, vector: Vec<f32>) -> Self {
        let mut payload = HashMap::new();
        payload.insert(
            crate::types::document::CHUNK_ID_KEY.to_string(),
            chunk_id.to_string(),
        );
        Self {
            id: chunk_id,
            vector,
            payload,
        }
    }
}

/// A nearest-neighbour match returned by the index
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    /// Point id
    pub id: Uuid,
    /// Cosine similarity, higher is better
    pub score: f32,
    /// Stored payload
    pub payload: HashMap<String, String>,
}

impl ScoredPoint {
    /// Chunk id from the payload, falling back to the point id
    pub fn chunk_id(&self) -> Uuid {
        self.payload
            .get(crate::types::document::CHUNK_ID_KEY)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or(self.id)
    }
}

/// One retrieval result, consumed within a single query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalHit {
    /// Chunk id
    pub chunk_id: Uuid,
    /// Similarity score
    pub score: f32,
}

impl From<&ScoredPoint> for RetrievalHit {
    fn from(point: &ScoredPoint) -> Self {
        Self {
            chunk_id: point.chunk_id(),
            score: point.score,
        }
    }
}
