//! Process-local provider implementations
//!
//! Used for tests and single-process runs where Qdrant and Redis are not available.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{ScoredPoint, VectorPoint};

use super::metadata_store::MetadataStore;
use super::vector_store::VectorIndex;

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Default)]
struct Collection {
    dimensions: usize,
    points: HashMap<Uuid, VectorPoint>,
}

/// In-memory vector index with brute-force cosine search
#[derive(Default)]
pub struct InMemoryVectorIndex {
    collection: RwLock<Option<Collection>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index with no collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored points
    pub async fn len(&self) -> usize {
        self.collection
            .read()
            .await
            .as_ref()
            .map(|c| c.points.len())
            .unwrap_or(0)
    }

    /// Whether the index holds no points
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn init_collection(&self, dimensions: usize) -> Result<()> {
        let mut guard = self.collection.write().await;
        if guard.is_none() {
            *guard = Some(Collection {
                dimensions,
                points: HashMap::new(),
            });
        }
        Ok(())
    }

    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()> {
        let mut guard = self.collection.write().await;
        let collection = guard
            .as_mut()
            .ok_or_else(|| Error::vector_db("collection has not been created"))?;

        for point in points {
            if point.vector.len() != collection.dimensions {
                return Err(Error::vector_db(format!(
                    "vector has {} dimensions, collection expects {}",
                    point.vector.len(),
                    collection.dimensions
                )));
            }
            collection.points.insert(point.id, point);
        }
        Ok(())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredPoint>> {
        let guard = self.collection.read().await;
        let Some(collection) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredPoint> = collection
            .points
            .values()
            .map(|p| ScoredPoint {
                id: p.id,
                score: cosine_similarity(query_vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_collection(&self) -> Result<()> {
        *self.collection.write().await = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// In-memory metadata store keyed by chunk id
#[derive(Default)]
pub struct InMemoryMetadataStore {
    records: DashMap<Uuid, HashMap<String, String>>,
}

impl InMemoryMetadataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop a single record, simulating an external eviction
    pub fn remove(&self, chunk_id: &Uuid) {
        self.records.remove(chunk_id);
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn store_metadata(&self, chunk_id: &Uuid, metadata: &HashMap<String, String>) -> Result<()> {
        self.records.insert(*chunk_id, metadata.clone());
        Ok(())
    }

    async fn get_metadata(&self, chunk_id: &Uuid) -> Result<HashMap<String, String>> {
        Ok(self
            .records
            .get(chunk_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn clear(&self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
