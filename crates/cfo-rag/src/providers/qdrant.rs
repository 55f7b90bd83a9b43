//! Qdrant vector index over the REST API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{ScoredPoint, VectorPoint};

use super::vector_store::VectorIndex;

/// [`VectorIndex`] backed by a Qdrant collection with cosine distance
pub struct QdrantIndex {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    batch_size: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: Option<HashMap<String, serde_json::Value>>,
}

impl QdrantIndex {
    /// Create from config
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
            batch_size: config.upsert_batch_size.max(1),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn collection_exists(&self) -> Result<bool> {
        let response = self
            .with_auth(self.client.get(self.collection_url()))
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Collection lookup failed: {}", e)))?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Error::vector_db(format!("Collection lookup failed: HTTP {}", s))),
        }
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::vector_db(format!("{} failed: HTTP {} - {}", action, status, body)))
    }

    fn to_scored_point(hit: SearchHit) -> Option<ScoredPoint> {
        let id = hit.id.as_str().and_then(|s| Uuid::parse_str(s).ok())?;
        let payload = hit
            .payload
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Null => None,
                other => Some((k, other.to_string())),
            })
            .collect();

        Some(ScoredPoint {
            id,
            score: hit.score,
            payload,
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn init_collection(&self, dimensions: usize) -> Result<()> {
        if self.collection_exists().await? {
            tracing::debug!("Qdrant collection '{}' already exists", self.collection);
            return Ok(());
        }

        let body = json!({
            "vectors": { "size": dimensions, "distance": "Cosine" }
        });
        let response = self
            .with_auth(self.client.put(self.collection_url()).json(&body))
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Create collection failed: {}", e)))?;
        Self::check(response, "Create collection").await?;

        tracing::info!(
            "Created Qdrant collection '{}' ({} dimensions, cosine)",
            self.collection,
            dimensions
        );
        Ok(())
    }

    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()> {
        let url = format!("{}/points?wait=true", self.collection_url());

        for batch in points.chunks(self.batch_size) {
            let body = json!({
                "points": batch
                    .iter()
                    .map(|p| json!({
                        "id": p.id.to_string(),
                        "vector": p.vector,
                        "payload": p.payload,
                    }))
                    .collect::<Vec<_>>()
            });

            let response = self
                .with_auth(self.client.put(&url).json(&body))
                .send()
                .await
                .map_err(|e| Error::vector_db(format!("Upsert failed: {}", e)))?;
            Self::check(response, "Upsert").await?;

            tracing::debug!("Upserted {} points into '{}'", batch.len(), self.collection);
        }

        Ok(())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredPoint>> {
        let url = format!("{}/points/search", self.collection_url());
        let body = json!({
            "vector": query_vector,
            "limit": top_k,
            "with_payload": true,
        });

        let response = self
            .with_auth(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Search failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Qdrant collection '{}' does not exist yet", self.collection);
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = Self::check(response, "Search")
            .await?
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse search response: {}", e)))?;

        Ok(parsed
            .result
            .into_iter()
            .filter_map(Self::to_scored_point)
            .collect())
    }

    async fn delete_collection(&self) -> Result<()> {
        let response = self
            .with_auth(self.client.delete(self.collection_url()))
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Delete collection failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response, "Delete collection").await?;
        tracing::info!("Deleted Qdrant collection '{}'", self.collection);
        Ok(())
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
