//! Cohere rerank API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RerankConfig;
use crate::error::{Error, Result};

use super::reranker::Reranker;

/// [`Reranker`] calling Cohere's `/v1/rerank`
pub struct CohereReranker {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    #[allow(dead_code)]
    relevance_score: f32,
}

impl CohereReranker {
    /// Create from config; fails without an API key
    pub fn new(config: &RerankConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("rerank.api_key (COHERE_API_KEY) is not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Reranker for CohereReranker {
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<String>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            model: &self.model,
            query,
            documents: docs,
            top_n: top_n.min(docs.len()),
        };

        let response = self
            .client
            .post(format!("{}/v1/rerank", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::rerank(format!("Rerank request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::rerank(format!("Rerank failed: HTTP {} - {}", status, body)));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::rerank(format!("Failed to parse rerank response: {}", e)))?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(|r| docs.get(r.index).cloned())
            .take(top_n)
            .collect())
    }

    fn name(&self) -> &str {
        "cohere"
    }
}
