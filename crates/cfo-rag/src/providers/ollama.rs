//! Embedding and completion backed by a local Ollama server

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::OllamaClient;

use super::embedding::EmbeddingProvider;
use super::llm::{CompletionProvider, CompletionRequest};

/// Embeds through Ollama's batch endpoint and checks every vector's width
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }

    fn check_width(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "{} returned {} dimensions, expected {}",
                self.client.embed_model(),
                vector.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.client.embed(text).await?;
        self.check_width(&vector)?;
        Ok(vector)
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.client.embed_batch(texts).await?;
        for vector in &vectors {
            self.check_width(vector)?;
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Non-streaming generation through `/api/generate`
pub struct OllamaCompletion {
    client: Arc<OllamaClient>,
}

impl OllamaCompletion {
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionProvider for OllamaCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.client
            .generate(&request.prompt, request.max_output_tokens, request.temperature)
            .await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        self.client.generate_model()
    }
}
