//! Ollama HTTP client shared by the embedding and completion providers

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// First retry delay; doubles on every further attempt
const BASE_BACKOFF_MS: u64 = 500;

/// Ollama client; transport and HTTP failures are retried with exponential backoff
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateReply {
    response: String,
}

#[derive(Serialize)]
struct EmbedBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedReply {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// Build the HTTP client with the configured request timeout
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn embed_model(&self) -> &str {
        &self.config.embed_model
    }

    pub fn generate_model(&self) -> &str {
        &self.config.generate_model
    }

    /// POST `body` to `endpoint` and decode the reply, retrying up to `max_retries` times
    ///
    /// `fail` turns a message into the error kind of the calling operation.
    async fn post<B, R>(&self, endpoint: &str, body: &B, fail: fn(String) -> Error) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let attempts = self.config.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = async {
                let response = self
                    .client
                    .post(&url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| fail(format!("{} unreachable: {}", endpoint, e)))?;

                let status = response.status();
                if !status.is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(fail(format!("{} returned HTTP {}: {}", endpoint, status, detail)));
                }

                response
                    .json::<R>()
                    .await
                    .map_err(|e| fail(format!("{} reply could not be decoded: {}", endpoint, e)))
            }
            .await;

            match outcome {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    let delay = Duration::from_millis(BASE_BACKOFF_MS << (attempt - 1));
                    tracing::warn!(
                        "Ollama call failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Embed several texts in one request; vectors come back in input order
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedBody {
            model: &self.config.embed_model,
            input: texts,
        };
        let reply: EmbedReply = self.post("/api/embed", &body, Error::Embedding).await?;

        if reply.embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} vectors for {} texts",
                self.config.embed_model,
                reply.embeddings.len(),
                texts.len()
            )));
        }
        Ok(reply.embeddings)
    }

    /// Embed one text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::embedding("empty embedding reply"))
    }

    /// Complete an already rendered prompt without streaming
    pub async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        tracing::info!("Generating answer with {}", self.config.generate_model);

        let body = GenerateBody {
            model: &self.config.generate_model,
            prompt,
            stream: false,
            options: SamplingOptions {
                temperature,
                num_predict: max_tokens,
            },
        };
        let reply: GenerateReply = self.post("/api/generate", &body, Error::Completion).await?;
        Ok(reply.response)
    }
}
