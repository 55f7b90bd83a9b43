//! RunPod serverless vLLM completion backend
//!
//! Generation is asynchronous on RunPod: a job is submitted to `/run` and its
//! status polled at `/status/{id}` until it completes, fails, or the poll
//! budget runs out.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::CompletionConfig;
use crate::error::{Error, Result};

use super::llm::{CompletionProvider, CompletionRequest};

const REPETITION_PENALTY: f32 = 1.2;

/// Lifecycle of one submitted generation job
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Accepted by `/run`, not yet polled
    Submitted(String),
    /// Queued or running on a worker
    Pending,
    /// Finished with raw output text
    Completed(String),
    /// Backend reported failure
    Failed(String),
    /// Poll budget exhausted
    TimedOut,
}

impl JobState {
    /// Whether no further polling is needed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_) | Self::TimedOut)
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Join the token list vLLM workers return as `[{"choices": [{"tokens": [...]}]}]`
///
/// Plain string outputs pass through; anything else is rendered as JSON text.
fn extract_output(output: &Value) -> Option<String> {
    let tokens = output
        .get(0)
        .and_then(|item| item.get("choices"))
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("tokens"))
        .and_then(Value::as_array);

    let text = match (tokens, output) {
        (Some(tokens), _) => tokens
            .iter()
            .map(|t| match t {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<String>(),
        (None, Value::String(s)) => s.clone(),
        (None, Value::Null) => return None,
        (None, other) => other.to_string(),
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// [`CompletionProvider`] backed by a RunPod serverless endpoint
pub struct RunPodCompletion {
    client: Client,
    endpoint_url: String,
    api_key: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl RunPodCompletion {
    /// Create from config; requires an endpoint id and API key
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        if config.runpod_endpoint_id.is_empty() {
            return Err(Error::config(
                "completion.runpod_endpoint_id (RUNPOD_ENDPOINT_ID) is not set",
            ));
        }
        let api_key = config
            .runpod_api_key
            .clone()
            .ok_or_else(|| Error::config("completion.runpod_api_key (RUNPOD_API_KEY) is not set"))?;

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint_url: format!(
                "{}/v2/{}",
                config.runpod_base_url.trim_end_matches('/'),
                config.runpod_endpoint_id
            ),
            api_key,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_poll_attempts: config.max_poll_attempts.max(1),
        })
    }

    /// Override the delay between status polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn submit(&self, request: &CompletionRequest) -> Result<JobState> {
        let body = json!({
            "input": {
                "prompt": request.prompt,
                "application": "RAG",
                "sampling_params": {
                    "temperature": request.temperature,
                    "max_tokens": request.max_output_tokens,
                    "repetition_penalty": REPETITION_PENALTY,
                }
            }
        });

        let response = self
            .client
            .post(format!("{}/run", self.endpoint_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::completion(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::completion(format!(
                "job submission failed: HTTP {}",
                response.status()
            )));
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| Error::completion(format!("invalid submission response: {}", e)))?;

        match submitted.id {
            Some(id) if !id.is_empty() => Ok(JobState::Submitted(id)),
            _ => Ok(JobState::Failed("backend returned no job id".to_string())),
        }
    }

    /// One status check; a request timeout counts as still pending
    async fn poll(&self, job_id: &str) -> Result<JobState> {
        let response = match self
            .client
            .get(format!("{}/status/{}", self.endpoint_url, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::debug!("Status check for job {} timed out", job_id);
                return Ok(JobState::Pending);
            }
            Err(e) => return Err(Error::completion(format!("status check failed: {}", e))),
        };

        if !response.status().is_success() {
            return Err(Error::completion(format!(
                "status check failed: HTTP {}",
                response.status()
            )));
        }

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| Error::completion(format!("invalid status response: {}", e)))?;

        Ok(match status.status.as_str() {
            "COMPLETED" => match status.output.as_ref().and_then(extract_output) {
                Some(text) => JobState::Completed(text),
                None => JobState::Failed("no output from LLM".to_string()),
            },
            "FAILED" | "CANCELLED" | "TIMED_OUT" => JobState::Failed(
                status
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| status.status.clone()),
            ),
            _ => JobState::Pending,
        })
    }
}

#[async_trait]
impl CompletionProvider for RunPodCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let job_id = match self.submit(request).await? {
            JobState::Submitted(id) => id,
            JobState::Failed(reason) => return Err(Error::CompletionFailure(reason)),
            other => return Err(Error::internal(format!("unexpected job state {:?}", other))),
        };
        tracing::info!("Submitted RunPod job {}", job_id);

        let mut state = JobState::Pending;
        for attempt in 1..=self.max_poll_attempts {
            state = self.poll(&job_id).await?;
            if state.is_terminal() {
                break;
            }
            if attempt == self.max_poll_attempts {
                state = JobState::TimedOut;
                break;
            }
            sleep(self.poll_interval).await;
        }

        match state {
            JobState::Completed(text) => {
                tracing::info!("RunPod job {} completed", job_id);
                Ok(text)
            }
            JobState::Failed(reason) => {
                tracing::warn!("RunPod job {} failed: {}", job_id, reason);
                Err(Error::CompletionFailure(reason))
            }
            _ => {
                let waited = self.poll_interval.as_secs() * u64::from(self.max_poll_attempts);
                tracing::warn!("RunPod job {} still pending after {} polls", job_id, self.max_poll_attempts);
                Err(Error::CompletionTimeout(waited))
            }
        }
    }

    fn name(&self) -> &str {
        "runpod"
    }

    fn model(&self) -> &str {
        "vllm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, attempts: u32) -> RunPodCompletion {
        RunPodCompletion::new(&CompletionConfig {
            runpod_base_url: server.uri(),
            runpod_endpoint_id: "ep-123".to_string(),
            runpod_api_key: Some("rp-key".to_string()),
            max_poll_attempts: attempts,
            ..CompletionConfig::default()
        })
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "Which invoices are overdue?".to_string(),
            max_output_tokens: 1024,
            temperature: 0.0,
        }
    }

    async fn mount_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v2/ep-123/run"))
            .and(header("authorization", "Bearer rp-key"))
            .and(body_partial_json(json!({
                "input": {
                    "application": "RAG",
                    "sampling_params": {"max_tokens": 1024}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-1", "status": "IN_QUEUE"})))
            .mount(server)
            .await;
    }

    #[test]
    fn test_extract_output_shapes() {
        let tokens = json!([{"choices": [{"tokens": ["Two ", "invoices", " are overdue."]}]}]);
        assert_eq!(extract_output(&tokens).as_deref(), Some("Two invoices are overdue."));
        assert_eq!(extract_output(&json!("  plain  ")).as_deref(), Some("plain"));
        assert_eq!(extract_output(&Value::Null), None);
        assert_eq!(extract_output(&json!([{"choices": [{"tokens": []}]}])), None);
    }

    #[tokio::test]
    async fn test_complete_after_polling() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/ep-123/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "IN_PROGRESS"})))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/ep-123/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "COMPLETED",
                "output": [{"choices": [{"tokens": ["Pay ", "Acme first."]}]}]
            })))
            .mount(&server)
            .await;

        let answer = provider_for(&server, 10).complete(&request()).await.unwrap();
        assert_eq!(answer, "Pay Acme first.");
    }

    #[tokio::test]
    async fn test_failed_job() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/ep-123/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "FAILED", "error": "OOM"})))
            .mount(&server)
            .await;

        let result = provider_for(&server, 10).complete(&request()).await;
        assert!(matches!(result, Err(Error::CompletionFailure(_))));
    }

    #[tokio::test]
    async fn test_poll_budget_exhausted() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/ep-123/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "IN_QUEUE"})))
            .expect(3)
            .mount(&server)
            .await;

        let result = provider_for(&server, 3).complete(&request()).await;
        assert!(matches!(result, Err(Error::CompletionTimeout(_))));
    }

    #[tokio::test]
    async fn test_missing_job_id_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ep-123/run"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let result = provider_for(&server, 3).complete(&request()).await;
        assert!(matches!(result, Err(Error::CompletionFailure(_))));
    }

    #[test]
    fn test_requires_endpoint_and_key() {
        assert!(matches!(
            RunPodCompletion::new(&CompletionConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
