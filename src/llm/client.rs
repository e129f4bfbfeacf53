//! HTTP collaborator for an Ollama-style `/api/generate` endpoint

use super::{LlmError, TextGenerator};
use crate::config::EndpointConfig;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Non-streaming text generator backed by a model server.
#[derive(Clone)]
pub struct HttpGenerator {
    client: Client,
    endpoint: EndpointConfig,
    max_retries: u32,
}

impl HttpGenerator {
    pub fn new(endpoint: EndpointConfig, request_timeout: Duration, max_retries: u32) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            max_retries: max_retries.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.endpoint.model
    }

    fn url(&self) -> String {
        format!("{}/api/generate", self.endpoint.base_url.trim_end_matches('/'))
    }

    async fn call_once(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &self.endpoint.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.endpoint.temperature,
                num_predict: self.endpoint.max_tokens,
            },
        };

        let response = self.client.post(self.url()).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        if body.response.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(body.response)
    }
}

const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

/// 500ms, 1s, 2s, ... capped at 30s.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

fn is_retryable(error: &LlmError) -> bool {
    match error {
        LlmError::Http(e) => e.is_timeout() || e.is_connect(),
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

impl TextGenerator for HttpGenerator {
    /// Retries on 429, 5xx and connection failures with exponential backoff.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "Generation attempt {} against {} failed, retrying after {}ms",
                    attempt,
                    self.endpoint.model,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.call_once(prompt).await {
                Ok(text) => {
                    debug!("{} returned {} characters", self.endpoint.model, text.len());
                    return Ok(text);
                }
                Err(e) if is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::RetriesExhausted {
            retries: self.max_retries,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base_url: &str) -> EndpointConfig {
        EndpointConfig {
            base_url: base_url.to_string(),
            model: "evaluator".to_string(),
            temperature: 0.7,
            max_tokens: 512,
        }
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let generator = HttpGenerator::new(endpoint("http://localhost:11434/"), Duration::from_secs(5), 3).unwrap();
        assert_eq!(generator.url(), "http://localhost:11434/api/generate");
        assert_eq!(generator.model(), "evaluator");
    }

    #[test]
    fn test_retry_classification() {
        assert!(is_retryable(&LlmError::Api { status: 429, message: String::new() }));
        assert!(is_retryable(&LlmError::Api { status: 503, message: String::new() }));
        assert!(!is_retryable(&LlmError::Api { status: 400, message: String::new() }));
        assert!(!is_retryable(&LlmError::EmptyContent));
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(4), Duration::from_millis(4000));
        assert_eq!(backoff_delay(40), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            options: GenerateOptions { temperature: 0.3, num_predict: 300 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 300);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_after_retries() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let generator = HttpGenerator::new(endpoint("http://127.0.0.1:9"), Duration::from_millis(200), 1).unwrap();
        assert!(generator.generate("hello").await.is_err());
    }
}
