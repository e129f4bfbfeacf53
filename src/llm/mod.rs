//! Text-generation collaborators.
//!
//! The pipeline only knows the [`TextGenerator`] trait: prompt in, text out,
//! no structural guarantee on what comes back.

pub mod client;
pub mod prompts;

use std::future::Future;
use thiserror::Error;

pub use client::HttpGenerator;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gave up after {retries} retries")]
    RetriesExhausted { retries: u32 },

    #[error("Generator returned empty content")]
    EmptyContent,
}

pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Generator that always answers with the same text.
///
/// Used to push known prose (for example ground-truth output) through the
/// real pipeline.
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    response: String,
}

impl StaticGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl TextGenerator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        if self.response.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_generator_echoes_response() {
        let generator = StaticGenerator::new("Total Score: 70");
        assert_eq!(generator.generate("anything").await.unwrap(), "Total Score: 70");
    }

    #[tokio::test]
    async fn test_static_generator_empty_is_error() {
        let generator = StaticGenerator::new("");
        assert!(matches!(generator.generate("x").await, Err(LlmError::EmptyContent)));
    }
}
