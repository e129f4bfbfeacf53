//! Error handling for the CV evaluator

use crate::llm::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvEvaluatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation error: {0}")]
    Generation(#[from] LlmError),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Pipeline failed: {0}")]
    Pipeline(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CvEvaluatorError>;

impl From<regex::Error> for CvEvaluatorError {
    fn from(err: regex::Error) -> Self {
        CvEvaluatorError::Extraction(err.to_string())
    }
}
