//! Configuration management for the CV evaluator

use crate::error::{CvEvaluatorError, Result};
use crate::schema::ScoringSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on `generation.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub evaluation: ScoringSchema,
    pub pipeline: PipelineConfig,
    pub generation: GenerationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub primary_timeout_secs: u64,
    pub secondary_timeout_secs: u64,
    pub enable_conversion: bool,
    pub conversion_prose_limit: usize,
    pub batch_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub primary: EndpointConfig,
    pub secondary: EndpointConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
    pub include_validation: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            evaluation: ScoringSchema::default(),
            pipeline: PipelineConfig {
                primary_timeout_secs: 180,
                secondary_timeout_secs: 60,
                enable_conversion: true,
                conversion_prose_limit: 500,
                batch_concurrency: 4,
            },
            generation: GenerationConfig {
                request_timeout_secs: 120,
                max_retries: 3,
                primary: EndpointConfig {
                    base_url: "http://localhost:11434".to_string(),
                    model: "cv-prose-evaluator".to_string(),
                    temperature: 0.7,
                    max_tokens: 512,
                },
                secondary: EndpointConfig {
                    base_url: "http://localhost:11434".to_string(),
                    model: "cv-json-converter".to_string(),
                    temperature: 0.3,
                    max_tokens: 300,
                },
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                pretty: true,
                include_validation: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first use.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| CvEvaluatorError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.check()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CvEvaluatorError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("cv-evaluator")
            .join("config.toml")
    }

    pub fn check(&self) -> Result<()> {
        self.evaluation.check()?;
        if self.pipeline.batch_concurrency == 0 {
            return Err(CvEvaluatorError::Configuration(
                "pipeline.batch_concurrency must be at least 1".to_string(),
            ));
        }
        if self.generation.max_retries > MAX_RETRIES_LIMIT {
            return Err(CvEvaluatorError::Configuration(format!(
                "generation.max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }
        Ok(())
    }

    pub fn primary_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.primary_timeout_secs)
    }

    pub fn secondary_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.secondary_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.evaluation.criteria.len(), 10);
        assert_eq!(config.output.format, OutputFormat::Console);
    }

    #[test]
    fn test_round_trip_preserves_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.evaluation.total_tolerance = 3;
        config.pipeline.batch_concurrency = 8;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.evaluation, config.evaluation);
        assert_eq!(loaded.pipeline.batch_concurrency, 8);
        assert_eq!(loaded.evaluation.fallback_ladder.no_hire, None);
        assert_eq!(loaded.evaluation.canonical_ladder.no_hire, Some(40));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.pipeline.batch_concurrency = 0;
        config.save_to(&path).unwrap();

        assert!(matches!(Config::load_from(&path), Err(CvEvaluatorError::Configuration(_))));
    }

    #[test]
    fn test_excessive_retries_are_rejected() {
        let mut config = Config::default();
        config.generation.max_retries = MAX_RETRIES_LIMIT;
        assert!(config.check().is_ok());

        config.generation.max_retries = 64;
        assert!(matches!(config.check(), Err(CvEvaluatorError::Configuration(_))));
    }

    #[test]
    fn test_garbage_file_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(Config::load_from(&path), Err(CvEvaluatorError::Configuration(_))));
    }
}
