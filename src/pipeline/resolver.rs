//! Three-tier resolution of free-form evaluation prose into a record

use super::fallback::FallbackSynthesizer;
use crate::config::Config;
use crate::error::{CvEvaluatorError, Result};
use crate::extraction::{json_span, Extractor};
use crate::llm::prompts::PromptTemplates;
use crate::llm::{HttpGenerator, TextGenerator};
use crate::schema::{validate, EvaluationRecord, PipelineMethod, ScoringSchema, ValidationReport, FIELD_ERROR};
use futures::FutureExt;
use log::{debug, info, warn};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Direct,
    Converted,
    Fallback,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionState::Direct => "direct",
            ResolutionState::Converted => "converted",
            ResolutionState::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: EvaluationRecord,
    pub state: ResolutionState,
    /// Primary collaborator output, when there was any.
    pub prose: Option<String>,
}

pub struct ResolutionPipeline<P, S> {
    primary: P,
    secondary: Option<S>,
    schema: Arc<ScoringSchema>,
    extractor: Extractor,
    synthesizer: FallbackSynthesizer,
    prompts: PromptTemplates,
    primary_timeout: Duration,
    secondary_timeout: Duration,
}

/// Pipeline talking to model servers over HTTP.
pub type HttpPipeline = ResolutionPipeline<HttpGenerator, HttpGenerator>;

impl HttpPipeline {
    /// Wire both collaborators to the endpoints in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let primary = HttpGenerator::new(
            config.generation.primary.clone(),
            config.request_timeout(),
            config.generation.max_retries,
        )?;

        let secondary = if config.pipeline.enable_conversion {
            Some(HttpGenerator::new(
                config.generation.secondary.clone(),
                config.request_timeout(),
                config.generation.max_retries,
            )?)
        } else {
            None
        };

        Ok(Self::new(
            primary,
            secondary,
            Arc::new(config.evaluation.clone()),
            config.pipeline.conversion_prose_limit,
        )?
        .with_timeouts(config.primary_timeout(), config.secondary_timeout()))
    }
}

impl<P: TextGenerator, S: TextGenerator> ResolutionPipeline<P, S> {
    pub fn new(
        primary: P,
        secondary: Option<S>,
        schema: Arc<ScoringSchema>,
        conversion_prose_limit: usize,
    ) -> Result<Self> {
        schema.check()?;
        Ok(Self {
            extractor: Extractor::new(&schema)?,
            synthesizer: FallbackSynthesizer::new(schema.clone()),
            prompts: PromptTemplates::new(&schema, conversion_prose_limit),
            primary,
            secondary,
            schema,
            primary_timeout: Duration::from_secs(180),
            secondary_timeout: Duration::from_secs(60),
        })
    }

    pub fn with_timeouts(mut self, primary: Duration, secondary: Duration) -> Self {
        self.primary_timeout = primary;
        self.secondary_timeout = secondary;
        self
    }

    pub fn schema(&self) -> &ScoringSchema {
        &self.schema
    }

    /// Run the tiers for one document.
    ///
    /// Collaborator failures never surface here; only an empty document is
    /// rejected, before any collaborator is called.
    pub async fn resolve(&self, document: &str) -> Result<Resolution> {
        if document.trim().is_empty() {
            return Err(CvEvaluatorError::InvalidInput("Document is empty".to_string()));
        }

        let start = Instant::now();

        let prose = self.generate_prose(document).await;
        let extracted = match &prose {
            Some(prose) => self.extractor.extract(prose),
            None => EvaluationRecord::new(),
        };

        if self.is_complete(&extracted) {
            info!("Resolved by direct extraction");
            return Ok(Resolution {
                record: extracted
                    .with_processing_time(elapsed_ms(start))
                    .with_method(PipelineMethod::DirectExtraction),
                state: ResolutionState::Direct,
                prose,
            });
        }

        if let Some(prose) = prose.as_deref() {
            if let Some(converted) = self.convert(prose).await {
                info!("Resolved by secondary conversion");
                return Ok(Resolution {
                    record: converted
                        .with_processing_time(elapsed_ms(start))
                        .with_method(PipelineMethod::SecondaryConversion),
                    state: ResolutionState::Converted,
                    prose: Some(prose.to_string()),
                });
            }
        }

        info!(
            "Falling back to partial extraction ({} criteria found)",
            extracted.criteria_present(&self.schema)
        );
        Ok(Resolution {
            record: self
                .synthesizer
                .complete(&extracted)
                .with_processing_time(elapsed_ms(start)),
            state: ResolutionState::Fallback,
            prose,
        })
    }

    /// Like [`resolve`](Self::resolve), but never fails: a rejected document
    /// or a panic inside the tiers becomes an error record carrying the
    /// elapsed time.
    pub async fn evaluate(&self, document: &str) -> EvaluationRecord {
        let start = Instant::now();
        let outcome = AssertUnwindSafe(self.resolve(document)).catch_unwind().await;

        let error = match outcome {
            Ok(Ok(resolution)) => return resolution.record,
            Ok(Err(e)) => e,
            Err(panic) => CvEvaluatorError::Pipeline(panic_message(panic.as_ref())),
        };
        warn!("Evaluation failed: {}", error);
        EvaluationRecord::error_record(error.to_string(), elapsed_ms(start))
    }

    pub async fn evaluate_with_validation(&self, document: &str) -> (EvaluationRecord, ValidationReport) {
        let record = self.evaluate(document).await;
        let report = validate(&record, &self.schema);
        (record, report)
    }

    /// Completeness gate for the direct tier.
    pub fn is_complete(&self, record: &EvaluationRecord) -> bool {
        record.criteria_present(&self.schema) >= self.schema.min_direct_criteria
            && record.raw_total_score().is_some()
    }

    async fn generate_prose(&self, document: &str) -> Option<String> {
        let prompt = self.prompts.render_evaluation(document);
        match timeout(self.primary_timeout, self.primary.generate(&prompt)).await {
            Ok(Ok(prose)) => {
                debug!("Primary collaborator returned {} characters", prose.len());
                Some(prose)
            }
            Ok(Err(e)) => {
                warn!("Primary generation failed: {}", e);
                None
            }
            Err(_) => {
                warn!("Primary generation timed out after {:?}", self.primary_timeout);
                None
            }
        }
    }

    async fn convert(&self, prose: &str) -> Option<EvaluationRecord> {
        let secondary = self.secondary.as_ref()?;
        let prompt = self.prompts.render_conversion(prose);

        let output = match timeout(self.secondary_timeout, secondary.generate(&prompt)).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Secondary conversion failed: {}", e);
                return None;
            }
            Err(_) => {
                warn!("Secondary conversion timed out after {:?}", self.secondary_timeout);
                return None;
            }
        };

        let object = json_span::parse_object(&output)?;
        if object.contains_key(FIELD_ERROR) {
            debug!("Secondary collaborator reported an error object");
            return None;
        }
        Some(EvaluationRecord::from_json_object(object, &self.schema))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("evaluation panicked: {}", detail)
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
