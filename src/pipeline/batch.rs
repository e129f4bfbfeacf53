//! Concurrent evaluation of many documents through one shared pipeline

use super::resolver::{elapsed_ms, ResolutionPipeline};
use crate::error::{CvEvaluatorError, Result};
use crate::llm::TextGenerator;
use crate::schema::{validate, EvaluationRecord, ValidationReport};
use indicatif::ProgressBar;
use log::{debug, error};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One input to a batch. `content` carries the load failure when the
/// document could not be read.
#[derive(Debug)]
pub struct SourceDocument {
    pub source: String,
    pub content: Result<String>,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: Ok(text.into()),
        }
    }
}

/// The record as a caller would receive it: flat record fields, the source
/// it came from and, optionally, a nested `validation` object.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedDocument {
    pub source: String,
    #[serde(flatten)]
    pub record: EvaluationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

impl EvaluatedDocument {
    pub fn is_success(&self) -> bool {
        !self.record.is_error()
    }

    pub fn passed_validation(&self) -> bool {
        self.validation.as_ref().map_or(false, |v| v.valid)
    }
}

pub struct BatchRunner<P, S> {
    pipeline: Arc<ResolutionPipeline<P, S>>,
    concurrency: usize,
    validate: bool,
    progress: Option<ProgressBar>,
}

impl<P, S> BatchRunner<P, S>
where
    P: TextGenerator + 'static,
    S: TextGenerator + 'static,
{
    pub fn new(pipeline: Arc<ResolutionPipeline<P, S>>, concurrency: usize) -> Self {
        Self {
            pipeline,
            concurrency: concurrency.max(1),
            validate: false,
            progress: None,
        }
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Evaluate every document. The output has exactly one entry per input,
    /// in input order, whatever happened to the individual documents.
    pub async fn run(&self, documents: Vec<SourceDocument>) -> Vec<EvaluatedDocument> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        let sources: Vec<String> = documents.iter().map(|d| d.source.clone()).collect();
        let mut started = Vec::with_capacity(sources.len());

        for (index, document) in documents.into_iter().enumerate() {
            started.push(Instant::now());
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&semaphore);
            let validate_output = self.validate;

            join_set.spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = semaphore.acquire_owned().await.ok();
                let start = Instant::now();

                let record = match document.content {
                    Ok(text) => pipeline.evaluate(&text).await,
                    Err(e) => EvaluationRecord::error_record(
                        format!("Failed to load document: {}", e),
                        elapsed_ms(start),
                    ),
                };

                let validation = validate_output.then(|| validate(&record, pipeline.schema()));
                debug!("Finished {} ({})", document.source, index);

                (
                    index,
                    EvaluatedDocument {
                        source: document.source,
                        record,
                        validation,
                    },
                )
            });
        }

        let mut slots: Vec<Option<EvaluatedDocument>> = vec![None; sources.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, evaluated)) => slots[index] = Some(evaluated),
                Err(e) => error!("Evaluation task failed: {}", e),
            }
            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
        }

        // A task that panicked outside the pipeline left its slot empty.
        slots
            .into_iter()
            .zip(sources)
            .zip(started)
            .map(|((slot, source), started)| {
                slot.unwrap_or_else(|| {
                    let record = EvaluationRecord::error_record(
                        CvEvaluatorError::Pipeline("evaluation task panicked".to_string()).to_string(),
                        elapsed_ms(started),
                    );
                    let validation = self.validate.then(|| validate(&record, self.pipeline.schema()));
                    EvaluatedDocument {
                        source,
                        record,
                        validation,
                    }
                })
            })
            .collect()
    }
}
