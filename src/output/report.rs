//! Report structures for single and batch evaluations

use crate::pipeline::EvaluatedDocument;
use crate::schema::ScoringSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything one `evaluate` run produced.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub metadata: ReportMetadata,
    pub summary: BatchSummary,
    pub documents: Vec<EvaluatedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub primary_model: String,
    pub secondary_model: Option<String>,
    pub criteria_count: usize,
}

/// Aggregate statistics over a batch.
///
/// Coverage and timing are averaged over successful documents only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_documents: usize,
    pub successful: usize,
    pub success_rate: f64,
    /// `None` when validation was not requested.
    pub validation_passed: Option<usize>,
    pub average_criteria_coverage: f64,
    pub average_processing_time_ms: f64,
    pub primary_method: Option<String>,
    pub method_distribution: BTreeMap<String, usize>,
}

impl EvaluationReport {
    pub fn new(metadata: ReportMetadata, documents: Vec<EvaluatedDocument>, schema: &ScoringSchema) -> Self {
        Self {
            summary: BatchSummary::from_documents(&documents, schema),
            metadata,
            documents,
        }
    }

    pub fn is_single(&self) -> bool {
        self.documents.len() == 1
    }
}

impl ReportMetadata {
    pub fn new(primary_model: impl Into<String>, secondary_model: Option<String>, schema: &ScoringSchema) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            primary_model: primary_model.into(),
            secondary_model,
            criteria_count: schema.criteria_count(),
        }
    }
}

impl BatchSummary {
    pub fn from_documents(documents: &[EvaluatedDocument], schema: &ScoringSchema) -> Self {
        let successes: Vec<&EvaluatedDocument> = documents.iter().filter(|d| d.is_success()).collect();
        let successful = successes.len();

        let validation_passed = if documents.iter().any(|d| d.validation.is_some()) {
            Some(documents.iter().filter(|d| d.passed_validation()).count())
        } else {
            None
        };

        let mut method_distribution = BTreeMap::new();
        for doc in &successes {
            let method = doc
                .record
                .pipeline_method()
                .map_or("unknown".to_string(), |m| m.to_string());
            *method_distribution.entry(method).or_insert(0) += 1;
        }

        // Ties go to the alphabetically first method.
        let primary_method = method_distribution
            .iter()
            .fold(None::<(&String, usize)>, |best, (method, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((method, count)),
            })
            .map(|(method, _)| method.clone());

        let criteria_total = schema.criteria_count().max(1) as f64;
        let average_criteria_coverage = mean(
            successes
                .iter()
                .map(|d| d.record.criteria_present(schema) as f64 / criteria_total),
        );
        let average_processing_time_ms = mean(
            successes
                .iter()
                .map(|d| d.record.processing_time_ms().unwrap_or(0) as f64),
        );

        Self {
            total_documents: documents.len(),
            successful,
            success_rate: ratio(successful, documents.len()),
            validation_passed,
            average_criteria_coverage,
            average_processing_time_ms,
            primary_method,
            method_distribution,
        }
    }
}

pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate, EvaluationRecord, PipelineMethod, Recommendation};

    fn document(record: EvaluationRecord, with_validation: bool) -> EvaluatedDocument {
        let schema = ScoringSchema::default();
        EvaluatedDocument {
            source: "cv.txt".to_string(),
            validation: with_validation.then(|| validate(&record, &schema)),
            record,
        }
    }

    fn direct(total: i64) -> EvaluationRecord {
        let schema = ScoringSchema::default();
        schema
            .criterion_names()
            .fold(EvaluationRecord::new(), |r, name| r.with_score(name, 7))
            .with_total(total)
            .with_recommendation(Recommendation::Hire)
            .with_strengths(vec!["Rust".to_string()])
            .with_improvements(vec!["Go".to_string()])
            .with_processing_time(100)
            .with_method(PipelineMethod::DirectExtraction)
    }

    #[test]
    fn test_summary_statistics() {
        let schema = ScoringSchema::default();
        let partial = EvaluationRecord::new()
            .with_score("technical_skills", 5)
            .with_processing_time(300)
            .with_method(PipelineMethod::PartialExtraction);
        let documents = vec![
            document(direct(70), true),
            document(direct(70), true),
            document(partial, true),
            document(EvaluationRecord::error_record("Pipeline failed: boom", 5), true),
        ];

        let summary = BatchSummary::from_documents(&documents, &schema);
        assert_eq!(summary.total_documents, 4);
        assert_eq!(summary.successful, 3);
        assert!((summary.success_rate - 0.75).abs() < 1e-9);
        assert_eq!(summary.validation_passed, Some(2));
        assert!((summary.average_criteria_coverage - 0.7).abs() < 1e-9);
        assert!((summary.average_processing_time_ms - 500.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.primary_method.as_deref(), Some("direct_extraction"));
        assert_eq!(summary.method_distribution.get("partial_extraction"), Some(&1));
    }

    #[test]
    fn test_empty_batch() {
        let summary = BatchSummary::from_documents(&[], &ScoringSchema::default());
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.validation_passed, None);
        assert_eq!(summary.primary_method, None);
    }
}
