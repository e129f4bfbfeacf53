//! Completes a partial record with defaults and derived aggregates

use crate::schema::{EvaluationRecord, PipelineMethod, ScoringSchema};
use serde_json::Value;
use std::sync::Arc;

pub const FALLBACK_STRENGTHS: [&str; 2] = ["Professional experience", "Educational background"];
pub const FALLBACK_IMPROVEMENTS: [&str; 1] = ["Could expand skill set"];

pub struct FallbackSynthesizer {
    schema: Arc<ScoringSchema>,
}

impl FallbackSynthesizer {
    pub fn new(schema: Arc<ScoringSchema>) -> Self {
        Self { schema }
    }

    /// Returns a new, fully populated record tagged `partial_extraction`.
    ///
    /// Values already present are kept as they are, so completing an already
    /// completed record changes nothing.
    pub fn complete(&self, partial: &EvaluationRecord) -> EvaluationRecord {
        let mut record = partial.clone();

        for name in self.schema.criterion_names() {
            if !record.criteria().contains(name) {
                record = record.with_score(name, self.schema.default_score);
            }
        }

        let total = match record.raw_total_score() {
            Some(_) => None,
            None => Some(
                self.schema
                    .criterion_names()
                    .filter_map(|name| record.criteria().get(name))
                    .filter_map(Value::as_f64)
                    .sum::<f64>()
                    .round() as i64,
            ),
        };
        if let Some(total) = total {
            record = record.with_total(total);
        }

        if record.raw_recommendation().is_none() {
            // A non-numeric total from a collaborator is treated as the midpoint.
            let total = record.total_score().unwrap_or(50);
            record = record.with_recommendation(self.schema.fallback_ladder.recommend(total));
        }

        if record.raw_key_strengths().is_none() {
            record = record.with_strengths(FALLBACK_STRENGTHS.iter().map(|s| s.to_string()).collect());
        }
        if record.raw_areas_for_improvement().is_none() {
            record = record.with_improvements(FALLBACK_IMPROVEMENTS.iter().map(|s| s.to_string()).collect());
        }

        record
            .ordered_by(&self.schema)
            .with_method(PipelineMethod::PartialExtraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate, Recommendation};

    fn synthesizer() -> FallbackSynthesizer {
        FallbackSynthesizer::new(Arc::new(ScoringSchema::default()))
    }

    #[test]
    fn test_empty_record_gets_all_defaults() {
        let record = synthesizer().complete(&EvaluationRecord::new());
        assert_eq!(record.criteria().len(), 10);
        assert!(record.criteria().iter().all(|(_, v)| v == 5));
        assert_eq!(record.total_score(), Some(50));
        assert_eq!(record.recommendation(), Some(Recommendation::LeanHire));
        assert_eq!(record.key_strengths(), vec!["Professional experience", "Educational background"]);
        assert_eq!(record.areas_for_improvement(), vec!["Could expand skill set"]);
        assert_eq!(record.pipeline_method(), Some(PipelineMethod::PartialExtraction));
    }

    #[test]
    fn test_present_total_is_not_recomputed() {
        let partial = EvaluationRecord::new()
            .with_score("technical_skills", 8)
            .with_total(75)
            .with_recommendation(Recommendation::Hire);
        let record = synthesizer().complete(&partial);
        assert_eq!(record.score("technical_skills"), Some(8));
        assert_eq!(record.score("cultural_fit"), Some(5));
        assert_eq!(record.total_score(), Some(75));
        assert_eq!(record.recommendation(), Some(Recommendation::Hire));
    }

    #[test]
    fn test_missing_total_is_sum_of_completed_criteria() {
        let partial = EvaluationRecord::new()
            .with_score("technical_skills", 9)
            .with_score("problem_solving", 9);
        let record = synthesizer().complete(&partial);
        assert_eq!(record.total_score(), Some(58));
        assert_eq!(record.recommendation(), Some(Recommendation::LeanHire));
    }

    #[test]
    fn test_recommendation_uses_fallback_ladder() {
        let low = EvaluationRecord::new().with_total(30);
        assert_eq!(synthesizer().complete(&low).recommendation(), Some(Recommendation::NoHire));

        let high = EvaluationRecord::new().with_total(88);
        assert_eq!(synthesizer().complete(&high).recommendation(), Some(Recommendation::StrongHire));
    }

    #[test]
    fn test_complete_is_idempotent() {
        let synthesizer = synthesizer();
        let partial = EvaluationRecord::new()
            .with_score("education_quality", 3)
            .with_processing_time(0);
        let once = synthesizer.complete(&partial);
        let twice = synthesizer.complete(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_criteria_follow_schema_order() {
        let partial = EvaluationRecord::new().with_score("overall_impression", 9);
        let record = synthesizer().complete(&partial);
        let names: Vec<&str> = record.criteria().iter().map(|(n, _)| n).collect();
        assert_eq!(names.first(), Some(&"technical_skills"));
        assert_eq!(names.last(), Some(&"overall_impression"));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let partial = EvaluationRecord::new().with_score("technical_skills", 8);
        let before = partial.clone();
        let _ = synthesizer().complete(&partial);
        assert_eq!(partial, before);
    }

    #[test]
    fn test_completed_record_with_time_validates() {
        let schema = ScoringSchema::default();
        let record = synthesizer().complete(&EvaluationRecord::new()).with_processing_time(5);
        assert!(validate(&record, &schema).valid);
    }
}
