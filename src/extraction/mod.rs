//! Turns unconstrained evaluation prose into a (possibly partial) record

pub mod json_span;
pub mod patterns;

use crate::error::Result;
use crate::schema::{EvaluationRecord, ScoringSchema};
use log::{debug, warn};
use patterns::{
    has_heading, match_criterion_score, match_recommendation, match_total_score, CriterionPatterns,
    RecommendationPatterns, ScoreFraction, TotalPatterns,
};

pub const STRENGTHS_HEADING: &str = "Key Strengths:";
pub const IMPROVEMENTS_HEADING: &str = "Areas for Improvement:";

/// Placeholder lists emitted when a section heading is present. Bullet items
/// are intentionally not parsed.
pub const EXTRACTED_STRENGTHS: [&str; 2] = ["Strong technical background", "Good experience"];
pub const EXTRACTED_IMPROVEMENTS: [&str; 1] = ["Could expand skill set"];

/// Padding tokens some generators leave in decoded output.
const PAD_TOKEN: &str = "<pad>";

/// Pattern-based extractor with all regexes compiled up front.
#[derive(Debug, Clone)]
pub struct Extractor {
    criteria: Vec<CriterionPatterns>,
    total: TotalPatterns,
    recommendation: RecommendationPatterns,
    fraction: ScoreFraction,
}

impl Extractor {
    pub fn new(schema: &ScoringSchema) -> Result<Self> {
        let criteria = schema
            .criterion_names()
            .map(CriterionPatterns::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            criteria,
            total: TotalPatterns::compile()?,
            recommendation: RecommendationPatterns::compile()?,
            fraction: ScoreFraction::compile()?,
        })
    }

    /// Extract whatever fields can be found. Absent fields stay absent; the
    /// processing-time placeholder is always set.
    pub fn extract(&self, prose: &str) -> EvaluationRecord {
        let prose = prose.replace(PAD_TOKEN, " ");
        let mut record = EvaluationRecord::new();

        for patterns in &self.criteria {
            if let Some(score) = match_criterion_score(&prose, patterns, &self.fraction) {
                record = record.with_score(&patterns.criterion, score);
            }
        }

        if let Some(total) = match_total_score(&prose, &self.total) {
            record = record.with_total(total);
        }

        if let Some(recommendation) = match_recommendation(&prose, &self.recommendation) {
            record = record.with_recommendation(recommendation);
        }

        if has_heading(&prose, STRENGTHS_HEADING) {
            record = record.with_strengths(EXTRACTED_STRENGTHS.iter().map(|s| s.to_string()).collect());
        }
        if has_heading(&prose, IMPROVEMENTS_HEADING) {
            record = record.with_improvements(EXTRACTED_IMPROVEMENTS.iter().map(|s| s.to_string()).collect());
        }

        debug!(
            "Extracted {}/{} criteria (total: {:?}, recommendation: {:?})",
            record.criteria().len(),
            self.criteria.len(),
            record.total_score(),
            record.recommendation()
        );

        record.with_processing_time(0)
    }
}

/// One-shot extraction. A schema whose patterns cannot be compiled yields an
/// empty record instead of an error.
pub fn extract(prose: &str, schema: &ScoringSchema) -> EvaluationRecord {
    match Extractor::new(schema) {
        Ok(extractor) => extractor.extract(prose),
        Err(e) => {
            warn!("Extraction unavailable: {}", e);
            EvaluationRecord::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Recommendation;

    fn extractor() -> Extractor {
        Extractor::new(&ScoringSchema::default()).unwrap()
    }

    #[test]
    fn test_minimal_prose() {
        let record = extractor().extract("Technical Skills: 8/10. Total Score: 75. Recommendation: hire");
        assert_eq!(record.criteria().len(), 1);
        assert_eq!(record.score("technical_skills"), Some(8));
        assert_eq!(record.total_score(), Some(75));
        assert_eq!(record.recommendation(), Some(Recommendation::Hire));
        assert!(record.raw_key_strengths().is_none());
        assert!(record.raw_areas_for_improvement().is_none());
        assert_eq!(record.processing_time_ms(), Some(0));
    }

    #[test]
    fn test_full_prose_with_sections() {
        let prose = "\
Technical Skills: 9/10. Deep Rust and distributed systems work.
Experience Relevance: 8/10. Directly relevant.
Education Quality: 7/10.
Leadership Potential: 6/10.
Communication Skills: 7/10.
Problem Solving: 9/10.
Innovation Mindset: 8/10.
Cultural Fit: 7/10.
Career Progression: 8/10.
Overall Impression: 8/10.

Total Score: 77
Recommendation: hire

Key Strengths:
- Systems design
- Mentoring

Areas for Improvement:
- Public speaking";
        let record = extractor().extract(prose);
        assert_eq!(record.criteria().len(), 10);
        assert_eq!(record.score("problem_solving"), Some(9));
        assert_eq!(record.score("overall_impression"), Some(8));
        assert_eq!(record.total_score(), Some(77));
        assert_eq!(record.key_strengths(), vec!["Strong technical background", "Good experience"]);
        assert_eq!(record.areas_for_improvement(), vec!["Could expand skill set"]);
    }

    #[test]
    fn test_pad_tokens_are_ignored() {
        let record = extractor().extract("Cultural<pad>Fit: 6/10");
        assert_eq!(record.score("cultural_fit"), Some(6));
    }

    #[test]
    fn test_garbage_yields_empty_criteria() {
        let record = extractor().extract("\u{0}}{{ ~~ 99/10 ~~ total: 5");
        assert!(record.criteria().is_empty());
        assert!(record.total_score().is_none());
        assert!(record.recommendation().is_none());
    }

    #[test]
    fn test_one_shot_extract() {
        let record = extract("Problem Solving: 4/10", &ScoringSchema::default());
        assert_eq!(record.score("problem_solving"), Some(4));
    }
}
