//! Certifies an `EvaluationRecord` against schema, range and consistency rules

use super::{
    integral, EvaluationRecord, Recommendation, ScoringSchema, FIELD_AREAS_FOR_IMPROVEMENT,
    FIELD_KEY_STRENGTHS, FIELD_PROCESSING_TIME, FIELD_RECOMMENDATION, FIELD_TOTAL_SCORE, SCORE_MAX,
    SCORE_MIN, TOTAL_MAX, TOTAL_MIN,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub criteria_coverage: f64,
    pub format_valid: bool,
    pub scores_valid: bool,
    pub recommendation_valid: bool,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            criteria_coverage: 0.0,
            format_valid: true,
            scores_valid: true,
            recommendation_valid: true,
        }
    }
}

/// Validate a finished record. Violations are reported, never raised.
pub fn validate(record: &EvaluationRecord, schema: &ScoringSchema) -> ValidationReport {
    let mut report = ValidationReport::default();

    if let Some(message) = record.error() {
        report.valid = false;
        report.errors.push(format!("Error in result: {}", message));
        return report;
    }

    check_required_fields(record, schema, &mut report);
    check_coverage(record, schema, &mut report);
    check_criterion_scores(record, schema, &mut report);
    check_total_score(record, schema, &mut report);
    check_recommendation(record, &mut report);
    check_list_fields(record, &mut report);
    check_processing_time(record, &mut report);

    report.valid = report.errors.is_empty()
        && report.format_valid
        && report.scores_valid
        && report.recommendation_valid;

    report
}

fn check_required_fields(record: &EvaluationRecord, schema: &ScoringSchema, report: &mut ValidationReport) {
    let mut missing: Vec<&str> = schema
        .criterion_names()
        .filter(|name| !record.criteria().contains(name))
        .collect();

    let fixed = [
        (FIELD_TOTAL_SCORE, record.raw_total_score().is_some()),
        (FIELD_RECOMMENDATION, record.raw_recommendation().is_some()),
        (FIELD_KEY_STRENGTHS, record.raw_key_strengths().is_some()),
        (FIELD_AREAS_FOR_IMPROVEMENT, record.raw_areas_for_improvement().is_some()),
        (
            FIELD_PROCESSING_TIME,
            record.processing_time_ms().is_some() || record.extras().contains_key(FIELD_PROCESSING_TIME),
        ),
    ];
    missing.extend(fixed.iter().filter(|(_, present)| !present).map(|(name, _)| *name));

    if !missing.is_empty() {
        report.format_valid = false;
        report.errors.push(format!("Missing required fields: {:?}", missing));
    }
}

fn check_coverage(record: &EvaluationRecord, schema: &ScoringSchema, report: &mut ValidationReport) {
    let found = record.criteria_present(schema);
    let total = schema.criteria_count();
    report.criteria_coverage = if total == 0 { 0.0 } else { found as f64 / total as f64 };

    if found < schema.low_coverage_threshold {
        report
            .warnings
            .push(format!("Low criteria coverage: {}/{}", found, total));
    }
}

fn check_criterion_scores(record: &EvaluationRecord, schema: &ScoringSchema, report: &mut ValidationReport) {
    for name in schema.criterion_names() {
        let Some(value) = record.criteria().get(name) else {
            continue;
        };
        let in_range = integral(value).is_some_and(|score| (SCORE_MIN..=SCORE_MAX).contains(&score));
        if !in_range {
            report.scores_valid = false;
            report.errors.push(format!(
                "Invalid score for {}: {} (must be {}-{})",
                name, value, SCORE_MIN, SCORE_MAX
            ));
        }
    }
}

fn check_total_score(record: &EvaluationRecord, schema: &ScoringSchema, report: &mut ValidationReport) {
    let Some(value) = record.raw_total_score() else {
        return;
    };

    let Some(total) = value.as_f64() else {
        report
            .errors
            .push(format!("Invalid total score: {} (must be 10-100)", value));
        return;
    };

    if !(TOTAL_MIN..=TOTAL_MAX).contains(&total) {
        report
            .errors
            .push(format!("Invalid total score: {} (must be 10-100)", value));
    }

    // Extracted data is often partial, so a mismatch only warns.
    let sum: f64 = schema
        .criterion_names()
        .filter_map(|name| record.criteria().get(name))
        .filter_map(Value::as_f64)
        .sum();
    if (sum - total).abs() > schema.total_tolerance as f64 {
        report.warnings.push(format!(
            "Total score inconsistency: sum={}, total={}",
            sum, value
        ));
    }
}

fn check_recommendation(record: &EvaluationRecord, report: &mut ValidationReport) {
    let Some(value) = record.raw_recommendation() else {
        return;
    };
    let known = value
        .as_str()
        .is_some_and(|label| label.parse::<Recommendation>().is_ok());
    if !known {
        report.recommendation_valid = false;
        report
            .errors
            .push(format!("Invalid recommendation: {}", value));
    }
}

fn check_list_fields(record: &EvaluationRecord, report: &mut ValidationReport) {
    let fields = [
        (FIELD_KEY_STRENGTHS, record.raw_key_strengths()),
        (FIELD_AREAS_FOR_IMPROVEMENT, record.raw_areas_for_improvement()),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            if !value.is_array() {
                report.errors.push(format!("{} must be a list", name));
            }
        }
    }
}

fn check_processing_time(record: &EvaluationRecord, report: &mut ValidationReport) {
    if let Some(value) = record.extras().get(FIELD_PROCESSING_TIME) {
        report.errors.push(format!(
            "{} must be a non-negative integer, got {}",
            FIELD_PROCESSING_TIME, value
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PipelineMethod;
    use serde_json::json;

    fn complete_record(schema: &ScoringSchema) -> EvaluationRecord {
        let record = schema
            .criterion_names()
            .fold(EvaluationRecord::new(), |r, name| r.with_score(name, 7));
        record
            .with_total(70)
            .with_recommendation(Recommendation::Hire)
            .with_strengths(vec!["Strong problem solving".to_string()])
            .with_improvements(vec!["Could improve leadership".to_string()])
            .with_processing_time(1200)
            .with_method(PipelineMethod::DirectExtraction)
    }

    fn from_json(value: Value, schema: &ScoringSchema) -> EvaluationRecord {
        EvaluationRecord::from_json_value(value, schema).unwrap()
    }

    #[test]
    fn test_complete_record_is_valid() {
        let schema = ScoringSchema::default();
        let report = validate(&complete_record(&schema), &schema);
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty());
        assert_eq!(report.criteria_coverage, 1.0);
    }

    #[test]
    fn test_error_marker_short_circuits() {
        let schema = ScoringSchema::default();
        let record = EvaluationRecord::error_record("Pipeline failed: boom", 12);
        let report = validate(&record, &schema);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Error in result: Pipeline failed: boom".to_string()]);
        assert!(report.warnings.is_empty());
        // Sub-flags are not evaluated once the marker is seen.
        assert!(report.format_valid);
    }

    #[test]
    fn test_score_of_eleven_invalidates_scores() {
        let schema = ScoringSchema::default();
        let record = complete_record(&schema).with_score("technical_skills", 11);
        let report = validate(&record, &schema);
        assert!(!report.scores_valid);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("technical_skills")));
    }

    #[test]
    fn test_fractional_and_textual_scores_are_invalid() {
        let schema = ScoringSchema::default();
        let record = complete_record(&schema)
            .with_raw_score("cultural_fit", json!(7.5))
            .with_raw_score("problem_solving", json!("eight"));
        let report = validate(&record, &schema);
        assert!(!report.scores_valid);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_unknown_recommendation_invalidates() {
        let schema = ScoringSchema::default();
        let mut value = serde_json::to_value(complete_record(&schema)).unwrap();
        value["recommendation"] = json!("maybe");
        let report = validate(&from_json(value, &schema), &schema);
        assert!(!report.recommendation_valid);
        assert!(!report.valid);
    }

    #[test]
    fn test_missing_total_invalidates_format() {
        let schema = ScoringSchema::default();
        let mut value = serde_json::to_value(complete_record(&schema)).unwrap();
        value.as_object_mut().unwrap().remove("total_score");
        let report = validate(&from_json(value, &schema), &schema);
        assert!(!report.format_valid);
        assert!(report.errors[0].contains("total_score"));
    }

    #[test]
    fn test_total_out_of_range_is_error() {
        let schema = ScoringSchema::default();
        let record = complete_record(&schema).with_total(120);
        let report = validate(&record, &schema);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.starts_with("Invalid total score")));
        // Flags stay true: only the error list carries this violation.
        assert!(report.format_valid && report.scores_valid && report.recommendation_valid);
    }

    #[test]
    fn test_inconsistent_total_only_warns() {
        let schema = ScoringSchema::default();
        let record = complete_record(&schema).with_total(80);
        let report = validate(&record, &schema);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("sum=70"));

        let within = complete_record(&schema).with_total(75);
        assert!(validate(&within, &schema).warnings.is_empty());
    }

    #[test]
    fn test_low_coverage_warns() {
        let schema = ScoringSchema::default();
        let record = EvaluationRecord::new()
            .with_score("technical_skills", 8)
            .with_score("problem_solving", 6)
            .with_total(14);
        let report = validate(&record, &schema);
        assert_eq!(report.criteria_coverage, 0.2);
        assert!(report.warnings.iter().any(|w| w == "Low criteria coverage: 2/10"));
        assert!(!report.format_valid);
    }

    #[test]
    fn test_list_fields_must_be_lists() {
        let schema = ScoringSchema::default();
        let mut value = serde_json::to_value(complete_record(&schema)).unwrap();
        value["key_strengths"] = json!("everything");
        let report = validate(&from_json(value, &schema), &schema);
        assert!(!report.valid);
        assert!(report.errors.contains(&"key_strengths must be a list".to_string()));
    }

    #[test]
    fn test_negative_processing_time_is_error() {
        let schema = ScoringSchema::default();
        let mut value = serde_json::to_value(complete_record(&schema)).unwrap();
        value["processing_time_ms"] = json!(-1);
        let report = validate(&from_json(value, &schema), &schema);
        assert!(!report.valid);
        assert!(report.format_valid);
        assert!(report.errors[0].starts_with("processing_time_ms"));
    }
}
