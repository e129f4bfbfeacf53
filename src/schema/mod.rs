//! Structured evaluation schema: the record every tier must produce and the
//! immutable scoring configuration threaded through extraction, validation
//! and ground-truth generation.

pub mod validator;

use crate::error::{CvEvaluatorError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub use validator::{validate, ValidationReport};

pub const SCORE_MIN: i64 = 1;
pub const SCORE_MAX: i64 = 10;
pub const TOTAL_MIN: f64 = 10.0;
pub const TOTAL_MAX: f64 = 100.0;

pub const FIELD_TOTAL_SCORE: &str = "total_score";
pub const FIELD_RECOMMENDATION: &str = "recommendation";
pub const FIELD_KEY_STRENGTHS: &str = "key_strengths";
pub const FIELD_AREAS_FOR_IMPROVEMENT: &str = "areas_for_improvement";
pub const FIELD_PROCESSING_TIME: &str = "processing_time_ms";
pub const FIELD_PIPELINE_METHOD: &str = "pipeline_method";
pub const FIELD_ERROR: &str = "error";

/// Hiring recommendation, ordered by desirability (`StrongHire` is greatest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongNoHire,
    NoHire,
    LeanHire,
    Hire,
    StrongHire,
}

impl Recommendation {
    /// All labels from most to least desirable.
    pub const ALL: [Recommendation; 5] = [
        Recommendation::StrongHire,
        Recommendation::Hire,
        Recommendation::LeanHire,
        Recommendation::NoHire,
        Recommendation::StrongNoHire,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongHire => "strong_hire",
            Recommendation::Hire => "hire",
            Recommendation::LeanHire => "lean_hire",
            Recommendation::NoHire => "no_hire",
            Recommendation::StrongNoHire => "strong_no_hire",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = CvEvaluatorError;

    fn from_str(s: &str) -> Result<Self> {
        Recommendation::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CvEvaluatorError::InvalidInput(format!("Unknown recommendation: {}", s)))
    }
}

/// Which resolution tier produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMethod {
    DirectExtraction,
    SecondaryConversion,
    PartialExtraction,
}

impl PipelineMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineMethod::DirectExtraction => "direct_extraction",
            PipelineMethod::SecondaryConversion => "secondary_conversion",
            PipelineMethod::PartialExtraction => "partial_extraction",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "direct_extraction" => Some(PipelineMethod::DirectExtraction),
            "secondary_conversion" => Some(PipelineMethod::SecondaryConversion),
            "partial_extraction" => Some(PipelineMethod::PartialExtraction),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total-score thresholds mapping a total to a recommendation.
///
/// When `no_hire` is `None` the ladder bottoms out at `no_hire` and never
/// yields `strong_no_hire`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationLadder {
    pub strong_hire: i64,
    pub hire: i64,
    pub lean_hire: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_hire: Option<i64>,
}

impl RecommendationLadder {
    /// The five-tier ladder used by the ground-truth oracle.
    pub fn canonical() -> Self {
        Self {
            strong_hire: 85,
            hire: 70,
            lean_hire: 55,
            no_hire: Some(40),
        }
    }

    /// The coarser ladder used when synthesizing a missing recommendation.
    pub fn fallback() -> Self {
        Self {
            strong_hire: 85,
            hire: 70,
            lean_hire: 50,
            no_hire: None,
        }
    }

    pub fn recommend(&self, total: i64) -> Recommendation {
        if total >= self.strong_hire {
            Recommendation::StrongHire
        } else if total >= self.hire {
            Recommendation::Hire
        } else if total >= self.lean_hire {
            Recommendation::LeanHire
        } else {
            match self.no_hire {
                Some(floor) if total < floor => Recommendation::StrongNoHire,
                _ => Recommendation::NoHire,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSpec {
    pub name: String,
    pub description: String,
}

impl CriterionSpec {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Immutable scoring configuration shared (read-only) by every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSchema {
    /// Score assigned to a criterion the synthesizer has to invent.
    pub default_score: u8,
    /// Criteria needed (together with a total) to accept direct extraction.
    pub min_direct_criteria: usize,
    /// Criteria below which the validator warns about coverage.
    pub low_coverage_threshold: usize,
    /// Allowed gap between the total and the criteria sum before warning.
    pub total_tolerance: i64,
    pub canonical_ladder: RecommendationLadder,
    pub fallback_ladder: RecommendationLadder,
    pub criteria: Vec<CriterionSpec>,
}

impl Default for ScoringSchema {
    fn default() -> Self {
        Self {
            default_score: 5,
            min_direct_criteria: 5,
            low_coverage_threshold: 5,
            total_tolerance: 5,
            canonical_ladder: RecommendationLadder::canonical(),
            fallback_ladder: RecommendationLadder::fallback(),
            criteria: vec![
                CriterionSpec::new("technical_skills", "Technical expertise and proficiency relevant to role"),
                CriterionSpec::new("experience_relevance", "Relevance and quality of work experience"),
                CriterionSpec::new("education_quality", "Quality and prestige of educational background"),
                CriterionSpec::new("leadership_potential", "Leadership experience and management potential"),
                CriterionSpec::new("communication_skills", "Written communication and presentation skills"),
                CriterionSpec::new("problem_solving", "Problem-solving abilities and analytical thinking"),
                CriterionSpec::new("innovation_mindset", "Innovation, creativity, and forward-thinking"),
                CriterionSpec::new("cultural_fit", "Cultural alignment and team collaboration indicators"),
                CriterionSpec::new("career_progression", "Career growth trajectory and advancement"),
                CriterionSpec::new("overall_impression", "Overall assessment and candidate potential"),
            ],
        }
    }
}

impl ScoringSchema {
    pub fn criterion_names(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|c| c.name.as_str())
    }

    pub fn is_criterion(&self, name: &str) -> bool {
        self.criteria.iter().any(|c| c.name == name)
    }

    pub fn criteria_count(&self) -> usize {
        self.criteria.len()
    }

    pub fn check(&self) -> Result<()> {
        if self.criteria.is_empty() {
            return Err(CvEvaluatorError::Configuration(
                "at least one evaluation criterion is required".to_string(),
            ));
        }
        if !(SCORE_MIN..=SCORE_MAX).contains(&i64::from(self.default_score)) {
            return Err(CvEvaluatorError::Configuration(format!(
                "default_score {} is outside {}-{}",
                self.default_score, SCORE_MIN, SCORE_MAX
            )));
        }
        Ok(())
    }
}

/// "technical_skills" -> "Technical Skills"
pub fn display_name(criterion: &str) -> String {
    criterion
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the value as an integer when it is an integer-valued number.
pub(crate) fn integral(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}

/// Ordered criterion name -> score mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriteriaScores(Vec<(String, Value)>);

impl CriteriaScores {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    fn sort_by_schema(&mut self, schema: &ScoringSchema) {
        let position = |name: &str| schema.criterion_names().position(|n| n == name).unwrap_or(usize::MAX);
        self.0.sort_by_key(|(name, _)| position(name));
    }

    fn insert(&mut self, name: &str, value: Value) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name.to_string(), value)),
        }
    }
}

/// The canonical structured evaluation.
///
/// Fields that may come from an untrusted collaborator are kept as raw JSON
/// values so the validator can report exactly what was received. Records are
/// built through the consuming `with_*` methods and never mutated after
/// being handed out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluationRecord {
    criteria: CriteriaScores,
    total_score: Option<Value>,
    recommendation: Option<Value>,
    key_strengths: Option<Value>,
    areas_for_improvement: Option<Value>,
    processing_time_ms: Option<u64>,
    pipeline_method: Option<PipelineMethod>,
    error: Option<String>,
    extras: Map<String, Value>,
}

impl EvaluationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit error record produced at the pipeline boundary.
    pub fn error_record(message: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            error: Some(message.into()),
            processing_time_ms: Some(elapsed_ms),
            ..Self::default()
        }
    }

    pub fn with_score(self, criterion: &str, score: u8) -> Self {
        self.with_raw_score(criterion, Value::from(score))
    }

    pub fn with_raw_score(mut self, criterion: &str, value: Value) -> Self {
        self.criteria.insert(criterion, value);
        self
    }

    pub fn with_total(mut self, total: i64) -> Self {
        self.total_score = Some(Value::from(total));
        self
    }

    pub fn with_recommendation(mut self, recommendation: Recommendation) -> Self {
        self.recommendation = Some(Value::from(recommendation.as_str()));
        self
    }

    pub fn with_strengths(mut self, strengths: Vec<String>) -> Self {
        self.key_strengths = Some(Value::from(strengths));
        self
    }

    pub fn with_improvements(mut self, improvements: Vec<String>) -> Self {
        self.areas_for_improvement = Some(Value::from(improvements));
        self
    }

    /// Also drops an unusable collaborator value parked in `extras`.
    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self.extras.remove(FIELD_PROCESSING_TIME);
        self
    }

    pub fn with_method(mut self, method: PipelineMethod) -> Self {
        self.pipeline_method = Some(method);
        self.extras.remove(FIELD_PIPELINE_METHOD);
        self
    }

    /// Reorders criteria to follow the schema; unknown names go last.
    pub fn ordered_by(mut self, schema: &ScoringSchema) -> Self {
        self.criteria.sort_by_schema(schema);
        self
    }

    pub fn criteria(&self) -> &CriteriaScores {
        &self.criteria
    }

    /// Integer score for a criterion, if present and integer-valued.
    pub fn score(&self, criterion: &str) -> Option<i64> {
        self.criteria.get(criterion).and_then(integral)
    }

    pub fn total_score(&self) -> Option<i64> {
        self.total_score.as_ref().and_then(integral)
    }

    pub fn raw_total_score(&self) -> Option<&Value> {
        self.total_score.as_ref()
    }

    pub fn recommendation(&self) -> Option<Recommendation> {
        self.recommendation
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn raw_recommendation(&self) -> Option<&Value> {
        self.recommendation.as_ref()
    }

    pub fn raw_key_strengths(&self) -> Option<&Value> {
        self.key_strengths.as_ref()
    }

    pub fn raw_areas_for_improvement(&self) -> Option<&Value> {
        self.areas_for_improvement.as_ref()
    }

    pub fn key_strengths(&self) -> Vec<String> {
        string_list(self.key_strengths.as_ref())
    }

    pub fn areas_for_improvement(&self) -> Vec<String> {
        string_list(self.areas_for_improvement.as_ref())
    }

    pub fn processing_time_ms(&self) -> Option<u64> {
        self.processing_time_ms
    }

    pub fn pipeline_method(&self) -> Option<PipelineMethod> {
        self.pipeline_method
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    /// Whether `key` is already written from a typed field.
    fn occupies(&self, key: &str) -> bool {
        match key {
            FIELD_TOTAL_SCORE => self.total_score.is_some(),
            FIELD_RECOMMENDATION => self.recommendation.is_some(),
            FIELD_KEY_STRENGTHS => self.key_strengths.is_some(),
            FIELD_AREAS_FOR_IMPROVEMENT => self.areas_for_improvement.is_some(),
            FIELD_PROCESSING_TIME => self.processing_time_ms.is_some(),
            FIELD_PIPELINE_METHOD => self.pipeline_method.is_some(),
            FIELD_ERROR => self.error.is_some(),
            other => self.criteria.contains(other),
        }
    }

    /// Number of schema criteria present in this record.
    pub fn criteria_present(&self, schema: &ScoringSchema) -> usize {
        schema
            .criterion_names()
            .filter(|name| self.criteria.contains(name))
            .count()
    }

    /// Builds a record from a loosely-shaped JSON object, keeping values as
    /// received. Keys the schema does not know land in `extras`.
    pub fn from_json_object(mut object: Map<String, Value>, schema: &ScoringSchema) -> Self {
        let mut record = Self::default();

        for name in schema.criterion_names() {
            if let Some(value) = object.remove(name) {
                record.criteria.insert(name, value);
            }
        }

        record.total_score = object.remove(FIELD_TOTAL_SCORE);
        record.recommendation = object.remove(FIELD_RECOMMENDATION);
        record.key_strengths = object.remove(FIELD_KEY_STRENGTHS);
        record.areas_for_improvement = object.remove(FIELD_AREAS_FOR_IMPROVEMENT);

        // Unusable values stay in extras so nothing the collaborator said is lost.
        if let Some(value) = object.remove(FIELD_PROCESSING_TIME) {
            match value.as_u64() {
                Some(ms) => record.processing_time_ms = Some(ms),
                None => {
                    object.insert(FIELD_PROCESSING_TIME.to_string(), value);
                }
            }
        }
        if let Some(value) = object.remove(FIELD_PIPELINE_METHOD) {
            match value.as_str().and_then(PipelineMethod::parse) {
                Some(method) => record.pipeline_method = Some(method),
                None => {
                    object.insert(FIELD_PIPELINE_METHOD.to_string(), value);
                }
            }
        }
        if let Some(value) = object.remove(FIELD_ERROR) {
            record.error = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        }

        record.extras = object;
        record
    }

    pub fn from_json_value(value: Value, schema: &ScoringSchema) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(Self::from_json_object(object, schema)),
            other => Err(CvEvaluatorError::InvalidInput(format!(
                "evaluation record must be a JSON object, got: {}",
                other
            ))),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl Serialize for EvaluationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.criteria.iter() {
            map.serialize_entry(name, value)?;
        }
        if let Some(v) = &self.total_score {
            map.serialize_entry(FIELD_TOTAL_SCORE, v)?;
        }
        if let Some(v) = &self.recommendation {
            map.serialize_entry(FIELD_RECOMMENDATION, v)?;
        }
        if let Some(v) = &self.key_strengths {
            map.serialize_entry(FIELD_KEY_STRENGTHS, v)?;
        }
        if let Some(v) = &self.areas_for_improvement {
            map.serialize_entry(FIELD_AREAS_FOR_IMPROVEMENT, v)?;
        }
        if let Some(v) = &self.processing_time_ms {
            map.serialize_entry(FIELD_PROCESSING_TIME, v)?;
        }
        if let Some(v) = &self.pipeline_method {
            map.serialize_entry(FIELD_PIPELINE_METHOD, v)?;
        }
        if let Some(v) = &self.error {
            map.serialize_entry(FIELD_ERROR, v)?;
        }
        for (key, value) in &self.extras {
            if !self.occupies(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
