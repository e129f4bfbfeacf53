//! Feeds oracle prose through the real resolution pipeline and measures how
//! much of the known answer comes back out.

use super::{ExperienceLevel, GroundTruthGenerator, PersonaInput, QualityTier, SAMPLE_DOMAINS};
use crate::error::Result;
use crate::llm::StaticGenerator;
use crate::output::report::ratio;
use crate::pipeline::ResolutionPipeline;
use crate::schema::ScoringSchema;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub samples: usize,
    pub seed: u64,
    /// Fraction of all criterion scores recovered exactly.
    pub criteria_accuracy: f64,
    pub total_accuracy: f64,
    pub recommendation_accuracy: f64,
    pub method_distribution: BTreeMap<String, usize>,
    pub mismatches: Vec<CalibrationMismatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMismatch {
    pub sample: usize,
    pub persona: PersonaInput,
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl CalibrationReport {
    pub fn is_perfect(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Draws a persona uniformly from the known tiers, levels and domains.
pub fn sample_persona<R: Rng + ?Sized>(rng: &mut R) -> PersonaInput {
    let quality = QualityTier::KNOWN.choose(rng).copied().unwrap_or(QualityTier::Unspecified);
    let level = ExperienceLevel::KNOWN.choose(rng).copied().unwrap_or(ExperienceLevel::Unspecified);
    let domain = SAMPLE_DOMAINS.choose(rng).copied().unwrap_or("data_science");
    PersonaInput {
        quality_tier: quality,
        experience_level: level,
        domain: domain.to_string(),
    }
}

pub async fn calibrate(schema: Arc<ScoringSchema>, samples: usize, seed: u64) -> Result<CalibrationReport> {
    let generator = GroundTruthGenerator::new(schema.clone());
    let mut rng = StdRng::seed_from_u64(seed);

    let mut criteria_hits = 0usize;
    let mut criteria_seen = 0usize;
    let mut total_hits = 0usize;
    let mut recommendation_hits = 0usize;
    let mut method_distribution = BTreeMap::new();
    let mut mismatches = Vec::new();

    for sample in 0..samples {
        let persona = sample_persona(&mut rng);
        let truth = generator.generate(&persona, &mut rng);

        let pipeline: ResolutionPipeline<StaticGenerator, StaticGenerator> =
            ResolutionPipeline::new(StaticGenerator::new(truth.prose.clone()), None, schema.clone(), 500)?;
        let resolution = pipeline.resolve(&format!("Synthetic CV #{}", sample)).await?;
        let record = resolution.record;

        let method = record.pipeline_method().map_or("unknown".to_string(), |m| m.to_string());
        *method_distribution.entry(method).or_insert(0) += 1;

        let mut mismatch = |field: &str, expected: String, actual: String| {
            mismatches.push(CalibrationMismatch {
                sample,
                persona: persona.clone(),
                field: field.to_string(),
                expected,
                actual,
            });
        };

        for name in schema.criterion_names() {
            criteria_seen += 1;
            let expected = truth.record.score(name);
            let actual = record.score(name);
            if expected == actual {
                criteria_hits += 1;
            } else {
                mismatch(name, format!("{:?}", expected), format!("{:?}", actual));
            }
        }

        if truth.record.total_score() == record.total_score() {
            total_hits += 1;
        } else {
            mismatch(
                "total_score",
                format!("{:?}", truth.record.total_score()),
                format!("{:?}", record.total_score()),
            );
        }

        if truth.record.recommendation() == record.recommendation() {
            recommendation_hits += 1;
        } else {
            mismatch(
                "recommendation",
                format!("{:?}", truth.record.recommendation()),
                format!("{:?}", record.recommendation()),
            );
        }

        debug!("Calibration sample {} resolved as {}", sample, resolution.state);
    }

    Ok(CalibrationReport {
        samples,
        seed,
        criteria_accuracy: ratio(criteria_hits, criteria_seen),
        total_accuracy: ratio(total_hits, samples),
        recommendation_accuracy: ratio(recommendation_hits, samples),
        method_distribution,
        mismatches,
    })
}
