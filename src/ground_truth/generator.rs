use super::{ExperienceLevel, PersonaInput, QualityTier};
use crate::extraction::{IMPROVEMENTS_HEADING, STRENGTHS_HEADING};
use crate::schema::{display_name, EvaluationRecord, ScoringSchema, SCORE_MAX, SCORE_MIN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const TECHNICAL_SKILLS: &str = "technical_skills";
const LEADERSHIP_POTENTIAL: &str = "leadership_potential";
const EXPERIENCE_RELEVANCE: &str = "experience_relevance";

const STRENGTH_THRESHOLD: u8 = 8;
const IMPROVEMENT_THRESHOLD: u8 = 5;
const MAX_STRENGTHS: usize = 3;
const MIN_STRENGTHS: usize = 2;
const MAX_IMPROVEMENTS: usize = 2;

#[derive(Debug, Clone)]
pub struct GroundTruth {
    pub record: EvaluationRecord,
    pub prose: String,
}

/// Scoring oracle. Holds no mutable state, so one instance can serve
/// concurrent callers each bringing their own RNG.
pub struct GroundTruthGenerator {
    schema: Arc<ScoringSchema>,
}

impl GroundTruthGenerator {
    pub fn new(schema: Arc<ScoringSchema>) -> Self {
        Self { schema }
    }

    pub fn generate<R: Rng + ?Sized>(&self, persona: &PersonaInput, rng: &mut R) -> GroundTruth {
        let scores = self.scores(persona, rng);
        let total: i64 = scores.iter().map(|(_, s)| i64::from(*s)).sum();
        let recommendation = self.schema.canonical_ladder.recommend(total);
        let strengths = strengths(&scores, persona);
        let improvements = improvements(&scores, persona);

        let prose = render_prose(&scores, total, recommendation.as_str(), &strengths, &improvements);

        let record = scores
            .iter()
            .fold(EvaluationRecord::new(), |record, (name, score)| record.with_score(name, *score))
            .with_total(total)
            .with_recommendation(recommendation)
            .with_strengths(strengths)
            .with_improvements(improvements)
            .with_processing_time(rng.gen_range(800..=2500));

        GroundTruth { record, prose }
    }

    /// Same persona and seed always give the same pair.
    pub fn generate_seeded(&self, persona: &PersonaInput, seed: u64) -> GroundTruth {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate(persona, &mut rng)
    }

    fn scores<R: Rng + ?Sized>(&self, persona: &PersonaInput, rng: &mut R) -> Vec<(String, u8)> {
        let base = persona.quality_tier.base_score() + persona.experience_level.modifier();

        self.schema
            .criterion_names()
            .map(|name| {
                let mut score = base + rng.gen_range(-1.0..=1.0);
                score += nudge(name, persona);
                let rounded = (score.round_ties_even() as i64).clamp(SCORE_MIN, SCORE_MAX);
                (name.to_string(), rounded as u8)
            })
            .collect()
    }
}

fn nudge(criterion: &str, persona: &PersonaInput) -> f64 {
    match criterion {
        TECHNICAL_SKILLS if persona.is_data_science() => 0.5,
        LEADERSHIP_POTENTIAL if persona.experience_level == ExperienceLevel::Executive => 1.0,
        EXPERIENCE_RELEVANCE if persona.experience_level == ExperienceLevel::Entry => -1.0,
        _ => 0.0,
    }
}

fn phrase(criterion: &str) -> String {
    criterion.replace('_', " ")
}

fn strengths(scores: &[(String, u8)], persona: &PersonaInput) -> Vec<String> {
    let mut high: Vec<&(String, u8)> = scores.iter().filter(|(_, s)| *s >= STRENGTH_THRESHOLD).collect();
    // Stable sort: ties keep schema order.
    high.sort_by(|a, b| b.1.cmp(&a.1));

    let mut strengths: Vec<String> = high
        .iter()
        .take(2)
        .map(|(name, _)| format!("Strong {}", phrase(name)))
        .collect();

    if matches!(persona.quality_tier, QualityTier::Excellent | QualityTier::Good) {
        strengths.push(format!("Excellent {} expertise", persona.domain_phrase()));
    }

    while strengths.len() < MIN_STRENGTHS {
        strengths.push("Solid professional background".to_string());
    }
    strengths.truncate(MAX_STRENGTHS);
    strengths
}

fn improvements(scores: &[(String, u8)], persona: &PersonaInput) -> Vec<String> {
    let mut low: Vec<&(String, u8)> = scores.iter().filter(|(_, s)| *s <= IMPROVEMENT_THRESHOLD).collect();
    low.sort_by(|a, b| a.1.cmp(&b.1));

    let mut improvements: Vec<String> = low
        .iter()
        .take(2)
        .map(|(name, _)| format!("Could improve {}", phrase(name)))
        .collect();

    if persona.experience_level == ExperienceLevel::Entry {
        improvements.push("Needs more professional experience".to_string());
    } else if persona.quality_tier == QualityTier::BelowAverage {
        improvements.push("Requires skill development".to_string());
    }

    if improvements.is_empty() {
        improvements.push("Continue professional development".to_string());
    }
    improvements.truncate(MAX_IMPROVEMENTS);
    improvements
}

fn band(score: u8) -> &'static str {
    match score {
        8..=u8::MAX => "Excellent",
        6..=7 => "Good",
        4..=5 => "Average",
        _ => "Below average",
    }
}

fn render_prose(
    scores: &[(String, u8)],
    total: i64,
    recommendation: &str,
    strengths: &[String],
    improvements: &[String],
) -> String {
    let mut lines: Vec<String> = scores
        .iter()
        .map(|(name, score)| {
            format!(
                "{}: {}/10. {} performance in this area.",
                display_name(name),
                score,
                band(*score)
            )
        })
        .collect();

    lines.push(format!("\nTotal Score: {}", total));
    lines.push(format!("Recommendation: {}", recommendation));

    lines.push(format!("\n{}", STRENGTHS_HEADING));
    lines.extend(strengths.iter().map(|s| format!("- {}", s)));

    lines.push(format!("\n{}", IMPROVEMENTS_HEADING));
    lines.extend(improvements.iter().map(|s| format!("- {}", s)));

    lines.join("\n")
}
