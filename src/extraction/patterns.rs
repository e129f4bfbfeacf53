//! Ordered pattern families for pulling individual fields out of prose.
//!
//! Each matcher is a pure function over pre-compiled patterns; the first
//! family that produces an in-range value wins.

use crate::error::Result;
use crate::schema::{Recommendation, SCORE_MAX, SCORE_MIN, TOTAL_MAX, TOTAL_MIN};
use regex::Regex;

/// Pattern families for one criterion, most specific first.
#[derive(Debug, Clone)]
pub struct CriterionPatterns {
    pub criterion: String,
    families: Vec<Regex>,
}

impl CriterionPatterns {
    pub fn compile(criterion: &str) -> Result<Self> {
        let spaced = regex::escape(&criterion.replace('_', " "));
        let spaced_upper = regex::escape(&criterion.replace('_', " ").to_uppercase());
        let snake_upper = regex::escape(&criterion.to_uppercase());

        let sources = [
            format!(r"(?is){}.*?score.*?:\s*([0-9]+)/10", spaced),
            format!(r"(?is){}.*?:\s*([0-9]+)/10", spaced),
            format!(r"(?is){}[\s\-]*([0-9]+)/10", spaced),
            format!(r"(?is){}.*?([0-9]+)/10", spaced_upper),
            format!(r"(?is){}.*?([0-9]+)/10", snake_upper),
        ];

        let families = sources
            .iter()
            .map(|source| Regex::new(source))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            criterion: criterion.to_string(),
            families,
        })
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }
}

/// Phrasings for the total score, most specific first.
#[derive(Debug, Clone)]
pub struct TotalPatterns(Vec<Regex>);

impl TotalPatterns {
    pub fn compile() -> Result<Self> {
        let families = [
            r"(?i)Total Score[:\s]*([0-9]+)",
            r"(?i)Total[:\s]*([0-9]+)",
            r"(?i)Overall Score[:\s]*([0-9]+)",
        ]
        .iter()
        .map(|source| Regex::new(source))
        .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self(families))
    }
}

/// One anchored pattern per recommendation label, in ladder order.
#[derive(Debug, Clone)]
pub struct RecommendationPatterns(Vec<(Recommendation, Regex)>);

impl RecommendationPatterns {
    pub fn compile() -> Result<Self> {
        let mut patterns = Vec::with_capacity(Recommendation::ALL.len());
        for recommendation in Recommendation::ALL {
            let label = recommendation
                .as_str()
                .split('_')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[\s_\-]?");
            let regex = Regex::new(&format!(r"(?i)Recommendation[:\s]*{}\b", label))?;
            patterns.push((recommendation, regex));
        }
        Ok(Self(patterns))
    }
}

/// Matches the `N/10` fraction inside a criterion span.
#[derive(Debug, Clone)]
pub struct ScoreFraction(Regex);

impl ScoreFraction {
    pub fn compile() -> Result<Self> {
        Ok(Self(Regex::new(r"([0-9]+)/10")?))
    }

    fn first_score(&self, span: &str) -> Option<i64> {
        self.0
            .captures(span)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok())
    }
}

/// Score for one criterion. The first `N/10` inside the matched span is taken;
/// a value outside 1-10 rejects that family and the next one is tried.
pub fn match_criterion_score(prose: &str, patterns: &CriterionPatterns, fraction: &ScoreFraction) -> Option<u8> {
    patterns.families.iter().find_map(|family| {
        let span = family.find(prose)?;
        let score = fraction.first_score(span.as_str())?;
        if (SCORE_MIN..=SCORE_MAX).contains(&score) {
            u8::try_from(score).ok()
        } else {
            None
        }
    })
}

/// Total score from the first family whose first match lies in 10-100.
pub fn match_total_score(prose: &str, patterns: &TotalPatterns) -> Option<i64> {
    patterns.0.iter().find_map(|family| {
        let total = family
            .captures(prose)?
            .get(1)?
            .as_str()
            .parse::<i64>()
            .ok()?;
        ((TOTAL_MIN as i64)..=(TOTAL_MAX as i64))
            .contains(&total)
            .then_some(total)
    })
}

pub fn match_recommendation(prose: &str, patterns: &RecommendationPatterns) -> Option<Recommendation> {
    patterns
        .0
        .iter()
        .find(|(_, regex)| regex.is_match(prose))
        .map(|(recommendation, _)| *recommendation)
}

pub fn has_heading(prose: &str, heading: &str) -> bool {
    prose.contains(heading)
}
