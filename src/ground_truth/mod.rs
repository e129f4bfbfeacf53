//! Deterministic ground-truth oracle.
//!
//! Given a coarse persona, produces a consistent (record, prose) pair whose
//! prose is always directly extractable. Used for calibration runs and as a
//! reference when checking the resolution pipeline.

pub mod calibration;
pub mod generator;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use calibration::{calibrate, CalibrationReport};
pub use generator::{GroundTruth, GroundTruthGenerator};

/// Known domains used when sampling personas for calibration.
pub const SAMPLE_DOMAINS: [&str; 2] = ["data_science", "software_engineering"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Excellent,
    Good,
    Average,
    BelowAverage,
    Unspecified,
}

impl QualityTier {
    pub const KNOWN: [QualityTier; 4] = [
        QualityTier::Excellent,
        QualityTier::Good,
        QualityTier::Average,
        QualityTier::BelowAverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "excellent",
            QualityTier::Good => "good",
            QualityTier::Average => "average",
            QualityTier::BelowAverage => "below_average",
            QualityTier::Unspecified => "unspecified",
        }
    }

    pub(crate) fn base_score(&self) -> f64 {
        match self {
            QualityTier::Excellent => 8.5,
            QualityTier::Good => 7.0,
            QualityTier::Average => 5.5,
            QualityTier::BelowAverage => 3.5,
            QualityTier::Unspecified => 6.0,
        }
    }
}

impl From<&str> for QualityTier {
    fn from(value: &str) -> Self {
        match value.trim() {
            "excellent" => QualityTier::Excellent,
            "good" => QualityTier::Good,
            "average" => QualityTier::Average,
            "below_average" => QualityTier::BelowAverage,
            _ => QualityTier::Unspecified,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
    Unspecified,
}

impl ExperienceLevel {
    pub const KNOWN: [ExperienceLevel; 4] = [
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Executive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Executive => "executive",
            ExperienceLevel::Unspecified => "unspecified",
        }
    }

    pub(crate) fn modifier(&self) -> f64 {
        match self {
            ExperienceLevel::Entry => -0.5,
            ExperienceLevel::Mid | ExperienceLevel::Unspecified => 0.0,
            ExperienceLevel::Senior => 0.5,
            ExperienceLevel::Executive => 1.0,
        }
    }
}

impl From<&str> for ExperienceLevel {
    /// Case-insensitive; unknown levels carry no modifier.
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "entry" => ExperienceLevel::Entry,
            "mid" => ExperienceLevel::Mid,
            "senior" => ExperienceLevel::Senior,
            "executive" => ExperienceLevel::Executive,
            _ => ExperienceLevel::Unspecified,
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaInput {
    pub quality_tier: QualityTier,
    pub experience_level: ExperienceLevel,
    pub domain: String,
}

impl PersonaInput {
    pub fn new(quality_tier: &str, experience_level: &str, domain: &str) -> Self {
        Self {
            quality_tier: QualityTier::from(quality_tier),
            experience_level: ExperienceLevel::from(experience_level),
            domain: domain.to_string(),
        }
    }

    /// `data_science`, `Data Science` and `data-science` all qualify.
    pub fn is_data_science(&self) -> bool {
        self.domain.trim().to_lowercase().replace(['-', ' '], "_") == "data_science"
    }

    /// Domain as it reads in a sentence.
    pub fn domain_phrase(&self) -> String {
        self.domain.replace('_', " ")
    }
}
