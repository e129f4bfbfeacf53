//! CV evaluator library
//!
//! Turns unconstrained evaluation prose from a text-generation collaborator
//! into a schema-valid [`schema::EvaluationRecord`], degrading from direct
//! extraction to secondary conversion to fallback synthesis, and ships a
//! deterministic ground-truth oracle to check that process against.

pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod ground_truth;
pub mod input;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod schema;

pub use config::Config;
pub use error::{CvEvaluatorError, Result};
pub use pipeline::{ResolutionPipeline, ResolutionState};
pub use schema::{validate, EvaluationRecord, Recommendation, ScoringSchema, ValidationReport};
