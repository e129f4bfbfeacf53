//! Resolution pipeline: direct extraction, secondary conversion, fallback
//! synthesis, plus the batch runner built on top of it.

pub mod batch;
pub mod fallback;
pub mod resolver;

pub use batch::{BatchRunner, EvaluatedDocument, SourceDocument};
pub use fallback::FallbackSynthesizer;
pub use resolver::{HttpPipeline, Resolution, ResolutionPipeline, ResolutionState};
