//! Integration tests for document loading, reporting and calibration

use cv_evaluator::config::OutputFormat;
use cv_evaluator::ground_truth::calibrate;
use cv_evaluator::input::InputManager;
use cv_evaluator::llm::StaticGenerator;
use cv_evaluator::output::{EvaluationReport, ReportGenerator, ReportMetadata};
use cv_evaluator::pipeline::{BatchRunner, ResolutionPipeline};
use cv_evaluator::schema::ScoringSchema;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_cv.txt");

    let result = manager.extract_text(path).await;
    assert!(result.is_ok());

    let text = result.unwrap();
    assert!(text.contains("Jane Smith"));
    assert!(text.contains("Senior Data Scientist"));
    assert!(text.contains("PyTorch"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_cv.md");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("Jane Smith"));
    assert!(text.contains("Senior Data Scientist"));
    assert!(text.contains("gradient boosted"));
    // Should not contain markdown formatting
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_cv.txt");

    let text1 = manager.extract_text(path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);

    let text2 = manager.extract_text(path).await.unwrap();
    assert_eq!(text1, text2);
    assert_eq!(manager.cache_size(), 1);

    manager.clear_cache();
    assert_eq!(manager.cache_size(), 0);
}

#[test]
fn test_discover_fixture_directory() {
    let manager = InputManager::new();
    let files = manager.discover(Path::new("tests/fixtures")).unwrap();

    assert_eq!(
        files,
        vec![
            PathBuf::from("tests/fixtures/sample_cv.md"),
            PathBuf::from("tests/fixtures/sample_cv.txt"),
        ]
    );
}

#[tokio::test]
async fn test_load_all_carries_failures_per_document() {
    let mut manager = InputManager::new();
    let paths = vec![
        PathBuf::from("tests/fixtures/sample_cv.txt"),
        PathBuf::from("tests/fixtures/no_such_cv.txt"),
    ];

    let documents = manager.load_all(&paths).await;
    assert_eq!(documents.len(), 2);
    assert!(documents[0].content.is_ok());
    assert!(documents[1].content.is_err());
}

#[tokio::test]
async fn test_fixture_batch_report_renders_in_every_format() {
    let schema = Arc::new(ScoringSchema::default());
    let prose = "Technical Skills: 8/10\nExperience Relevance: 8/10\nEducation Quality: 7/10\n\
                 Leadership Potential: 7/10\nCommunication Skills: 6/10\nProblem Solving: 8/10\n\
                 Total Score: 74\nRecommendation: hire";
    let pipeline = Arc::new(
        ResolutionPipeline::new(StaticGenerator::new(prose), None::<StaticGenerator>, schema.clone(), 500).unwrap(),
    );

    let mut manager = InputManager::new();
    let files = manager.discover(Path::new("tests/fixtures")).unwrap();
    let documents = manager.load_all(&files).await;
    let evaluated = BatchRunner::new(pipeline, 2).with_validation(true).run(documents).await;

    let metadata = ReportMetadata::new("test-evaluator", None, &schema);
    let report = EvaluationReport::new(metadata, evaluated, &schema);
    assert_eq!(report.summary.total_documents, 2);
    assert_eq!(report.summary.successful, 2);
    assert_eq!(report.summary.method_distribution.get("direct_extraction"), Some(&2));

    let generator = ReportGenerator::with_options(false, true, true, true);

    let console = generator.generate_report(&report, OutputFormat::Console).unwrap();
    assert!(console.contains("sample_cv.txt"));
    assert!(console.contains("HIRE"));

    let json = generator.generate_report(&report, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["documents"].as_array().unwrap().len(), 2);
    assert_eq!(value["documents"][0]["total_score"], 74);

    let markdown = generator.generate_report(&report, OutputFormat::Markdown).unwrap();
    assert!(markdown.contains("sample_cv.md"));
}

#[tokio::test]
async fn test_calibration_report_renders() {
    let schema = Arc::new(ScoringSchema::default());
    let report = calibrate(schema, 5, 7).await.unwrap();
    assert_eq!(report.samples, 5);
    assert!(report.is_perfect());

    let generator = ReportGenerator::with_options(false, false, true, true);
    let json = generator.generate_calibration(&report, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["samples"], 5);
}
