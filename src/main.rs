//! CV evaluator: structured CV evaluation from free-form model output

use clap::Parser;
use cv_evaluator::cli::{self, Cli, Commands, ConfigAction};
use cv_evaluator::config::{Config, OutputFormat};
use cv_evaluator::error::{CvEvaluatorError, Result};
use cv_evaluator::ground_truth::{calibrate, GroundTruthGenerator, PersonaInput};
use cv_evaluator::input::InputManager;
use cv_evaluator::output::{save_report_to_file, suggest_filename, EvaluationReport, ReportGenerator, ReportMetadata};
use cv_evaluator::pipeline::{BatchRunner, HttpPipeline};
use cv_evaluator::schema::{display_name, validate, EvaluationRecord, Recommendation};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, mut config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Evaluate {
            path,
            output,
            save,
            validate,
            detailed,
            no_conversion,
            concurrency,
        } => {
            let output_format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(CvEvaluatorError::InvalidInput)?,
                None => config.output.format,
            };
            if no_conversion {
                config.pipeline.enable_conversion = false;
            }
            let concurrency = concurrency.unwrap_or(config.pipeline.batch_concurrency);
            let validate = validate || config.output.include_validation;

            info!("Evaluating {}", path.display());

            let mut input_manager = InputManager::new();
            let files = input_manager.discover(&path)?;
            if files.is_empty() {
                return Err(CvEvaluatorError::InvalidInput(format!(
                    "No supported documents (txt, md, pdf) found at {}",
                    path.display()
                )));
            }

            println!("🚀 CV evaluation");
            println!("📂 Documents: {}", files.len());
            println!("🤖 Evaluator model: {}", config.generation.primary.model);
            if config.pipeline.enable_conversion {
                println!("🔁 Converter model: {}", config.generation.secondary.model);
            } else {
                println!("⚠️  Secondary conversion disabled");
            }

            let documents = input_manager.load_all(&files).await;

            let pipeline = Arc::new(HttpPipeline::from_config(&config)?);
            let progress = ProgressBar::new(documents.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            progress.set_message("evaluating");

            let evaluated = BatchRunner::new(pipeline, concurrency)
                .with_validation(validate)
                .with_progress(progress.clone())
                .run(documents)
                .await;
            progress.finish_and_clear();

            let secondary_model = config
                .pipeline
                .enable_conversion
                .then(|| config.generation.secondary.model.clone());
            let metadata = ReportMetadata::new(config.generation.primary.model.clone(), secondary_model, &config.evaluation);
            let report = EvaluationReport::new(metadata, evaluated, &config.evaluation);

            let generator = ReportGenerator::with_options(config.output.color_output, detailed, config.output.pretty, true);
            let rendered = generator.generate_report(&report, output_format)?;

            match save {
                Some(save_path) => {
                    // Saved console output carries no escape codes.
                    let content = if output_format == OutputFormat::Console && config.output.color_output {
                        ReportGenerator::with_options(false, detailed, config.output.pretty, true)
                            .generate_report(&report, output_format)?
                    } else {
                        rendered
                    };
                    let save_path = if save_path.is_dir() {
                        let name = match report.documents.as_slice() {
                            [single] => single.source.as_str(),
                            _ => "batch",
                        };
                        save_path.join(suggest_filename(output_format, name, true))
                    } else {
                        save_path
                    };
                    save_report_to_file(&content, &save_path)?;
                    println!("💾 Saved report to {}", save_path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Validate { file } => {
            cli::validate_file_extension(&file, &["json"])
                .map_err(|e| CvEvaluatorError::InvalidInput(format!("Record file: {}", e)))?;

            let content = tokio::fs::read_to_string(&file).await?;
            let value: Value = serde_json::from_str(&content)?;
            let values = match value {
                Value::Array(items) => items,
                other => vec![other],
            };

            let console = ReportGenerator::with_options(config.output.color_output, false, true, false);
            let mut invalid = 0;
            for (i, value) in values.into_iter().enumerate() {
                let record = EvaluationRecord::from_json_value(value, &config.evaluation)?;
                let report = validate(&record, &config.evaluation);
                if !report.valid {
                    invalid += 1;
                }
                println!("📄 Record {}", i + 1);
                print!("{}", console.console().format_validation(&report));
            }

            if invalid > 0 {
                return Err(CvEvaluatorError::InvalidInput(format!("{} record(s) failed validation", invalid)));
            }
            println!("\n✅ All records valid");
        }

        Commands::GroundTruth {
            quality,
            experience,
            domain,
            count,
            seed,
            json,
        } => {
            let persona = PersonaInput::new(&quality, &experience, &domain);
            let generator = GroundTruthGenerator::new(Arc::new(config.evaluation.clone()));
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            for i in 0..count {
                let truth = generator.generate(&persona, &mut rng);
                if json {
                    let line = serde_json::json!({
                        "persona": &persona,
                        "record": &truth.record,
                        "prose": &truth.prose,
                    });
                    println!("{}", serde_json::to_string(&line)?);
                } else {
                    if count > 1 {
                        println!("── Sample {} ──", i + 1);
                    }
                    println!("{}\n", truth.prose);
                }
            }
        }

        Commands::Calibrate { samples, seed, output } => {
            let output_format = cli::parse_output_format(&output).map_err(CvEvaluatorError::InvalidInput)?;
            info!("Calibrating with {} samples (seed {})", samples, seed);

            let report = calibrate(Arc::new(config.evaluation.clone()), samples, seed).await?;
            let generator = ReportGenerator::with_options(config.output.color_output, false, config.output.pretty, true);
            println!("{}", generator.generate_calibration(&report, output_format)?);
        }

        Commands::Criteria => {
            println!("📋 Evaluation Criteria\n");
            for (i, criterion) in config.evaluation.criteria.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, display_name(&criterion.name), criterion.name);
                println!("     {}", criterion.description);
            }
            println!("\n🏷️  Recommendations (best to worst):");
            for recommendation in Recommendation::ALL {
                println!("  • {}", recommendation);
            }
            let ladder = &config.evaluation.canonical_ladder;
            println!(
                "\n📏 Canonical thresholds: strong_hire ≥{}, hire ≥{}, lean_hire ≥{}, no_hire ≥{}",
                ladder.strong_hire,
                ladder.hire,
                ladder.lean_hire,
                ladder.no_hire.map_or("-".to_string(), |n| n.to_string())
            );
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration\n");
                println!("Config file: {}", config_path.display());
                println!("\nEvaluation:");
                println!("  Criteria: {}", config.evaluation.criteria_count());
                println!("  Default score: {}", config.evaluation.default_score);
                println!("  Direct extraction needs: {} criteria + total", config.evaluation.min_direct_criteria);
                println!("  Total tolerance: ±{}", config.evaluation.total_tolerance);
                println!("\nPipeline:");
                println!("  Primary timeout: {}s", config.pipeline.primary_timeout_secs);
                println!("  Secondary timeout: {}s", config.pipeline.secondary_timeout_secs);
                println!("  Secondary conversion: {}", config.pipeline.enable_conversion);
                println!("  Batch concurrency: {}", config.pipeline.batch_concurrency);
                println!("\nGeneration:");
                println!(
                    "  Primary: {} @ {}",
                    config.generation.primary.model, config.generation.primary.base_url
                );
                println!(
                    "  Secondary: {} @ {}",
                    config.generation.secondary.model, config.generation.secondary.base_url
                );
                println!("  Max retries: {}", config.generation.max_retries);
                println!("\nOutput: {:?}", config.output.format);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save_to(&config_path)?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}
