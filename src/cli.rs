//! CLI interface for the CV evaluator

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cv-evaluator")]
#[command(about = "Structured CV evaluation from free-form model output")]
#[command(long_about = "Evaluate CVs with a prose-generating model, resolve its output into a validated structured record, and calibrate the pipeline against a deterministic ground-truth oracle")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a CV file or every supported CV in a directory
    Evaluate {
        /// Path to a CV (PDF, TXT, MD) or a directory of CVs
        path: PathBuf,

        /// Output format: console, json, markdown (defaults to the configured format)
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to a file, or into a directory under a generated name
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Attach a validation report to every record
        #[arg(long)]
        validate: bool,

        /// Show every criterion instead of the top three
        #[arg(short, long)]
        detailed: bool,

        /// Skip the secondary conversion tier
        #[arg(long)]
        no_conversion: bool,

        /// Documents evaluated concurrently (defaults to the configured value)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Validate evaluation records stored as JSON (an object or an array)
    Validate {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Generate ground-truth (record, prose) pairs for a persona
    GroundTruth {
        /// Quality tier: excellent, good, average, below_average
        #[arg(short, long, default_value = "good")]
        quality: String,

        /// Experience level: entry, mid, senior, executive
        #[arg(short, long, default_value = "mid")]
        experience: String,

        /// Candidate domain, e.g. data_science
        #[arg(short, long, default_value = "data_science")]
        domain: String,

        /// Number of pairs to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Print records as JSON lines instead of prose
        #[arg(long)]
        json: bool,
    },

    /// Run oracle prose through the pipeline and report agreement
    Calibrate {
        /// Number of synthetic samples
        #[arg(short = 'n', long, default_value_t = 20)]
        samples: usize,

        /// Seed for persona sampling and jitter
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output format: console, json, markdown
        #[arg(short, long, default_value = "console")]
        output: String,
    },

    /// List the scoring criteria and recommendation labels
    Criteria,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_evaluate_arguments() {
        let cli = Cli::try_parse_from(["cv-evaluator", "evaluate", "cvs/", "--validate", "-o", "json"]).unwrap();
        match cli.command {
            Commands::Evaluate { path, output, validate, .. } => {
                assert_eq!(path, PathBuf::from("cvs/"));
                assert_eq!(output.as_deref(), Some("json"));
                assert!(validate);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(parse_output_format("MD"), Ok(OutputFormat::Markdown));
        assert!(parse_output_format("html").is_err());
    }

    #[test]
    fn test_extension_check() {
        assert!(validate_file_extension(Path::new("records.JSON"), &["json"]).is_ok());
        assert!(validate_file_extension(Path::new("records"), &["json"]).is_err());
    }
}
