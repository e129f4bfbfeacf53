//! Output formatters: colored console, JSON and Markdown

use crate::config::OutputFormat;
use crate::error::Result;
use crate::ground_truth::CalibrationReport;
use crate::output::report::{BatchSummary, EvaluationReport};
use crate::pipeline::EvaluatedDocument;
use crate::schema::{display_name, Recommendation, ValidationReport};
use colored::{Color, Colorize};
use std::path::Path;

pub trait OutputFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String>;
    fn format_calibration(&self, report: &CalibrationReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Dispatches to the formatter for the requested format.
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

const BAR_WIDTH: usize = 10;

fn score_bar(score: i64) -> String {
    let filled = score.clamp(0, BAR_WIDTH as i64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn recommendation_label(recommendation: Option<Recommendation>) -> String {
    recommendation
        .map(|r| r.as_str().replace('_', " ").to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_recommendation_badge(&self, recommendation: Option<Recommendation>) -> String {
        let color = match recommendation {
            Some(Recommendation::StrongHire) => Color::Green,
            Some(Recommendation::Hire) => Color::BrightGreen,
            Some(Recommendation::LeanHire) => Color::Yellow,
            Some(Recommendation::NoHire) => Color::Red,
            Some(Recommendation::StrongNoHire) => Color::BrightRed,
            None => Color::White,
        };

        let label = recommendation_label(recommendation);
        if self.use_colors {
            format!("[{}]", label.color(color).bold())
        } else {
            format!("[{}]", label)
        }
    }

    fn format_document(&self, doc: &EvaluatedDocument) -> String {
        let mut output = String::new();
        let record = &doc.record;

        output.push_str(&self.format_header(&format!("📋 {}", doc.source), 2));

        if let Some(message) = record.error() {
            output.push_str(&format!("{} {}\n", self.colorize("❌ Evaluation failed:", Color::Red), message));
            if let Some(ms) = record.processing_time_ms() {
                output.push_str(&format!("Processing time: {}ms\n", ms));
            }
            return output;
        }

        let total = record
            .total_score()
            .map_or("?".to_string(), |t| t.to_string());
        output.push_str(&format!(
            "Total Score: {}/100 {}\n",
            total,
            self.format_recommendation_badge(record.recommendation())
        ));
        output.push_str(&format!(
            "Method: {} | Processing time: {}ms\n",
            record
                .pipeline_method()
                .map_or("unknown".to_string(), |m| m.to_string()),
            record.processing_time_ms().unwrap_or(0)
        ));

        if self.detailed {
            output.push_str(&self.format_header("Criteria", 3));
            for (name, value) in record.criteria().iter() {
                let line = match record.score(name) {
                    Some(score) => format!("  {:<24} {:>2}/10 {}\n", display_name(name), score, score_bar(score)),
                    None => format!("  {:<24} {}\n", display_name(name), value),
                };
                output.push_str(&line);
            }
        } else {
            // Top three criteria only.
            let mut scored: Vec<(&str, i64)> = record
                .criteria()
                .iter()
                .filter_map(|(name, _)| record.score(name).map(|s| (name, s)))
                .collect();
            scored.sort_by(|a, b| b.1.cmp(&a.1));
            if !scored.is_empty() {
                output.push_str(&self.format_header("Top Criteria", 3));
                for (name, score) in scored.iter().take(3) {
                    output.push_str(&format!("  • {}: {}/10\n", display_name(name), score));
                }
            }
        }

        let strengths = record.key_strengths();
        if !strengths.is_empty() {
            output.push_str(&self.format_header("✅ Key Strengths", 3));
            for strength in &strengths {
                output.push_str(&format!("  • {}\n", self.colorize(strength, Color::Green)));
            }
        }

        let improvements = record.areas_for_improvement();
        if !improvements.is_empty() {
            output.push_str(&self.format_header("📈 Areas for Improvement", 3));
            for improvement in &improvements {
                output.push_str(&format!("  • {}\n", self.colorize(improvement, Color::Yellow)));
            }
        }

        if let Some(validation) = &doc.validation {
            output.push_str(&self.format_validation(validation));
        }

        output
    }

    pub fn format_validation(&self, validation: &ValidationReport) -> String {
        let mut output = self.format_header("Validation", 3);
        if validation.valid {
            output.push_str(&format!("  {}\n", self.colorize("✅ Valid", Color::Green)));
        } else {
            output.push_str(&format!("  {}\n", self.colorize("❌ Invalid", Color::Red)));
        }
        output.push_str(&format!("  Criteria coverage: {}\n", percent(validation.criteria_coverage)));
        for error in &validation.errors {
            output.push_str(&format!("  {} {}\n", self.colorize("error:", Color::Red), error));
        }
        for warning in &validation.warnings {
            output.push_str(&format!("  {} {}\n", self.colorize("warning:", Color::Yellow), warning));
        }
        output
    }

    fn format_summary(&self, summary: &BatchSummary) -> String {
        let mut output = self.format_header("📊 Batch Summary", 2);
        output.push_str(&format!(
            "Success Rate: {} ({}/{})\n",
            percent(summary.success_rate),
            summary.successful,
            summary.total_documents
        ));
        if let Some(passed) = summary.validation_passed {
            output.push_str(&format!("Validation Passed: {}/{}\n", passed, summary.total_documents));
        }
        output.push_str(&format!(
            "Average Criteria Coverage: {}\n",
            percent(summary.average_criteria_coverage)
        ));
        output.push_str(&format!(
            "Average Processing Time: {:.0}ms\n",
            summary.average_processing_time_ms
        ));
        if !summary.method_distribution.is_empty() {
            output.push_str("\nMethod Distribution:\n");
            for (method, count) in &summary.method_distribution {
                output.push_str(&format!(
                    "  {}: {} ({})\n",
                    method,
                    count,
                    percent(*count as f64 / summary.successful.max(1) as f64)
                ));
            }
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("🧾 CV EVALUATION", 1));
        output.push_str(&format!(
            "Generated: {} | Model: {}\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.primary_model
        ));

        for doc in &report.documents {
            output.push_str(&self.format_document(doc));
        }

        if !report.is_single() {
            output.push_str(&self.format_summary(&report.summary));
        }

        Ok(output)
    }

    fn format_calibration(&self, report: &CalibrationReport) -> Result<String> {
        let mut output = self.format_header("🎯 CALIBRATION", 1);
        output.push_str(&format!("Samples: {} (seed {})\n", report.samples, report.seed));
        output.push_str(&format!("Criteria accuracy: {}\n", percent(report.criteria_accuracy)));
        output.push_str(&format!("Total accuracy: {}\n", percent(report.total_accuracy)));
        output.push_str(&format!(
            "Recommendation accuracy: {}\n",
            percent(report.recommendation_accuracy)
        ));

        output.push_str(&self.format_header("Method Distribution", 3));
        for (method, count) in &report.method_distribution {
            output.push_str(&format!("  {}: {}\n", method, count));
        }

        if report.is_perfect() {
            output.push_str(&format!("\n{}\n", self.colorize("✅ Every sample round-tripped exactly", Color::Green)));
        } else {
            output.push_str(&self.format_header("⚠️  Mismatches", 3));
            let shown = if self.detailed { report.mismatches.len() } else { 10 };
            for m in report.mismatches.iter().take(shown) {
                output.push_str(&format!(
                    "  #{} {}: expected {}, got {}\n",
                    m.sample, m.field, m.expected, m.actual
                ));
            }
            if report.mismatches.len() > shown {
                output.push_str(&format!("  ... and {} more\n", report.mismatches.len() - shown));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    /// A single document is emitted as its flat record; batches as the
    /// full report with summary.
    fn format_report(&self, report: &EvaluationReport) -> Result<String> {
        match report.documents.as_slice() {
            [single] => self.to_json(single),
            _ => self.to_json(report),
        }
    }

    fn format_calibration(&self, report: &CalibrationReport) -> Result<String> {
        self.to_json(report)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn format_document(doc: &EvaluatedDocument) -> String {
        let mut output = String::new();
        let record = &doc.record;
        let name = Path::new(&doc.source)
            .file_name()
            .map_or(doc.source.clone(), |n| n.to_string_lossy().to_string());

        output.push_str(&format!("## {}\n\n", name));

        if let Some(message) = record.error() {
            output.push_str(&format!("**Evaluation failed:** {}\n\n", message));
            return output;
        }

        output.push_str(&format!(
            "**Total Score:** {}/100 | **Recommendation:** {} | **Method:** `{}`\n\n",
            record.total_score().map_or("?".to_string(), |t| t.to_string()),
            recommendation_label(record.recommendation()),
            record
                .pipeline_method()
                .map_or("unknown".to_string(), |m| m.to_string())
        ));

        output.push_str("| Criterion | Score |\n");
        output.push_str("|-----------|-------|\n");
        for (criterion, value) in record.criteria().iter() {
            let score = record
                .score(criterion)
                .map_or(value.to_string(), |s| format!("{}/10", s));
            output.push_str(&format!("| {} | {} |\n", display_name(criterion), score));
        }
        output.push('\n');

        let strengths = record.key_strengths();
        if !strengths.is_empty() {
            output.push_str("### Key Strengths\n\n");
            for strength in &strengths {
                output.push_str(&format!("- {}\n", strength));
            }
            output.push('\n');
        }

        let improvements = record.areas_for_improvement();
        if !improvements.is_empty() {
            output.push_str("### Areas for Improvement\n\n");
            for improvement in &improvements {
                output.push_str(&format!("- {}\n", improvement));
            }
            output.push('\n');
        }

        if let Some(validation) = &doc.validation {
            output.push_str(&format!(
                "### Validation\n\n**Valid:** {} | **Coverage:** {}\n\n",
                if validation.valid { "yes" } else { "no" },
                percent(validation.criteria_coverage)
            ));
            for error in &validation.errors {
                output.push_str(&format!("- ❌ {}\n", error));
            }
            for warning in &validation.warnings {
                output.push_str(&format!("- ⚠️ {}\n", warning));
            }
            if !validation.errors.is_empty() || !validation.warnings.is_empty() {
                output.push('\n');
            }
        }

        output
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# CV Evaluation Report\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Model:** `{}` | **Criteria:** {}\n\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.primary_model,
                report.metadata.criteria_count
            ));
        }

        for doc in &report.documents {
            output.push_str(&Self::format_document(doc));
        }

        if !report.is_single() {
            let summary = &report.summary;
            output.push_str("## Summary\n\n");
            output.push_str("| Metric | Value |\n");
            output.push_str("|--------|-------|\n");
            output.push_str(&format!(
                "| Success rate | {} ({}/{}) |\n",
                percent(summary.success_rate),
                summary.successful,
                summary.total_documents
            ));
            if let Some(passed) = summary.validation_passed {
                output.push_str(&format!("| Validation passed | {}/{} |\n", passed, summary.total_documents));
            }
            output.push_str(&format!(
                "| Average criteria coverage | {} |\n",
                percent(summary.average_criteria_coverage)
            ));
            output.push_str(&format!(
                "| Average processing time | {:.0}ms |\n",
                summary.average_processing_time_ms
            ));
            for (method, count) in &summary.method_distribution {
                output.push_str(&format!("| `{}` | {} |\n", method, count));
            }
            output.push('\n');
        }

        Ok(output)
    }

    fn format_calibration(&self, report: &CalibrationReport) -> Result<String> {
        let mut output = String::from("# Calibration Report\n\n");
        output.push_str(&format!("**Samples:** {} | **Seed:** {}\n\n", report.samples, report.seed));
        output.push_str("| Field | Accuracy |\n");
        output.push_str("|-------|----------|\n");
        output.push_str(&format!("| Criteria | {} |\n", percent(report.criteria_accuracy)));
        output.push_str(&format!("| Total score | {} |\n", percent(report.total_accuracy)));
        output.push_str(&format!("| Recommendation | {} |\n\n", percent(report.recommendation_accuracy)));

        if !report.mismatches.is_empty() {
            output.push_str("## Mismatches\n\n");
            for m in &report.mismatches {
                output.push_str(&format!(
                    "- sample {} `{}`: expected {}, got {}\n",
                    m.sample, m.field, m.expected, m.actual
                ));
            }
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        }
    }

    pub fn generate_report(&self, report: &EvaluationReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_report(report)
    }

    pub fn generate_calibration(&self, report: &CalibrationReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_calibration(report)
    }

    pub fn console(&self) -> &ConsoleFormatter {
        &self.console_formatter
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: OutputFormat, source_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(source_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_evaluation{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_evaluation{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_evaluation{}.md", base_name, timestamp_suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::report::ReportMetadata;
    use crate::schema::{validate, EvaluationRecord, PipelineMethod, ScoringSchema};

    fn report(records: Vec<EvaluationRecord>) -> EvaluationReport {
        let schema = ScoringSchema::default();
        let documents = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| EvaluatedDocument {
                source: format!("cvs/cv_{}.txt", i),
                validation: Some(validate(&record, &schema)),
                record,
            })
            .collect();
        EvaluationReport::new(ReportMetadata::new("evaluator", None, &schema), documents, &schema)
    }

    fn record() -> EvaluationRecord {
        EvaluationRecord::new()
            .with_score("technical_skills", 8)
            .with_score("cultural_fit", 6)
            .with_total(75)
            .with_recommendation(Recommendation::Hire)
            .with_strengths(vec!["Deep Rust experience".to_string()])
            .with_improvements(vec!["Public speaking".to_string()])
            .with_processing_time(42)
            .with_method(PipelineMethod::PartialExtraction)
    }

    #[test]
    fn test_console_without_colors() {
        let output = ConsoleFormatter::new(false, true)
            .format_report(&report(vec![record()]))
            .unwrap();
        assert!(output.contains("Total Score: 75/100 [HIRE]"));
        assert!(output.contains("Technical Skills"));
        assert!(output.contains("████████░░"));
        assert!(output.contains("• Deep Rust experience"));
        assert!(!output.contains("Batch Summary"));
    }

    #[test]
    fn test_console_batch_has_summary_and_errors() {
        let output = ConsoleFormatter::new(false, false)
            .format_report(&report(vec![record(), EvaluationRecord::error_record("Pipeline failed: x", 3)]))
            .unwrap();
        assert!(output.contains("❌ Evaluation failed: Pipeline failed: x"));
        assert!(output.contains("Success Rate: 50.0% (1/2)"));
        assert!(output.contains("partial_extraction: 1 (100.0%)"));
    }

    #[test]
    fn test_json_single_document_is_flat() {
        let output = JsonFormatter::new(false).format_report(&report(vec![record()])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["technical_skills"], 8);
        assert_eq!(value["source"], "cvs/cv_0.txt");
        assert_eq!(value["pipeline_method"], "partial_extraction");
        assert_eq!(value["validation"]["format_valid"], false);
        assert_eq!(value["validation"]["criteria_coverage"], 0.2);
    }

    #[test]
    fn test_json_batch_has_summary() {
        let output = JsonFormatter::new(true)
            .format_report(&report(vec![record(), record()]))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["total_documents"], 2);
        assert_eq!(value["documents"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_markdown_table() {
        let output = MarkdownFormatter::new(false).format_report(&report(vec![record()])).unwrap();
        assert!(output.starts_with("# CV Evaluation Report\n\n## cv_0.txt"));
        assert!(output.contains("| Technical Skills | 8/10 |"));
        assert!(output.contains("**Recommendation:** HIRE"));
    }

    #[test]
    fn test_suggest_filename() {
        assert_eq!(
            suggest_filename(OutputFormat::Markdown, "cvs/jane_doe.pdf", false),
            "jane_doe_evaluation.md"
        );
    }
}
