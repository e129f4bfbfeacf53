//! Prompt templates for the evaluation and conversion collaborators

use crate::schema::{display_name, Recommendation, ScoringSchema};

/// Characters the conversion prompt strips from prose so the model is not
/// primed with half-formed JSON.
const STRIPPED_CHARS: [char; 3] = ['{', '}', '"'];

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub evaluator_system: String,
    pub conversion_system: String,
    /// Longest prose excerpt (in characters) handed to the converter.
    pub conversion_prose_limit: usize,
}

impl PromptTemplates {
    pub fn new(schema: &ScoringSchema, conversion_prose_limit: usize) -> Self {
        Self {
            evaluator_system: render_evaluator_system(schema),
            conversion_system: CONVERSION_SYSTEM_PROMPT.to_string(),
            conversion_prose_limit,
        }
    }

    pub fn render_evaluation(&self, document: &str) -> String {
        format!("{}\n\nEvaluate this CV:\n\n{}", self.evaluator_system, document)
    }

    pub fn render_conversion(&self, prose: &str) -> String {
        let cleaned: String = prose
            .chars()
            .filter(|c| !STRIPPED_CHARS.contains(c))
            .take(self.conversion_prose_limit)
            .collect();
        CONVERSION_TEMPLATE
            .replace("{system}", &self.conversion_system)
            .replace("{evaluation}", &cleaned)
    }
}

fn render_evaluator_system(schema: &ScoringSchema) -> String {
    let criteria = schema
        .criteria
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} (score 1-10): {}", i + 1, display_name(&c.name), c.description))
        .collect::<Vec<_>>()
        .join("\n");
    let labels = Recommendation::ALL
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    EVALUATOR_TEMPLATE
        .replace("{criteria}", &criteria)
        .replace("{labels}", &labels)
}

const EVALUATOR_TEMPLATE: &str = r#"You are a professional CV evaluator with years of hiring experience.
Analyze the CV and provide a structured evaluation in clear prose covering ALL of these criteria:

{criteria}

Format your response as:
- Start each criterion with its name followed by ": X/10" where X is the score
- After all scores, state "Total Score: Y" where Y is the sum
- Then state "Recommendation: [recommendation]" using one of: {labels}
- List "Key Strengths:" followed by 2-3 specific strengths
- List "Areas for Improvement:" followed by 1-2 areas
- Be specific and detailed in your evaluation"#;

const CONVERSION_SYSTEM_PROMPT: &str = "Convert the CV evaluation prose into a JSON object.
Extract all scores (1-10), total score, recommendation, strengths, and improvements.
Output ONLY valid JSON, no explanations.";

const CONVERSION_TEMPLATE: &str = r#"{system}

Example:
Evaluation: Technical Skills: 8/10. Experience Relevance: 7/10. Total Score: 75. Recommendation: hire
JSON: {"technical_skills": 8, "experience_relevance": 7, "total_score": 75, "recommendation": "hire"}

Now convert:
Evaluation: {evaluation}
JSON:"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> PromptTemplates {
        PromptTemplates::new(&ScoringSchema::default(), 500)
    }

    #[test]
    fn test_evaluator_prompt_lists_every_criterion() {
        let templates = templates();
        assert!(templates.evaluator_system.contains("1. Technical Skills (score 1-10)"));
        assert!(templates.evaluator_system.contains("10. Overall Impression (score 1-10)"));
        assert!(templates.evaluator_system.contains("strong_hire, hire, lean_hire, no_hire, strong_no_hire"));
    }

    #[test]
    fn test_evaluation_prompt_embeds_document() {
        let prompt = templates().render_evaluation("Jane Doe, Rust engineer");
        assert!(prompt.ends_with("Evaluate this CV:\n\nJane Doe, Rust engineer"));
    }

    #[test]
    fn test_conversion_prompt_strips_braces_and_truncates() {
        let templates = PromptTemplates::new(&ScoringSchema::default(), 20);
        let prompt = templates.render_conversion(r#"{"Technical Skills": 8/10} and a lot more text"#);
        assert!(prompt.contains("Evaluation: Technical Skills: 8/\nJSON:"));
        assert!(prompt.trim_end().ends_with("JSON:"));
    }
}
