//! BUILD step: assembles the generation instruction for one attempt.
//!
//! The parts that do not change between attempts (tier rules, serialized
//! inputs, priorities, style constraints) are rendered once in
//! `InstructionBuilder::new`; only the feedback block differs per attempt.

use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::errors::TailorError;
use crate::generation::generator::GenerationError;
use crate::generation::prompts::{
    FEEDBACK_TEMPLATE, GENERATION_FAILURE_TEMPLATE, TRANSFORM_PROMPT_TEMPLATE, TRANSFORM_SYSTEM,
};
use crate::generation::ranking::SectionRanking;
use crate::generation::tone::{detect_tone, guidance_for};
use crate::grounding::tiers::{fields_in, FactTier};
use crate::grounding::violation::ValidationViolation;
use crate::models::resume::SourceDocument;
use crate::models::target::TargetSpec;

/// Everything the generator receives for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationInstruction {
    pub system: String,
    pub prompt: String,
    /// JSON schema the response must conform to.
    pub schema: Value,
}

/// Corrective context carried from the previous attempt into the next BUILD.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    None,
    /// ERROR violations of the previous candidate, already capped.
    Violations {
        attempt: u32,
        violations: Vec<ValidationViolation>,
    },
    /// The previous attempt produced no candidate at all.
    GenerationFailure { attempt: u32, error: GenerationError },
}

impl Feedback {
    /// Keeps at most `cap` ERROR violations from `report`, in report order.
    pub fn from_report(attempt: u32, report: &[ValidationViolation], cap: usize) -> Self {
        let violations: Vec<ValidationViolation> = report
            .iter()
            .filter(|v| v.is_error())
            .take(cap)
            .cloned()
            .collect();
        Feedback::Violations {
            attempt,
            violations,
        }
    }

    fn render(&self) -> String {
        match self {
            Feedback::None => String::new(),
            Feedback::Violations {
                attempt,
                violations,
            } => {
                let lines: Vec<String> = violations
                    .iter()
                    .map(|v| format!("- {}", v.describe()))
                    .collect();
                let attempt = attempt.to_string();
                let violations = lines.join("\n");
                fill_template(
                    FEEDBACK_TEMPLATE,
                    &[("attempt", attempt.as_str()), ("violations", violations.as_str())],
                )
            }
            Feedback::GenerationFailure { attempt, error } => {
                let attempt = attempt.to_string();
                let reason = error.to_string();
                fill_template(
                    GENERATION_FAILURE_TEMPLATE,
                    &[("attempt", attempt.as_str()), ("reason", reason.as_str())],
                )
            }
        }
    }
}

/// Renders the instruction for each attempt of one run.
#[derive(Debug, Clone)]
pub struct InstructionBuilder {
    /// Placeholder values shared by every attempt; `{feedback}` is added in `build`.
    sections: Vec<(&'static str, String)>,
    schema: Value,
}

impl InstructionBuilder {
    pub fn new(
        source: &SourceDocument,
        target: &TargetSpec,
        ranking: &SectionRanking,
        config: &EngineConfig,
    ) -> Result<Self, TailorError> {
        let source_json =
            serde_json::to_string_pretty(source).context("serializing source document")?;
        let target_json =
            serde_json::to_string_pretty(target).context("serializing target posting")?;
        let schema = document_schema();
        let schema_json =
            serde_json::to_string_pretty(&schema).context("serializing document schema")?;
        let style_constraints = guidance_for(detect_tone(target)).render(&config.style.cliches);

        let sections = vec![
            ("tier_rules", render_tier_rules()),
            ("source_json", source_json),
            ("target_json", target_json),
            ("priorities", ranking.render()),
            ("style_constraints", style_constraints),
            ("schema", schema_json),
        ];

        Ok(Self { sections, schema })
    }

    pub fn build(&self, feedback: &Feedback) -> GenerationInstruction {
        let feedback = feedback.render();
        let mut values: Vec<(&str, &str)> = self
            .sections
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        values.push(("feedback", feedback.as_str()));

        GenerationInstruction {
            system: TRANSFORM_SYSTEM.to_string(),
            prompt: fill_template(TRANSFORM_PROMPT_TEMPLATE, &values),
            schema: self.schema.clone(),
        }
    }
}

/// Substitutes `{name}` placeholders in one left-to-right pass. Inserted
/// values are never rescanned, so braces inside user text survive verbatim.
/// Unknown placeholders are left as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Tier rules rendered from the field metadata table, IMMUTABLE first.
pub fn render_tier_rules() -> String {
    let mut out = String::new();
    for tier in [FactTier::Immutable, FactTier::Verifiable, FactTier::Flexible] {
        out.push_str(tier.as_str());
        out.push_str(":\n");
        for spec in fields_in(tier) {
            out.push_str(&format!("- {}.{}: {}\n", spec.section.key(), spec.name, spec.rule));
        }
    }
    out
}

/// JSON schema of a `TransformedDocument`.
pub fn document_schema() -> Value {
    let nullable_string = json!({ "type": ["string", "null"] });
    let string_list = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "required": ["contact", "work_history", "education", "certifications", "skills", "summary"],
        "properties": {
            "contact": {
                "type": "object",
                "required": ["name", "email"],
                "properties": {
                    "name": { "type": "string" },
                    "email": { "type": "string" },
                    "phone": nullable_string,
                    "location": nullable_string
                }
            },
            "work_history": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["company", "title", "start_date", "bullets", "original_bullets"],
                    "properties": {
                        "company": { "type": "string" },
                        "title": { "type": "string" },
                        "start_date": { "type": "string" },
                        "end_date": nullable_string,
                        "location": nullable_string,
                        "bullets": string_list,
                        "original_bullets": string_list
                    }
                }
            },
            "education": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["institution"],
                    "properties": {
                        "institution": { "type": "string" },
                        "degree": nullable_string,
                        "field": nullable_string,
                        "graduation_date": nullable_string
                    }
                }
            },
            "certifications": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string" },
                        "issuer": nullable_string,
                        "date": nullable_string
                    }
                }
            },
            "skills": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "relevance_score", "matched_requirements"],
                    "properties": {
                        "name": { "type": "string" },
                        "relevance_score": { "type": "number", "minimum": 0, "maximum": 1 },
                        "matched_requirements": string_list
                    }
                }
            },
            "summary": nullable_string
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ranking::rank_sections;
    use crate::generation::relevance::KeywordRelevanceScorer;
    use crate::grounding::violation::ViolationRule;
    use crate::models::resume::fixtures::acme_source;

    fn builder() -> InstructionBuilder {
        let source = acme_source();
        let target = TargetSpec {
            title: "Backend Engineer".to_string(),
            requirements: vec!["Python".to_string()],
            ..TargetSpec::default()
        };
        let ranking = rank_sections(&source, &target, &KeywordRelevanceScorer::default());
        InstructionBuilder::new(&source, &target, &ranking, &EngineConfig::default()).unwrap()
    }

    fn mismatch(i: usize) -> ValidationViolation {
        ValidationViolation::error(
            FactTier::Immutable,
            format!("work_history[{i}].company"),
            ViolationRule::FieldMismatch,
            "Immutable field changed",
        )
        .with_values(Some("Acme Corp"), Some("Acme"))
    }

    #[test]
    fn test_instruction_embeds_all_parts() {
        let instruction = builder().build(&Feedback::None);
        assert!(instruction.prompt.contains("IMMUTABLE:\n- contact.name"));
        assert!(instruction.prompt.contains("\"Acme Corp\""));
        assert!(instruction.prompt.contains("Backend Engineer"));
        assert!(instruction.prompt.contains("1. work_history[0] Engineer at Acme Corp"));
        assert!(instruction.prompt.contains("Detected posting tone"));
        assert!(instruction.prompt.contains("\"original_bullets\""));
        assert!(!instruction.prompt.contains("{feedback}"));
        assert!(!instruction.prompt.contains("CORRECTIONS REQUIRED"));
        assert_eq!(instruction.system, TRANSFORM_SYSTEM);
    }

    #[test]
    fn test_feedback_caps_and_keeps_errors_only() {
        let mut report: Vec<ValidationViolation> = (0..8).map(mismatch).collect();
        report.insert(
            0,
            ValidationViolation::warning(
                FactTier::Flexible,
                "work_history[0].bullets[0]",
                ViolationRule::Cliche,
                "Cliché: synergy",
            ),
        );
        let feedback = Feedback::from_report(1, &report, 5);
        let Feedback::Violations { violations, .. } = &feedback else {
            panic!("expected violation feedback");
        };
        assert_eq!(violations.len(), 5);
        assert!(violations.iter().all(|v| v.is_error()));

        let prompt = builder().build(&feedback).prompt;
        assert!(prompt.contains("CORRECTIONS REQUIRED"));
        assert!(prompt.contains("attempt 1"));
        assert!(prompt.contains("work_history[4].company"));
        assert!(!prompt.contains("work_history[5].company"));
        assert!(!prompt.contains("Cliché: synergy"));
        assert!(prompt.contains("must still follow the SOURCE RESUME"));
        assert!(!prompt.contains("unchanged from your previous answer"));
    }

    #[test]
    fn test_generation_failure_feedback() {
        let feedback = Feedback::GenerationFailure {
            attempt: 2,
            error: GenerationError::SchemaViolation("missing contact".into()),
        };
        let prompt = builder().build(&feedback).prompt;
        assert!(prompt.contains("attempt 2"));
        assert!(prompt.contains("missing contact"));
    }

    #[test]
    fn test_placeholders_inside_user_text_are_not_substituted() {
        let mut source = acme_source();
        source.work_history[0].bullets[0] = "Wrote {priorities} and {feedback} docs".to_string();
        let target = TargetSpec {
            title: "Engineer {schema}".to_string(),
            ..TargetSpec::default()
        };
        let ranking = rank_sections(&source, &target, &KeywordRelevanceScorer::default());
        let builder =
            InstructionBuilder::new(&source, &target, &ranking, &EngineConfig::default()).unwrap();
        let feedback = Feedback::from_report(1, &[mismatch(0)], 5);
        let prompt = builder.build(&feedback).prompt;

        assert!(prompt.contains("Wrote {priorities} and {feedback} docs"));
        assert!(prompt.contains("Engineer {schema}"));
        assert_eq!(prompt.matches("CORRECTIONS REQUIRED").count(), 1);
    }

    #[test]
    fn test_fill_template_single_pass() {
        let filled = fill_template("{a}-{b}-{c}", &[("a", "{b}"), ("b", "x")]);
        assert_eq!(filled, "{b}-x-{c}");
    }

    #[test]
    fn test_tier_rules_cover_every_table_row() {
        let rules = render_tier_rules();
        for spec in crate::grounding::tiers::FIELD_TABLE {
            assert!(rules.contains(&format!("{}.{}", spec.section.key(), spec.name)));
        }
        let immutable = rules.find("IMMUTABLE:").unwrap();
        let flexible = rules.find("FLEXIBLE:").unwrap();
        assert!(immutable < flexible);
    }

    #[test]
    fn test_schema_requires_original_bullets() {
        let schema = document_schema();
        let required = &schema["properties"]["work_history"]["items"]["required"];
        assert!(required
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v == "original_bullets"));
    }
}
