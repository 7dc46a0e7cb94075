use serde::{Deserialize, Serialize};

use crate::grounding::tiers::FactTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
}

/// The rule a violation was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    FieldMismatch,
    HallucinatedEntry,
    DroppedEntry,
    HallucinatedSkill,
    HallucinatedCertification,
    Cliche,
    UniformSentenceLength,
    RepetitiveStructure,
    UnsupportedMetric,
}

/// One finding of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub tier: FactTier,
    /// Dotted path of the offending field, e.g. `work_history[0].company`.
    pub field: String,
    pub rule: ViolationRule,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationViolation {
    pub fn error(tier: FactTier, field: impl Into<String>, rule: ViolationRule, message: impl Into<String>) -> Self {
        Self {
            tier,
            field: field.into(),
            rule,
            message: message.into(),
            severity: Severity::Error,
            expected: None,
            actual: None,
        }
    }

    pub fn warning(tier: FactTier, field: impl Into<String>, rule: ViolationRule, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(tier, field, rule, message)
        }
    }

    pub fn with_values(mut self, expected: Option<&str>, actual: Option<&str>) -> Self {
        self.expected = expected.map(str::to_string);
        self.actual = actual.map(str::to_string);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// One-line rendering used for retry feedback and logs.
    pub fn describe(&self) -> String {
        match (&self.expected, &self.actual) {
            (Some(exp), Some(act)) => format!(
                "[{}] {}: {} (expected \"{}\", got \"{}\")",
                self.tier.as_str(),
                self.field,
                self.message,
                exp,
                act
            ),
            (Some(exp), None) => format!(
                "[{}] {}: {} (expected \"{}\")",
                self.tier.as_str(),
                self.field,
                self.message,
                exp
            ),
            (None, Some(act)) => format!(
                "[{}] {}: {} (got \"{}\", which is not in the source)",
                self.tier.as_str(),
                self.field,
                self.message,
                act
            ),
            (None, None) => format!("[{}] {}: {}", self.tier.as_str(), self.field, self.message),
        }
    }
}

pub fn has_errors(violations: &[ValidationViolation]) -> bool {
    violations.iter().any(ValidationViolation::is_error)
}

pub fn errors(violations: &[ValidationViolation]) -> impl Iterator<Item = &ValidationViolation> {
    violations.iter().filter(|v| v.is_error())
}

pub fn warnings(violations: &[ValidationViolation]) -> impl Iterator<Item = &ValidationViolation> {
    violations.iter().filter(|v| !v.is_error())
}
