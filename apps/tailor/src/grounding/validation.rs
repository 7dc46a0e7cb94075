//! Validation engine: checks a candidate document against the fact baseline.
//!
//! Rules run tier by tier and the report keeps that grouping:
//! 1. IMMUTABLE: index-aligned exact equality, walked from the tier table.
//! 2. VERIFIABLE: every skill and certification name must come from the source.
//! 3. FLEXIBLE: style/anomaly checks; unsupported metrics become ERRORs.
//!
//! Pure and deterministic. An empty report means the candidate passed.

use crate::config::StyleConfig;
use crate::grounding::baseline::{
    CertificationFacts, ContactFacts, EducationFacts, FactBaseline, WorkFacts,
};
use crate::grounding::style::{check_style_against, supported_values, unsupported_metrics};
use crate::grounding::tiers::{fields_of, FactFields, FactTier, Section};
use crate::grounding::violation::{Severity, ValidationViolation, ViolationRule};
use crate::models::resume::SourceDocument;
use crate::models::transformed::TransformedDocument;

/// Validates `candidate` with the default style thresholds.
pub fn validate(
    candidate: &TransformedDocument,
    baseline: &FactBaseline,
    source: &SourceDocument,
) -> Vec<ValidationViolation> {
    validate_with(candidate, baseline, source, &StyleConfig::default())
}

pub fn validate_with(
    candidate: &TransformedDocument,
    baseline: &FactBaseline,
    source: &SourceDocument,
    style: &StyleConfig,
) -> Vec<ValidationViolation> {
    let mut report = check_immutable(candidate, baseline, source);
    report.extend(check_verifiable(candidate, baseline));
    report.extend(check_flexible(candidate, baseline, style));
    report
}

// ────────────────────────────────────────────────────────────────────────────
// IMMUTABLE
// ────────────────────────────────────────────────────────────────────────────

fn check_immutable(
    candidate: &TransformedDocument,
    baseline: &FactBaseline,
    source: &SourceDocument,
) -> Vec<ValidationViolation> {
    let mut out = Vec::new();
    let facts = &baseline.immutable;

    compare_fields(
        &mut out,
        Section::Contact.key(),
        &facts.contact,
        &ContactFacts::from(&candidate.contact),
    );

    let work: Vec<WorkFacts> = candidate.work_history.iter().map(WorkFacts::from).collect();
    compare_records(&mut out, &facts.work_history, &work, |i, w| {
        source
            .work_history
            .get(i)
            .map(|s| format!("{} at {}", s.title, s.company))
            .unwrap_or_else(|| format!("{} at {}", w.title, w.company))
    });

    let education: Vec<EducationFacts> =
        candidate.education.iter().map(EducationFacts::from).collect();
    compare_records(&mut out, &facts.education, &education, |_, e| {
        e.institution.clone()
    });

    let certifications: Vec<CertificationFacts> = candidate
        .certifications
        .iter()
        .map(CertificationFacts::from)
        .collect();
    compare_records(&mut out, &facts.certifications, &certifications, |_, c| {
        c.name.clone()
    });

    out
}

/// Compares every IMMUTABLE field of one record, in table order.
fn compare_fields<T: FactFields>(
    out: &mut Vec<ValidationViolation>,
    path: &str,
    expected: &T,
    actual: &T,
) {
    for spec in fields_of(T::SECTION, FactTier::Immutable) {
        let exp = expected.field(spec.name);
        let act = actual.field(spec.name);
        if exp != act {
            out.push(
                ValidationViolation::error(
                    FactTier::Immutable,
                    format!("{path}.{}", spec.name),
                    ViolationRule::FieldMismatch,
                    format!("Immutable field '{}' was changed", spec.name),
                )
                .with_values(exp, act),
            );
        }
    }
}

/// Index-aligned comparison of two record lists. Extra candidate records are
/// hallucinated entries, missing ones are dropped entries.
fn compare_records<T: FactFields>(
    out: &mut Vec<ValidationViolation>,
    expected: &[T],
    actual: &[T],
    label: impl Fn(usize, &T) -> String,
) {
    let section = T::SECTION.key();
    for i in 0..expected.len().max(actual.len()) {
        let path = format!("{section}[{i}]");
        match (expected.get(i), actual.get(i)) {
            (Some(exp), Some(act)) => compare_fields(out, &path, exp, act),
            (None, Some(act)) => out.push(
                ValidationViolation::error(
                    FactTier::Immutable,
                    path,
                    ViolationRule::HallucinatedEntry,
                    format!("Hallucinated entry: {}", label(i, act)),
                )
                .with_values(None, Some(&label(i, act))),
            ),
            (Some(exp), None) => out.push(
                ValidationViolation::error(
                    FactTier::Immutable,
                    path,
                    ViolationRule::DroppedEntry,
                    format!("Dropped entry: {}", label(i, exp)),
                )
                .with_values(Some(&label(i, exp)), None),
            ),
            (None, None) => {}
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// VERIFIABLE
// ────────────────────────────────────────────────────────────────────────────

fn check_verifiable(
    candidate: &TransformedDocument,
    baseline: &FactBaseline,
) -> Vec<ValidationViolation> {
    let mut out = Vec::new();

    for (i, skill) in candidate.skills.iter().enumerate() {
        if !baseline.verifiable.has_skill(&skill.name) {
            out.push(
                ValidationViolation::error(
                    FactTier::Verifiable,
                    format!("skills[{i}]"),
                    ViolationRule::HallucinatedSkill,
                    format!("Hallucinated skill: {}", skill.name),
                )
                .with_values(None, Some(&skill.name)),
            );
        }
    }

    for (i, cert) in candidate.certifications.iter().enumerate() {
        if !baseline.verifiable.has_certification(&cert.name) {
            out.push(
                ValidationViolation::error(
                    FactTier::Verifiable,
                    format!("certifications[{i}].name"),
                    ViolationRule::HallucinatedCertification,
                    format!("Hallucinated certification: {}", cert.name),
                )
                .with_values(None, Some(&cert.name)),
            );
        }
    }

    out
}

// ────────────────────────────────────────────────────────────────────────────
// FLEXIBLE
// ────────────────────────────────────────────────────────────────────────────

fn check_flexible(
    candidate: &TransformedDocument,
    baseline: &FactBaseline,
    style: &StyleConfig,
) -> Vec<ValidationViolation> {
    // Source bullets are authoritative; the candidate's echo only covers
    // entries the source does not have.
    let originals: Vec<&[String]> = candidate
        .work_history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            baseline
                .flexible
                .bullets_for(i)
                .unwrap_or(entry.original_bullets.as_slice())
        })
        .collect();

    let mut out = check_style_against(candidate, style, &originals);

    if let Some(summary) = candidate.summary.as_deref() {
        let supported = supported_values(baseline.flexible.all());
        out.extend(unsupported_metrics(
            Section::Summary.key(),
            summary,
            &supported,
        ));
    }

    out.into_iter().map(escalate).collect()
}

fn escalate(mut violation: ValidationViolation) -> ValidationViolation {
    if violation.rule == ViolationRule::UnsupportedMetric {
        violation.severity = Severity::Error;
    }
    violation
}
