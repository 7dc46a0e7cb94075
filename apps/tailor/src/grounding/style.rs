//! Style and anomaly checks for freely rewritable prose.
//!
//! Everything here is reported as WARNING. The validation engine escalates
//! `UnsupportedMetric` findings to ERROR: an invented number is a factual
//! problem, not a stylistic one.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::StyleConfig;
use crate::grounding::tiers::FactTier;
use crate::grounding::violation::{ValidationViolation, ViolationRule};
use crate::models::transformed::TransformedDocument;

/// Default cliché stoplist. Matched case-insensitively on word boundaries.
pub const DEFAULT_CLICHES: &[&str] = &[
    "leverage",
    "leveraged",
    "leveraging",
    "synergy",
    "synergies",
    "passionate about",
    "spearheaded",
    "results-driven",
    "go-getter",
    "think outside the box",
    "best-in-class",
    "rockstar",
    "ninja",
    "thought leader",
    "proven track record",
    "detail-oriented",
];

/// Digit-based numeric claims: optional currency prefix, the number, optional unit suffix.
/// `\b` before the digits keeps identifiers such as `S3` or `EC2` out.
/// Commas only count between three-digit groups, so "2021," stays "2021".
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<cur>[$€£])?\s?\b(?P<num>(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)(?P<suffix>\s?(?:%|percent\b|pct\b|x\b|k\b|m\b|mm\b|bn\b|b\b|million\b|billion\b|thousand\b))?",
    )
    .expect("numeric claim pattern is valid")
});

/// Spelled-out numbers, accepted as support for a digit claim ("five" backs "5").
static WORD_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty|dozen)\b",
    )
    .expect("word number pattern is valid")
});

/// "team of five" style claims written out in words.
static TEAM_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bteam\s+of\s+(one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty|dozen)\b",
    )
    .expect("team size pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    Percentage,
    Currency,
    Multiplier,
    TeamSize,
    Count,
}

impl ClaimKind {
    fn label(&self) -> &'static str {
        match self {
            ClaimKind::Percentage => "percentage",
            ClaimKind::Currency => "currency amount",
            ClaimKind::Multiplier => "multiplier",
            ClaimKind::TeamSize => "team size",
            ClaimKind::Count => "figure",
        }
    }
}

/// A number asserted by a piece of prose.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericClaim {
    /// The matched text, as written.
    pub text: String,
    /// Canonical numeric value used for comparison ("1,200" and "1200" agree).
    pub value: String,
    pub kind: ClaimKind,
}

/// Extracts the numeric claims made by `text`. Bare four-digit years are
/// dates, not claims, and are skipped.
pub fn numeric_claims(text: &str) -> Vec<NumericClaim> {
    let mut claims = Vec::new();

    for caps in NUMBER_RE.captures_iter(text) {
        let Some(num) = caps.name("num") else {
            continue;
        };
        let Some(value) = canonical_number(num.as_str()) else {
            continue;
        };
        let suffix = caps
            .name("suffix")
            .map(|m| m.as_str().trim().to_lowercase())
            .unwrap_or_default();

        let kind = if caps.name("cur").is_some() {
            ClaimKind::Currency
        } else if suffix == "%" || suffix == "percent" || suffix == "pct" {
            ClaimKind::Percentage
        } else if suffix == "x" {
            ClaimKind::Multiplier
        } else if preceded_by_team_of(text, num.start()) {
            ClaimKind::TeamSize
        } else {
            ClaimKind::Count
        };

        if kind == ClaimKind::Count && suffix.is_empty() && is_year(num.as_str()) {
            continue;
        }

        let whole = caps.get(0).map(|m| m.as_str().trim()).unwrap_or(num.as_str());
        claims.push(NumericClaim {
            text: whole.to_string(),
            value,
            kind,
        });
    }

    for caps in TEAM_WORD_RE.captures_iter(text) {
        if let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) {
            if let Some(value) = word_number(word.as_str()) {
                claims.push(NumericClaim {
                    text: whole.as_str().to_string(),
                    value: value.to_string(),
                    kind: ClaimKind::TeamSize,
                });
            }
        }
    }

    claims
}

/// Every numeric value mentioned anywhere in `texts`, digits or words.
pub fn supported_values<'a>(texts: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let mut values = BTreeSet::new();
    for text in texts {
        for caps in NUMBER_RE.captures_iter(text) {
            if let Some(value) = caps.name("num").and_then(|m| canonical_number(m.as_str())) {
                values.insert(value);
            }
        }
        for m in WORD_NUMBER_RE.find_iter(text) {
            if let Some(value) = word_number(m.as_str()) {
                values.insert(value.to_string());
            }
        }
    }
    values
}

/// Flags claims in `text` whose value is absent from `supported`.
pub fn unsupported_metrics(
    field: &str,
    text: &str,
    supported: &BTreeSet<String>,
) -> Vec<ValidationViolation> {
    numeric_claims(text)
        .into_iter()
        .filter(|claim| !supported.contains(&claim.value))
        .map(|claim| {
            ValidationViolation::warning(
                FactTier::Flexible,
                field,
                ViolationRule::UnsupportedMetric,
                format!(
                    "Unsupported metric: {} '{}' does not appear in the original text",
                    claim.kind.label(),
                    claim.text
                ),
            )
            .with_values(None, Some(&claim.text))
        })
        .collect()
}

/// Runs the style checks on every work-history entry, comparing numeric
/// claims against each entry's echoed `original_bullets`.
pub fn check_style(doc: &TransformedDocument, config: &StyleConfig) -> Vec<ValidationViolation> {
    let originals: Vec<&[String]> = doc
        .work_history
        .iter()
        .map(|e| e.original_bullets.as_slice())
        .collect();
    check_style_against(doc, config, &originals)
}

/// Same as `check_style`, with the comparison text for entry `i` taken from
/// `originals[i]` (an empty slice when the index is out of range).
pub fn check_style_against(
    doc: &TransformedDocument,
    config: &StyleConfig,
    originals: &[&[String]],
) -> Vec<ValidationViolation> {
    let mut violations = Vec::new();

    for (i, entry) in doc.work_history.iter().enumerate() {
        let entry_field = format!("work_history[{i}].bullets");
        let source = originals.get(i).copied().unwrap_or(&[]);
        let supported = supported_values(source.iter().map(String::as_str));

        for (j, bullet) in entry.bullets.iter().enumerate() {
            let field = format!("{entry_field}[{j}]");

            let found = cliches_in(bullet, &config.cliches);
            if !found.is_empty() {
                violations.push(ValidationViolation::warning(
                    FactTier::Flexible,
                    field.as_str(),
                    ViolationRule::Cliche,
                    format!("Cliché phrasing: {}", found.join(", ")),
                ));
            }

            violations.extend(unsupported_metrics(&field, bullet, &supported));
        }

        if entry.bullets.len() >= config.min_bullets_for_pattern_checks.max(2) {
            let counts: Vec<usize> = entry
                .bullets
                .iter()
                .map(|b| b.split_whitespace().count())
                .collect();
            let variance = population_variance(&counts);
            if variance < config.word_count_variance_threshold {
                violations.push(ValidationViolation::warning(
                    FactTier::Flexible,
                    entry_field.as_str(),
                    ViolationRule::UniformSentenceLength,
                    format!(
                        "All {} bullets have near-identical length (word-count variance {variance:.2})",
                        counts.len()
                    ),
                ));
            }

            if let Some(lead) = shared_leading_word(&entry.bullets) {
                violations.push(ValidationViolation::warning(
                    FactTier::Flexible,
                    entry_field.as_str(),
                    ViolationRule::RepetitiveStructure,
                    format!("All bullets start with '{lead}'"),
                ));
            }
        }
    }

    violations
}

/// Stoplist phrases present in `text`, compared word-by-word so that
/// "leverage" does not fire on "leverages" unless listed.
fn cliches_in(text: &str, stoplist: &[String]) -> Vec<String> {
    let words = words_of(text);
    stoplist
        .iter()
        .filter(|phrase| {
            let needle = words_of(phrase);
            !needle.is_empty() && words.windows(needle.len()).any(|w| w == needle.as_slice())
        })
        .cloned()
        .collect()
}

fn words_of(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn shared_leading_word(bullets: &[String]) -> Option<String> {
    let mut leads = bullets.iter().map(|b| words_of(b).into_iter().next());
    let first = leads.next()??;
    let shared = leads.all(|lead| lead.as_deref() == Some(first.as_str()));
    shared.then_some(first)
}

fn population_variance(counts: &[usize]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

fn canonical_number(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let value: f64 = cleaned.trim_end_matches('.').parse().ok()?;
    Some(format!("{value}"))
}

fn word_number(word: &str) -> Option<u32> {
    let n = match word.to_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" | "dozen" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        _ => return None,
    };
    Some(n)
}

fn is_year(raw: &str) -> bool {
    raw.len() == 4
        && raw
            .parse::<u32>()
            .map(|y| (1900..=2100).contains(&y))
            .unwrap_or(false)
}

fn preceded_by_team_of(text: &str, start: usize) -> bool {
    text[..start]
        .trim_end()
        .to_lowercase()
        .ends_with("team of")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::violation::Severity;
    use crate::models::resume::fixtures::acme_source;
    use crate::models::transformed::fixtures::mirror;

    fn with_bullets(bullets: &[&str], originals: &[&str]) -> TransformedDocument {
        let mut doc = mirror(&acme_source());
        doc.work_history[0].bullets = bullets.iter().map(|s| s.to_string()).collect();
        doc.work_history[0].original_bullets = originals.iter().map(|s| s.to_string()).collect();
        doc
    }

    fn rules(violations: &[ValidationViolation]) -> Vec<ViolationRule> {
        violations.iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_claims_classify_percent_currency_multiplier() {
        let claims = numeric_claims("Reduced costs by 47% saving $1,200 and ran 3x faster");
        let kinds: Vec<ClaimKind> = claims.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ClaimKind::Percentage, ClaimKind::Currency, ClaimKind::Multiplier]
        );
        assert_eq!(claims[1].value, "1200");
    }

    #[test]
    fn test_claims_detect_team_size() {
        let claims = numeric_claims("Managed a team of 8 engineers");
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].kind, ClaimKind::TeamSize);

        let worded = numeric_claims("Led a team of five");
        assert_eq!(worded.len(), 1);
        assert_eq!(worded[0].value, "5");
    }

    #[test]
    fn test_claims_skip_years_and_identifiers() {
        assert!(numeric_claims("Migrated S3 and EC2 workloads in 2021").is_empty());
    }

    #[test]
    fn test_year_followed_by_comma_is_not_a_claim() {
        assert!(numeric_claims("In 2021, moved billing services to AWS").is_empty());

        let claims = numeric_claims("Served 1,200, then 3,400,000 requests");
        let values: Vec<&str> = claims.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["1200", "3400000"]);
        assert_eq!(claims[0].text, "1,200");
    }

    #[test]
    fn test_word_numbers_support_digit_claims() {
        let supported = supported_values(["Mentored five junior engineers"]);
        assert!(unsupported_metrics("f", "Mentored 5 engineers", &supported).is_empty());
    }

    #[test]
    fn test_unsupported_percentage_flagged_as_warning() {
        let doc = with_bullets(
            &["Reduced costs by 47%"],
            &["Reduced infrastructure costs"],
        );
        let found = check_style(&doc, &StyleConfig::default());
        assert_eq!(rules(&found), vec![ViolationRule::UnsupportedMetric]);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(found[0].field, "work_history[0].bullets[0]");
        assert_eq!(found[0].actual.as_deref(), Some("47%"));
    }

    #[test]
    fn test_metric_present_in_originals_in_other_form_passes() {
        let doc = with_bullets(
            &["Cut infrastructure spend by 47 percent"],
            &["Reduced costs by 47%"],
        );
        assert!(check_style(&doc, &StyleConfig::default()).is_empty());
    }

    #[test]
    fn test_cliche_detected_case_insensitively() {
        let doc = with_bullets(&["Leveraged Python to ship billing"], &[]);
        let found = check_style(&doc, &StyleConfig::default());
        assert_eq!(rules(&found), vec![ViolationRule::Cliche]);
        assert!(found[0].message.contains("leveraged"));
    }

    #[test]
    fn test_cliche_does_not_match_inside_other_words() {
        let doc = with_bullets(&["Built a ninjago-themed demo"], &[]);
        assert!(check_style(&doc, &StyleConfig::default()).is_empty());
    }

    #[test]
    fn test_multi_word_cliche_detected() {
        let doc = with_bullets(&["Passionate about distributed systems"], &[]);
        let found = check_style(&doc, &StyleConfig::default());
        assert_eq!(rules(&found), vec![ViolationRule::Cliche]);
    }

    #[test]
    fn test_uniform_length_and_shared_lead_flagged() {
        let doc = with_bullets(
            &[
                "Built the billing service",
                "Built the invoice service",
                "Built the ledger service",
            ],
            &[],
        );
        let found = check_style(&doc, &StyleConfig::default());
        assert_eq!(
            rules(&found),
            vec![
                ViolationRule::UniformSentenceLength,
                ViolationRule::RepetitiveStructure
            ]
        );
        assert!(found.iter().all(|v| v.field == "work_history[0].bullets"));
    }

    #[test]
    fn test_varied_bullets_not_flagged() {
        let doc = with_bullets(
            &[
                "Built the billing service",
                "Designed an event pipeline that feeds reporting and fraud detection across regions",
                "Mentored interns",
            ],
            &[],
        );
        assert!(check_style(&doc, &StyleConfig::default()).is_empty());
    }

    #[test]
    fn test_pattern_checks_need_minimum_bullets() {
        let doc = with_bullets(&["Built billing", "Built invoices"], &[]);
        assert!(check_style(&doc, &StyleConfig::default()).is_empty());
    }

    #[test]
    fn test_population_variance() {
        assert_eq!(population_variance(&[4, 4, 4]), 0.0);
        assert!((population_variance(&[2, 4, 6]) - 8.0 / 3.0).abs() < 1e-9);
    }
}
