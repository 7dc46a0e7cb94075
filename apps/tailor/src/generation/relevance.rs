//! Relevance scoring: how well a piece of the source résumé fits the target posting.
//!
//! Default: `KeywordRelevanceScorer` (pure-Rust, deterministic, no LLM call).
//!
//! score = clamp(w_kw·keyword + w_skill·skill + w_exp·experience, 0, 1)
//!
//! Scoring feeds ranking, not correctness: it never fails, and empty or
//! unusable input scores 0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ScoringWeights};
use crate::generation::tokens::{contains_phrase, target_keywords, tokens, words};
use crate::models::target::TargetSpec;

/// Share of the experience sub-score given to title similarity, seniority
/// alignment and industry overlap.
const TITLE_SHARE: f64 = 0.5;
const SENIORITY_SHARE: f64 = 0.3;
const INDUSTRY_SHARE: f64 = 0.2;

/// Neutral skill score when the posting lists no requirements.
const NEUTRAL_SKILL_SCORE: f64 = 0.5;

/// Highest seniority level in `SENIORITY_LEVELS`, used to normalize distance.
const MAX_SENIORITY_GAP: f64 = 5.0;

const SENIORITY_LEVELS: &[(&str, u8)] = &[
    ("intern", 1),
    ("junior", 1),
    ("jr", 1),
    ("entry", 1),
    ("associate", 1),
    ("mid", 2),
    ("intermediate", 2),
    ("senior", 3),
    ("sr", 3),
    ("lead", 4),
    ("staff", 4),
    ("principal", 5),
    ("architect", 5),
    ("head", 6),
    ("director", 6),
    ("vp", 6),
];

/// A unit of source content to score. `role_title` is the job title for
/// work-history entries and drives the experience sub-score.
#[derive(Debug, Clone, Copy)]
pub struct ScorableSection<'a> {
    pub text: &'a str,
    pub role_title: Option<&'a str>,
}

impl<'a> ScorableSection<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            text,
            role_title: None,
        }
    }

    pub fn role(text: &'a str, role_title: &'a str) -> Self {
        Self {
            text,
            role_title: Some(role_title),
        }
    }
}

/// Sub-scores and their weighted total, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceBreakdown {
    pub keyword: f64,
    pub skill: f64,
    pub experience: f64,
    pub total: f64,
}

impl RelevanceBreakdown {
    const ZERO: RelevanceBreakdown = RelevanceBreakdown {
        keyword: 0.0,
        skill: 0.0,
        experience: 0.0,
        total: 0.0,
    };
}

/// The relevance scorer trait. Implement this to swap the similarity method
/// without touching ranking or the orchestrator.
pub trait RelevanceScorer: Send + Sync {
    fn score_section(&self, section: &ScorableSection<'_>, target: &TargetSpec) -> RelevanceBreakdown;

    /// Requirements of `target` that `text` provides evidence for.
    fn matched_requirements(&self, text: &str, target: &TargetSpec) -> Vec<String>;

    fn score(&self, text: &str, target: &TargetSpec) -> f64 {
        self.score_section(&ScorableSection::text(text), target).total
    }
}

/// Token-overlap scorer with Levenshtein fuzzy matching for skills.
#[derive(Debug, Clone)]
pub struct KeywordRelevanceScorer {
    weights: ScoringWeights,
    fuzzy_threshold: f64,
}

impl KeywordRelevanceScorer {
    pub fn new(weights: ScoringWeights, fuzzy_threshold: f64) -> Self {
        Self {
            weights,
            fuzzy_threshold,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.weights.clone(), config.fuzzy_match_threshold)
    }

    fn keyword_score(&self, section_tokens: &BTreeSet<String>, target: &TargetSpec) -> f64 {
        let keywords = target_keywords(target);
        if keywords.is_empty() {
            return 0.0;
        }
        let hits = keywords.intersection(section_tokens).count();
        (hits as f64 / keywords.len() as f64).min(1.0)
    }

    fn skill_score(&self, section_tokens: &BTreeSet<String>, text: &str, target: &TargetSpec) -> f64 {
        if target.requirements.is_empty() {
            return NEUTRAL_SKILL_SCORE;
        }
        let section_words = words(text);
        let matched = target
            .requirements
            .iter()
            .filter(|req| self.requirement_matches(req, section_tokens, &section_words))
            .count();
        matched as f64 / target.requirements.len() as f64
    }

    /// A requirement matches when its words appear contiguously in the text,
    /// or when any of its content tokens is a fuzzy match for a section token.
    fn requirement_matches(&self, requirement: &str, section_tokens: &BTreeSet<String>, section_words: &[String]) -> bool {
        if contains_phrase(section_words, requirement) {
            return true;
        }
        tokens(requirement)
            .iter()
            .any(|req_token| self.fuzzy_contains(section_tokens, req_token))
    }

    fn fuzzy_contains(&self, haystack: &BTreeSet<String>, needle: &str) -> bool {
        haystack.contains(needle)
            || haystack
                .iter()
                .any(|t| strsim::normalized_levenshtein(t, needle) >= self.fuzzy_threshold)
    }

    fn experience_score(&self, section: &ScorableSection<'_>, section_tokens: &BTreeSet<String>, target: &TargetSpec) -> f64 {
        let role_tokens = section.role_title.map(tokens).unwrap_or_else(|| section_tokens.clone());

        let title_tokens = tokens(&target.title);
        let title_similarity = if title_tokens.is_empty() {
            0.0
        } else {
            let hits = title_tokens
                .iter()
                .filter(|t| self.fuzzy_contains(&role_tokens, t))
                .count();
            hits as f64 / title_tokens.len() as f64
        };

        let role_level = seniority_level(&role_tokens);
        let target_level = seniority_level(&title_tokens)
            .or_else(|| seniority_level(&tokens(&target.description)));
        let seniority_alignment = match (role_level, target_level) {
            (Some(a), Some(b)) => {
                (1.0 - (a as f64 - b as f64).abs() / MAX_SENIORITY_GAP).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };

        let industry_tokens = target
            .company_context
            .as_deref()
            .map(tokens)
            .unwrap_or_default();
        let industry_overlap = if industry_tokens.is_empty() {
            0.0
        } else {
            industry_tokens.intersection(section_tokens).count() as f64 / industry_tokens.len() as f64
        };

        TITLE_SHARE * title_similarity
            + SENIORITY_SHARE * seniority_alignment
            + INDUSTRY_SHARE * industry_overlap
    }
}

impl Default for KeywordRelevanceScorer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl RelevanceScorer for KeywordRelevanceScorer {
    fn score_section(&self, section: &ScorableSection<'_>, target: &TargetSpec) -> RelevanceBreakdown {
        let section_tokens = tokens(section.text);
        if section_tokens.is_empty() {
            return RelevanceBreakdown::ZERO;
        }

        let keyword = self.keyword_score(&section_tokens, target);
        let skill = self.skill_score(&section_tokens, section.text, target);
        let experience = self.experience_score(section, &section_tokens, target);

        let w = &self.weights;
        let total = w.keyword * keyword + w.skill * skill + w.experience * experience;
        let total = if total.is_finite() {
            total.clamp(0.0, 1.0)
        } else {
            0.0
        };

        RelevanceBreakdown {
            keyword,
            skill,
            experience,
            total,
        }
    }

    fn matched_requirements(&self, text: &str, target: &TargetSpec) -> Vec<String> {
        let section_tokens = tokens(text);
        if section_tokens.is_empty() {
            return Vec::new();
        }
        let section_words = words(text);
        target
            .requirements
            .iter()
            .filter(|req| self.requirement_matches(req, &section_tokens, &section_words))
            .cloned()
            .collect()
    }
}

/// Highest seniority level named among `tokens`, if any.
fn seniority_level(tokens: &BTreeSet<String>) -> Option<u8> {
    SENIORITY_LEVELS
        .iter()
        .filter(|(word, _)| tokens.contains(*word))
        .map(|(_, level)| *level)
        .max()
}
