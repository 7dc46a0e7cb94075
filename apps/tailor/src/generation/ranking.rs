//! Section ranking: orders work entries and skills by relevance to the posting.
//!
//! No LLM calls. The ranking annotates the generation instruction with
//! priorities; it never drops or reorders source content itself.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::generation::relevance::{RelevanceBreakdown, RelevanceScorer, ScorableSection};
use crate::models::resume::SourceDocument;
use crate::models::target::TargetSpec;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One scorable unit of the source document with its relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSection {
    /// Path of the unit in the source document, e.g. `work_history[1]` or `skills[0]`.
    pub field: String,
    pub label: String,
    pub relevance: RelevanceBreakdown,
    pub matched_requirements: Vec<String>,
}

impl RankedSection {
    pub fn score(&self) -> f64 {
        self.relevance.total
    }
}

/// Work entries and skills, each sorted by descending relevance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionRanking {
    pub work_history: Vec<RankedSection>,
    pub skills: Vec<RankedSection>,
}

// ────────────────────────────────────────────────────────────────────────────
// Ranking
// ────────────────────────────────────────────────────────────────────────────

/// Scores every work entry and skill once and sorts each list descending.
/// Equal scores keep source order.
pub fn rank_sections(
    source: &SourceDocument,
    target: &TargetSpec,
    scorer: &dyn RelevanceScorer,
) -> SectionRanking {
    let mut work_history: Vec<RankedSection> = source
        .work_history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let text = entry.scoring_text();
            RankedSection {
                field: format!("work_history[{i}]"),
                label: format!("{} at {}", entry.title, entry.company),
                relevance: scorer.score_section(&ScorableSection::role(&text, &entry.title), target),
                matched_requirements: scorer.matched_requirements(&text, target),
            }
        })
        .collect();

    let mut skills: Vec<RankedSection> = source
        .skills
        .iter()
        .enumerate()
        .map(|(i, skill)| RankedSection {
            field: format!("skills[{i}]"),
            label: skill.clone(),
            relevance: scorer.score_section(&ScorableSection::text(skill), target),
            matched_requirements: scorer.matched_requirements(skill, target),
        })
        .collect();

    work_history.sort_by(by_score_desc);
    skills.sort_by(by_score_desc);

    SectionRanking {
        work_history,
        skills,
    }
}

fn by_score_desc(a: &RankedSection, b: &RankedSection) -> Ordering {
    b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal)
}

impl SectionRanking {
    /// Ranked skill entry for `name`, compared case-insensitively.
    pub fn skill(&self, name: &str) -> Option<&RankedSection> {
        self.skills
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(name.trim()))
    }

    /// Priority table embedded in the generation instruction.
    pub fn render(&self) -> String {
        let mut out = String::from("WORK HISTORY (highest priority first):\n");
        render_list(&mut out, &self.work_history);
        out.push_str("SKILLS (highest priority first):\n");
        render_list(&mut out, &self.skills);
        out
    }
}

fn render_list(out: &mut String, sections: &[RankedSection]) {
    if sections.is_empty() {
        out.push_str("(none)\n");
        return;
    }
    for (rank, s) in sections.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} {} | relevance {:.2}",
            rank + 1,
            s.field,
            s.label,
            s.score()
        ));
        if !s.matched_requirements.is_empty() {
            out.push_str(&format!(" | matches: {}", s.matched_requirements.join(", ")));
        }
        out.push('\n');
    }
}
