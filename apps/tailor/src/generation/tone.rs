//! Tone calibration: detects the posting's tone and maps it to verb guidance.
//!
//! Detection is a plain word count over the title and description. The verb
//! sets end up in the style constraints of the generation instruction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::target::TargetSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostingTone {
    AggressiveStartup,
    CollaborativeEnterprise,
    ResearchOriented,
    ProductOriented,
}

impl PostingTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingTone::AggressiveStartup => "AggressiveStartup",
            PostingTone::CollaborativeEnterprise => "CollaborativeEnterprise",
            PostingTone::ResearchOriented => "ResearchOriented",
            PostingTone::ProductOriented => "ProductOriented",
        }
    }
}

/// Signal words per tone. Ties resolve in declaration order.
const TONE_SIGNALS: &[(PostingTone, &[&str])] = &[
    (
        PostingTone::CollaborativeEnterprise,
        &[
            "collaborate", "collaborative", "partner", "partners", "stakeholders", "enterprise",
            "cross-functional", "contribute", "support", "teams", "governance", "compliance",
        ],
    ),
    (
        PostingTone::AggressiveStartup,
        &[
            "startup", "fast-paced", "own", "ownership", "drive", "disrupt", "hustle", "scrappy",
            "founding", "seed", "series", "ambiguity",
        ],
    ),
    (
        PostingTone::ResearchOriented,
        &[
            "research", "investigate", "publish", "publications", "phd", "papers", "evaluate",
            "experiments", "novel", "propose", "scientific", "academic",
        ],
    ),
    (
        PostingTone::ProductOriented,
        &[
            "ship", "shipping", "launch", "deliver", "customers", "users", "product", "roadmap",
            "experience", "growth", "features", "iterate",
        ],
    ),
];

/// Picks the tone whose signal words occur most often in the posting.
/// Defaults to `CollaborativeEnterprise` when nothing matches.
pub fn detect_tone(target: &TargetSpec) -> PostingTone {
    let text = format!("{} {}", target.title, target.description).to_lowercase();
    let words: BTreeSet<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();

    let mut best = (PostingTone::CollaborativeEnterprise, 0usize);
    for (tone, signals) in TONE_SIGNALS {
        let hits = signals.iter().filter(|s| words.contains(**s)).count();
        if hits > best.1 {
            best = (*tone, hits);
        }
    }
    best.0
}

/// Verb sets and phrasing calibrated to a specific tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneGuidance {
    pub tone: PostingTone,
    pub strong_verbs: &'static [&'static str],
    pub avoid_verbs: &'static [&'static str],
}

pub fn guidance_for(tone: PostingTone) -> ToneGuidance {
    match tone {
        PostingTone::AggressiveStartup => ToneGuidance {
            tone,
            strong_verbs: &["Built", "Shipped", "Launched", "Drove", "Owned", "Led"],
            avoid_verbs: &["assisted", "helped", "participated in"],
        },
        PostingTone::CollaborativeEnterprise => ToneGuidance {
            tone,
            strong_verbs: &["Partnered with", "Contributed to", "Enabled", "Collaborated on", "Facilitated"],
            avoid_verbs: &["solely built", "owned end-to-end", "single-handedly"],
        },
        PostingTone::ResearchOriented => ToneGuidance {
            tone,
            strong_verbs: &["Investigated", "Designed and evaluated", "Published", "Proposed", "Analyzed"],
            avoid_verbs: &["shipped", "moved fast", "disrupted"],
        },
        PostingTone::ProductOriented => ToneGuidance {
            tone,
            strong_verbs: &["Shipped", "Delivered", "Launched", "Improved", "Reduced friction for"],
            avoid_verbs: &["investigated", "researched", "proposed"],
        },
    }
}

impl ToneGuidance {
    /// Style constraints rendered into the generation instruction.
    /// `cliches` is the configured stoplist the style checker enforces.
    pub fn render(&self, cliches: &[String]) -> String {
        let mut out = format!(
            "Detected posting tone: {}\n\
             - Prefer verbs such as: {}\n\
             - Avoid: {}\n",
            self.tone.as_str(),
            self.strong_verbs.join(", "),
            self.avoid_verbs.join(", ")
        );
        if !cliches.is_empty() {
            out.push_str(&format!("- Never use these clichés: {}\n", cliches.join(", ")));
        }
        out.push_str(
            "- Vary bullet length and opening words; do not start every bullet the same way\n\
             - Only use numbers that already appear in the original bullets or summary",
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(title: &str, description: &str) -> TargetSpec {
        TargetSpec {
            title: title.to_string(),
            description: description.to_string(),
            ..TargetSpec::default()
        }
    }

    #[test]
    fn test_detects_startup_tone() {
        let t = posting(
            "Founding Engineer",
            "Seed-stage startup. You will own the platform and drive decisions in a fast-paced team.",
        );
        assert_eq!(detect_tone(&t), PostingTone::AggressiveStartup);
    }

    #[test]
    fn test_detects_research_tone() {
        let t = posting(
            "Research Scientist",
            "Investigate novel methods, run experiments and publish papers.",
        );
        assert_eq!(detect_tone(&t), PostingTone::ResearchOriented);
    }

    #[test]
    fn test_detects_product_tone() {
        let t = posting(
            "Product Engineer",
            "Ship features to customers and iterate on the roadmap with users.",
        );
        assert_eq!(detect_tone(&t), PostingTone::ProductOriented);
    }

    #[test]
    fn test_defaults_to_enterprise() {
        assert_eq!(detect_tone(&TargetSpec::default()), PostingTone::CollaborativeEnterprise);
    }

    #[test]
    fn test_research_guidance_includes_published() {
        let g = guidance_for(PostingTone::ResearchOriented);
        assert!(g.strong_verbs.contains(&"Published"));
        assert!(g.avoid_verbs.contains(&"shipped"));
    }

    #[test]
    fn test_startup_guidance_never_suggests_cliches() {
        let g = guidance_for(PostingTone::AggressiveStartup);
        assert!(!g.strong_verbs.iter().any(|v| v.eq_ignore_ascii_case("spearheaded")));
    }

    #[test]
    fn test_render_lists_cliches() {
        let g = guidance_for(PostingTone::ProductOriented);
        let text = g.render(&["synergy".to_string()]);
        assert!(text.contains("ProductOriented"));
        assert!(text.contains("Never use these clichés: synergy"));
        assert!(text.contains("Shipped"));
    }
}
