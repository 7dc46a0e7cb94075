use serde::{Deserialize, Serialize};

use crate::models::resume::{CertificationEntry, Contact, EducationEntry};

/// A rewritten work-history entry as returned by the generator.
///
/// `original_bullets` echoes the source bullets for the same index. It is only
/// used for diffing and anomaly comparison; the orchestrator rejects a
/// candidate whose echo does not match the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedWorkEntry {
    pub company: String,
    pub title: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub original_bullets: Vec<String>,
}

impl TransformedWorkEntry {
    /// True when the rewritten bullets differ from the echoed originals.
    pub fn is_modified(&self) -> bool {
        self.bullets != self.original_bullets
    }
}

/// A skill as highlighted in the tailored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSkill {
    pub name: String,
    /// Relevance against the target posting, in `[0, 1]`.
    pub relevance_score: f64,
    #[serde(default)]
    pub matched_requirements: Vec<String>,
}

/// Candidate output of one generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedDocument {
    pub contact: Contact,
    #[serde(default)]
    pub work_history: Vec<TransformedWorkEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub certifications: Vec<CertificationEntry>,
    #[serde(default)]
    pub skills: Vec<ScoredSkill>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl TransformedDocument {
    /// All rewritable prose: the summary followed by every bullet.
    pub fn prose(&self) -> impl Iterator<Item = &str> {
        self.summary.as_deref().into_iter().chain(
            self.work_history
                .iter()
                .flat_map(|entry| entry.bullets.iter().map(String::as_str)),
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::resume::SourceDocument;

    /// Builds a candidate that mirrors `source` exactly, with bullets unchanged
    /// and every skill scored at 0.5.
    pub fn mirror(source: &SourceDocument) -> TransformedDocument {
        TransformedDocument {
            contact: source.contact.clone(),
            work_history: source
                .work_history
                .iter()
                .map(|entry| TransformedWorkEntry {
                    company: entry.company.clone(),
                    title: entry.title.clone(),
                    start_date: entry.start_date.clone(),
                    end_date: entry.end_date.clone(),
                    location: entry.location.clone(),
                    bullets: entry.bullets.clone(),
                    original_bullets: entry.bullets.clone(),
                })
                .collect(),
            education: source.education.clone(),
            certifications: source.certifications.clone(),
            skills: source
                .skills
                .iter()
                .map(|name| ScoredSkill {
                    name: name.clone(),
                    relevance_score: 0.5,
                    matched_requirements: vec![],
                })
                .collect(),
            summary: source.summary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::acme_source;

    #[test]
    fn test_mirror_is_not_modified() {
        let doc = fixtures::mirror(&acme_source());
        assert!(!doc.work_history[0].is_modified());
    }

    #[test]
    fn test_prose_yields_summary_then_bullets() {
        let doc = fixtures::mirror(&acme_source());
        let prose: Vec<&str> = doc.prose().collect();
        assert_eq!(prose.len(), 3);
        assert!(prose[0].starts_with("Backend engineer"));
    }

    #[test]
    fn test_skill_without_matched_requirements_deserializes() {
        let json = r#"{"name": "Python", "relevance_score": 0.9}"#;
        let skill: ScoredSkill = serde_json::from_str(json).unwrap();
        assert!(skill.matched_requirements.is_empty());
    }
}
