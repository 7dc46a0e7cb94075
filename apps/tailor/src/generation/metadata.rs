//! Result metadata computed once the run has a final document.

use std::collections::BTreeSet;

use crate::generation::tokens::{target_keywords, tokens};
use crate::models::target::TargetSpec;
use crate::models::transformed::TransformedDocument;

/// Number of distinct target keyword/requirement tokens present in the
/// document's prose or skill names.
pub fn keyword_match_count(document: &TransformedDocument, target: &TargetSpec) -> usize {
    let mut wanted = target_keywords(target);
    for requirement in &target.requirements {
        wanted.extend(tokens(requirement));
    }

    let mut present: BTreeSet<String> = BTreeSet::new();
    for text in document.prose() {
        present.extend(tokens(text));
    }
    for skill in &document.skills {
        present.extend(tokens(&skill.name));
    }

    wanted.intersection(&present).count()
}

/// Sections whose prose was rewritten. `summary` is always listed first; it
/// has no immutable counterpart to compare against.
pub fn modified_sections(document: &TransformedDocument) -> Vec<String> {
    let mut sections = vec!["summary".to_string()];
    sections.extend(
        document
            .work_history
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_modified())
            .map(|(i, _)| format!("work_history[{i}]")),
    );
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::acme_source;
    use crate::models::transformed::fixtures::mirror;

    #[test]
    fn test_keyword_match_count_uses_prose_and_skills() {
        let doc = mirror(&acme_source());
        let target = TargetSpec {
            title: "Backend Engineer".to_string(),
            requirements: vec!["Python".to_string(), "AWS".to_string(), "Kafka".to_string()],
            ..TargetSpec::default()
        };
        // backend, engineer, python, aws; kafka is missing
        assert_eq!(keyword_match_count(&doc, &target), 4);
    }

    #[test]
    fn test_keyword_match_count_includes_requirements_with_explicit_keywords() {
        let doc = mirror(&acme_source());
        let target = TargetSpec {
            requirements: vec!["Python".to_string()],
            keywords: vec!["billing".to_string()],
            ..TargetSpec::default()
        };
        assert_eq!(keyword_match_count(&doc, &target), 2);
    }

    #[test]
    fn test_keyword_match_count_empty_target() {
        let doc = mirror(&acme_source());
        assert_eq!(keyword_match_count(&doc, &TargetSpec::default()), 0);
    }

    #[test]
    fn test_modified_sections_lists_summary_and_rewritten_entries() {
        let mut source = acme_source();
        source.work_history.push(source.work_history[0].clone());
        let mut doc = mirror(&source);
        assert_eq!(modified_sections(&doc), vec!["summary".to_string()]);

        doc.work_history[1].bullets[0] = "Shipped billing services in Python on AWS".to_string();
        assert_eq!(
            modified_sections(&doc),
            vec!["summary".to_string(), "work_history[1]".to_string()]
        );
    }
}
