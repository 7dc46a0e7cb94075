use serde::{Deserialize, Serialize};

/// The job posting a résumé is being tailored to. Read-only input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub company_context: Option<String>,
    /// Explicit keyword list. When empty, keywords are derived from the
    /// title and requirements (see `generation::tokens::target_keywords`).
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_spec_minimal_json() {
        let target: TargetSpec = serde_json::from_str(r#"{"title": "Senior Backend Engineer"}"#).unwrap();
        assert_eq!(target.title, "Senior Backend Engineer");
        assert!(target.requirements.is_empty());
        assert!(target.keywords.is_empty());
        assert!(target.company_context.is_none());
    }
}
