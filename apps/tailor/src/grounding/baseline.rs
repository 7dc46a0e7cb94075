//! Fact baseline: the tiered snapshot of facts a rewrite must preserve.
//!
//! Built once per run by `extract` and only ever read afterwards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::TailorError;
use crate::grounding::tiers::{FactFields, Section};
use crate::models::resume::{
    CertificationEntry, Contact, EducationEntry, SourceDocument, WorkEntry,
};
use crate::models::transformed::TransformedWorkEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFacts {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
}

impl From<&Contact> for ContactFacts {
    fn from(c: &Contact) -> Self {
        Self {
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            location: c.location.clone(),
        }
    }
}

impl FactFields for ContactFacts {
    const SECTION: Section = Section::Contact;

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "phone" => self.phone.as_deref(),
            "location" => self.location.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkFacts {
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub location: Option<String>,
}

impl From<&WorkEntry> for WorkFacts {
    fn from(e: &WorkEntry) -> Self {
        Self {
            company: e.company.clone(),
            title: e.title.clone(),
            start_date: e.start_date.clone(),
            end_date: e.end_date.clone(),
            location: e.location.clone(),
        }
    }
}

impl From<&TransformedWorkEntry> for WorkFacts {
    fn from(e: &TransformedWorkEntry) -> Self {
        Self {
            company: e.company.clone(),
            title: e.title.clone(),
            start_date: e.start_date.clone(),
            end_date: e.end_date.clone(),
            location: e.location.clone(),
        }
    }
}

impl FactFields for WorkFacts {
    const SECTION: Section = Section::WorkHistory;

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "company" => Some(&self.company),
            "title" => Some(&self.title),
            "start_date" => Some(&self.start_date),
            "end_date" => self.end_date.as_deref(),
            "location" => self.location.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationFacts {
    pub institution: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub graduation_date: Option<String>,
}

impl From<&EducationEntry> for EducationFacts {
    fn from(e: &EducationEntry) -> Self {
        Self {
            institution: e.institution.clone(),
            degree: e.degree.clone(),
            field: e.field.clone(),
            graduation_date: e.graduation_date.clone(),
        }
    }
}

impl FactFields for EducationFacts {
    const SECTION: Section = Section::Education;

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "institution" => Some(&self.institution),
            "degree" => self.degree.as_deref(),
            "field" => self.field.as_deref(),
            "graduation_date" => self.graduation_date.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationFacts {
    pub name: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
}

impl From<&CertificationEntry> for CertificationFacts {
    fn from(c: &CertificationEntry) -> Self {
        Self {
            name: c.name.clone(),
            issuer: c.issuer.clone(),
            date: c.date.clone(),
        }
    }
}

impl FactFields for CertificationFacts {
    const SECTION: Section = Section::Certifications;

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "issuer" => self.issuer.as_deref(),
            "date" => self.date.as_deref(),
            _ => None,
        }
    }
}

/// Facts that must survive a rewrite unchanged, index-aligned with the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmutableFacts {
    pub contact: ContactFacts,
    pub work_history: Vec<WorkFacts>,
    pub education: Vec<EducationFacts>,
    pub certifications: Vec<CertificationFacts>,
}

/// Names that may be referenced but never invented. Stored normalized
/// (trimmed, whitespace-collapsed, lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableFacts {
    pub skills: BTreeSet<String>,
    pub certifications: BTreeSet<String>,
}

impl VerifiableFacts {
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.contains(&normalize_name(name))
    }

    pub fn has_certification(&self, name: &str) -> bool {
        self.certifications.contains(&normalize_name(name))
    }
}

/// Original prose, kept only for anomaly comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexibleProse {
    pub summary: Option<String>,
    /// Bullets per work-history index.
    pub bullets: Vec<Vec<String>>,
}

impl FlexibleProse {
    pub fn bullets_for(&self, index: usize) -> Option<&[String]> {
        self.bullets.get(index).map(Vec::as_slice)
    }

    /// Every piece of source prose: summary then all bullets.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.summary
            .as_deref()
            .into_iter()
            .chain(self.bullets.iter().flatten().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactBaseline {
    pub immutable: ImmutableFacts,
    pub verifiable: VerifiableFacts,
    pub flexible: FlexibleProse,
}

/// Case- and whitespace-insensitive key for verifiable names.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Derives the tiered fact baseline from a source document.
///
/// Fails with `MalformedSource` instead of returning a partial baseline, since
/// every later check depends on the immutable set being complete.
pub fn extract(doc: &SourceDocument) -> Result<FactBaseline, TailorError> {
    check_well_formed(doc)?;

    let immutable = ImmutableFacts {
        contact: ContactFacts::from(&doc.contact),
        work_history: doc.work_history.iter().map(WorkFacts::from).collect(),
        education: doc.education.iter().map(EducationFacts::from).collect(),
        certifications: doc
            .certifications
            .iter()
            .map(CertificationFacts::from)
            .collect(),
    };

    let verifiable = VerifiableFacts {
        skills: doc
            .skills
            .iter()
            .map(|s| normalize_name(s))
            .filter(|s| !s.is_empty())
            .collect(),
        certifications: doc
            .certifications
            .iter()
            .map(|c| normalize_name(&c.name))
            .collect(),
    };

    let flexible = FlexibleProse {
        summary: doc.summary.clone(),
        bullets: doc.work_history.iter().map(|e| e.bullets.clone()).collect(),
    };

    Ok(FactBaseline {
        immutable,
        verifiable,
        flexible,
    })
}

fn check_well_formed(doc: &SourceDocument) -> Result<(), TailorError> {
    require("contact.name", &doc.contact.name)?;
    require("contact.email", &doc.contact.email)?;

    for (i, entry) in doc.work_history.iter().enumerate() {
        require(&format!("work_history[{i}].company"), &entry.company)?;
        require(&format!("work_history[{i}].title"), &entry.title)?;
        require(&format!("work_history[{i}].start_date"), &entry.start_date)?;
    }
    for (i, entry) in doc.education.iter().enumerate() {
        require(&format!("education[{i}].institution"), &entry.institution)?;
    }
    for (i, cert) in doc.certifications.iter().enumerate() {
        require(&format!("certifications[{i}].name"), &cert.name)?;
    }

    Ok(())
}

fn require(field: &str, value: &str) -> Result<(), TailorError> {
    if value.trim().is_empty() {
        return Err(TailorError::malformed(field, "required field is blank"));
    }
    Ok(())
}
