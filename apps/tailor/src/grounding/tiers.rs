//! Fact tiers: every document field is declared once here with its tier.
//!
//! The instruction builder renders the tier rules from this table and the
//! validation engine walks the IMMUTABLE rows when comparing a candidate
//! against the baseline. Adding a field to a section means adding a row here
//! and an arm in the matching `FactFields::field` impl.

use serde::{Deserialize, Serialize};

/// How strictly a fact must be preserved by a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactTier {
    /// Must match the source exactly.
    Immutable,
    /// Must be drawn from a source-derived set; may be reordered or highlighted.
    Verifiable,
    /// May be rewritten freely, subject to anomaly checks.
    Flexible,
}

impl FactTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactTier::Immutable => "IMMUTABLE",
            FactTier::Verifiable => "VERIFIABLE",
            FactTier::Flexible => "FLEXIBLE",
        }
    }
}

/// Top-level sections of a résumé document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Contact,
    WorkHistory,
    Education,
    Certifications,
    Skills,
    Summary,
}

impl Section {
    pub fn key(&self) -> &'static str {
        match self {
            Section::Contact => "contact",
            Section::WorkHistory => "work_history",
            Section::Education => "education",
            Section::Certifications => "certifications",
            Section::Skills => "skills",
            Section::Summary => "summary",
        }
    }
}

/// One row of the field metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub section: Section,
    pub name: &'static str,
    pub tier: FactTier,
    /// Human-readable preservation rule, rendered into generation instructions.
    pub rule: &'static str,
}

const fn field(section: Section, name: &'static str, tier: FactTier, rule: &'static str) -> FieldSpec {
    FieldSpec {
        section,
        name,
        tier,
        rule,
    }
}

const COPY_EXACTLY: &str = "copy exactly, character for character";

pub const FIELD_TABLE: &[FieldSpec] = &[
    field(Section::Contact, "name", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Contact, "email", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Contact, "phone", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Contact, "location", FactTier::Immutable, COPY_EXACTLY),
    field(Section::WorkHistory, "company", FactTier::Immutable, COPY_EXACTLY),
    field(Section::WorkHistory, "title", FactTier::Immutable, COPY_EXACTLY),
    field(Section::WorkHistory, "start_date", FactTier::Immutable, COPY_EXACTLY),
    field(Section::WorkHistory, "end_date", FactTier::Immutable, COPY_EXACTLY),
    field(Section::WorkHistory, "location", FactTier::Immutable, COPY_EXACTLY),
    field(
        Section::WorkHistory,
        "bullets",
        FactTier::Flexible,
        "rewrite freely; never introduce numbers, percentages, amounts or team sizes absent from original_bullets",
    ),
    field(Section::Education, "institution", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Education, "degree", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Education, "field", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Education, "graduation_date", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Certifications, "name", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Certifications, "issuer", FactTier::Immutable, COPY_EXACTLY),
    field(Section::Certifications, "date", FactTier::Immutable, COPY_EXACTLY),
    field(
        Section::Skills,
        "name",
        FactTier::Verifiable,
        "only skills listed in the source; reorder or highlight, never add",
    ),
    field(
        Section::Summary,
        "summary",
        FactTier::Flexible,
        "rewrite freely toward the target role; no new numeric claims",
    ),
];

/// All rows of a given tier, in table order.
pub fn fields_in(tier: FactTier) -> impl Iterator<Item = &'static FieldSpec> {
    FIELD_TABLE.iter().filter(move |f| f.tier == tier)
}

/// Rows of one section restricted to a tier, in table order.
pub fn fields_of(section: Section, tier: FactTier) -> impl Iterator<Item = &'static FieldSpec> {
    FIELD_TABLE
        .iter()
        .filter(move |f| f.section == section && f.tier == tier)
}

pub fn tier_of(section: Section, name: &str) -> Option<FactTier> {
    FIELD_TABLE
        .iter()
        .find(|f| f.section == section && f.name == name)
        .map(|f| f.tier)
}

/// Read access to a record's fields by table name. `None` means the field
/// is absent on this record (or unknown to the section).
pub trait FactFields {
    const SECTION: Section;

    fn field(&self, name: &str) -> Option<&str>;
}
