pub mod resume;
pub mod target;
pub mod transformed;

pub use resume::{CertificationEntry, Contact, EducationEntry, SourceDocument, WorkEntry};
pub use target::TargetSpec;
pub use transformed::{ScoredSkill, TransformedDocument, TransformedWorkEntry};
