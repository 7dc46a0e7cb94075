// Fact grounding: tiered baseline extraction, style/anomaly checks and the
// validation engine that gates every generated candidate.

pub mod baseline;
pub mod style;
pub mod tiers;
pub mod validation;
pub mod violation;

pub use baseline::{extract, FactBaseline};
pub use tiers::FactTier;
pub use validation::{validate, validate_with};
pub use violation::{Severity, ValidationViolation, ViolationRule};
