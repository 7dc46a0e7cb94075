use thiserror::Error;

/// Hard failures of the tailoring engine.
///
/// Only these escape `transform` as `Err`. Problems inside a single attempt
/// (generator errors, validation violations) are folded into the
/// `TransformationResult` instead.
#[derive(Debug, Error)]
pub enum TailorError {
    /// The source document cannot yield a complete fact baseline.
    #[error("Malformed source document: {field}: {reason}")]
    MalformedSource { field: String, reason: String },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TailorError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TailorError::MalformedSource {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
