//! The generator seam: whatever turns an instruction into a candidate document.
//!
//! The orchestrator only ever talks to `dyn Generator`. Production wires in
//! `llm_client::LlmClient`; tests wire in a scripted fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::instructions::GenerationInstruction;
use crate::models::transformed::TransformedDocument;

/// Why a single generation call produced no usable candidate.
/// Every variant is retryable; each one consumes an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Generator timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Output does not match the document schema: {0}")]
    SchemaViolation(String),

    #[error("Rate limited by the generator")]
    RateLimited,
}

/// Serializable category of a `GenerationError`, recorded in the attempt log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Timeout,
    Transport,
    SchemaViolation,
    RateLimited,
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            GenerationError::Timeout => GenerationErrorKind::Timeout,
            GenerationError::Transport(_) => GenerationErrorKind::Transport,
            GenerationError::SchemaViolation(_) => GenerationErrorKind::SchemaViolation,
            GenerationError::RateLimited => GenerationErrorKind::RateLimited,
        }
    }
}

/// A stateless text generator. Must be safe to call concurrently from
/// independent `transform` runs.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        instruction: &GenerationInstruction,
    ) -> Result<TransformedDocument, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(GenerationError::Timeout.kind(), GenerationErrorKind::Timeout);
        assert_eq!(
            GenerationError::SchemaViolation("missing contact".into()).kind(),
            GenerationErrorKind::SchemaViolation
        );
        assert_eq!(
            serde_json::to_value(GenerationErrorKind::RateLimited).unwrap(),
            "rate_limited"
        );
    }
}
