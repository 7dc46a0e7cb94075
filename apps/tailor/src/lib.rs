//! Tailor: rewrites a résumé for a target job posting while keeping its facts.
//!
//! The entry point is [`transform`]. It extracts a tiered fact baseline from
//! the source document, drives a [`Generator`] through a bounded retry loop
//! and validates every candidate against the baseline before accepting it.

pub mod config;
pub mod errors;
pub mod generation;
pub mod grounding;
pub mod llm_client;
pub mod models;

pub use config::{EngineConfig, ScoringWeights, StyleConfig};
pub use errors::TailorError;
pub use generation::{
    transform, GenerationError, Generator, TransformationRequest, TransformationResult,
};
pub use grounding::{extract, validate, FactBaseline, FactTier, Severity, ValidationViolation};
pub use models::{SourceDocument, TargetSpec, TransformedDocument};
