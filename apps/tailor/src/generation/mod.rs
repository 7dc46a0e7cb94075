// Tailoring pipeline: relevance scoring, section ranking, tone calibration,
// instruction building and the retry orchestrator.
// All LLM calls go through the `Generator` trait; llm_client is the only
// implementation that talks to the network.

pub mod generator;
pub mod instructions;
pub mod metadata;
pub mod orchestrator;
pub mod prompts;
pub mod ranking;
pub mod relevance;
pub mod tokens;
pub mod tone;

pub use generator::{GenerationError, GenerationErrorKind, Generator};
pub use instructions::GenerationInstruction;
pub use orchestrator::{
    transform, AttemptOutcome, AttemptRecord, FailureReason, TransformationRequest,
    TransformationResult,
};
pub use relevance::{KeywordRelevanceScorer, RelevanceScorer};
