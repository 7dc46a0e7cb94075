//! Transformation orchestrator: the bounded BUILD → GENERATE → VALIDATE loop.
//!
//! Flow: extract baseline (once) → rank sections (once) →
//!       [build instruction → generate → schema check → validate] × attempts →
//!       ACCEPT | FAIL.
//!
//! Only a malformed source or an invalid configuration escapes as `Err`.
//! Everything that goes wrong inside an attempt becomes a RETRY or FAIL
//! decision and is reported in the `TransformationResult`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::TailorError;
use crate::generation::generator::{GenerationError, GenerationErrorKind, Generator};
use crate::generation::instructions::{Feedback, GenerationInstruction, InstructionBuilder};
use crate::generation::metadata::{keyword_match_count, modified_sections};
use crate::generation::ranking::rank_sections;
use crate::generation::relevance::KeywordRelevanceScorer;
use crate::grounding::baseline::extract;
use crate::grounding::validation::validate_with;
use crate::grounding::violation::{errors, has_errors, warnings, ValidationViolation};
use crate::models::resume::SourceDocument;
use crate::models::target::TargetSpec;
use crate::models::transformed::TransformedDocument;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationRequest {
    pub request_id: Uuid,
    pub source: SourceDocument,
    pub target: TargetSpec,
}

impl TransformationRequest {
    pub fn new(source: SourceDocument, target: TargetSpec) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            source,
            target,
        }
    }
}

/// Why a run ended without an accepted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Cancelled,
    AttemptsExhausted,
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted,
    Violations,
    GenerationError,
}

/// One entry of the attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_error: Option<GenerationErrorKind>,
    pub error_count: usize,
    pub warning_count: usize,
    /// Backoff slept before this attempt started.
    pub delay_before_ms: u64,
}

/// Terminal outcome of one `transform` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationResult {
    pub request_id: Uuid,
    pub document: Option<TransformedDocument>,
    /// Warnings only on success; the last report on failure.
    pub violations: Vec<ValidationViolation>,
    pub attempts: u32,
    pub succeeded: bool,
    pub keyword_match_count: usize,
    pub modified_sections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    pub attempt_log: Vec<AttemptRecord>,
    pub generated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

enum State {
    Build {
        attempt: u32,
        feedback: Feedback,
    },
    Generate {
        attempt: u32,
        instruction: GenerationInstruction,
    },
    Validate {
        attempt: u32,
        candidate: TransformedDocument,
    },
    Retry {
        attempt: u32,
        feedback: Feedback,
    },
    Accept {
        attempts: u32,
        document: TransformedDocument,
        report: Vec<ValidationViolation>,
    },
    Fail {
        attempts: u32,
        reason: FailureReason,
    },
}

/// Runs one transformation to completion.
///
/// `cancel` is honored while waiting on the generator and during backoff;
/// a cancelled run returns a FAIL result tagged `Cancelled`.
pub async fn transform(
    request: TransformationRequest,
    generator: &dyn Generator,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> Result<TransformationResult, TailorError> {
    let span = tracing::info_span!("transform", request_id = %request.request_id);
    run(request, generator, config, cancel).instrument(span).await
}

async fn run(
    request: TransformationRequest,
    generator: &dyn Generator,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> Result<TransformationResult, TailorError> {
    config.validate()?;
    let TransformationRequest {
        request_id,
        source,
        target,
    } = request;

    let baseline = extract(&source)?;
    info!(
        work_entries = baseline.immutable.work_history.len(),
        skills = baseline.verifiable.skills.len(),
        "Fact baseline extracted"
    );

    let scorer = KeywordRelevanceScorer::from_config(config);
    let ranking = rank_sections(&source, &target, &scorer);
    let builder = InstructionBuilder::new(&source, &target, &ranking, config)?;

    let deadline = Instant::now() + config.run_budget;
    let mut attempt_log: Vec<AttemptRecord> = Vec::new();
    let mut last_report: Vec<ValidationViolation> = Vec::new();
    let mut delay_before = Duration::ZERO;

    let mut state = State::Build {
        attempt: 1,
        feedback: Feedback::None,
    };

    loop {
        state = match state {
            State::Build { attempt, feedback } => {
                if cancel.is_cancelled() {
                    info!(attempt, "Cancelled before attempt");
                    State::Fail {
                        attempts: attempt - 1,
                        reason: FailureReason::Cancelled,
                    }
                } else {
                    info!(attempt, max_attempts = config.max_attempts, "Starting attempt");
                    State::Generate {
                        attempt,
                        instruction: builder.build(&feedback),
                    }
                }
            }

            State::Generate {
                attempt,
                instruction,
            } => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    warn!(attempt, "Run budget exhausted before generation");
                    State::Fail {
                        attempts: attempt - 1,
                        reason: FailureReason::BudgetExhausted,
                    }
                } else {
                    let limit = config.attempt_timeout.min(remaining);
                    let outcome = tokio::select! {
                        _ = cancel.cancelled() => None,
                        result = tokio::time::timeout(limit, generator.generate(&instruction)) => {
                            Some(result.unwrap_or(Err(GenerationError::Timeout)))
                        }
                    };

                    match outcome.map(|r| r.and_then(|doc| check_schema(doc, &source))) {
                        None => {
                            info!(attempt, "Cancelled during generation");
                            State::Fail {
                                attempts: attempt,
                                reason: FailureReason::Cancelled,
                            }
                        }
                        Some(Ok(candidate)) => State::Validate { attempt, candidate },
                        Some(Err(error)) => {
                            warn!(attempt, error = %error, "Generation failed");
                            attempt_log.push(AttemptRecord {
                                attempt,
                                outcome: AttemptOutcome::GenerationError,
                                generation_error: Some(error.kind()),
                                error_count: 0,
                                warning_count: 0,
                                delay_before_ms: delay_before.as_millis() as u64,
                            });
                            State::Retry {
                                attempt,
                                feedback: Feedback::GenerationFailure { attempt, error },
                            }
                        }
                    }
                }
            }

            State::Validate { attempt, candidate } => {
                let report = validate_with(&candidate, &baseline, &source, &config.style);
                let error_count = errors(&report).count();
                let warning_count = warnings(&report).count();
                info!(attempt, error_count, warning_count, "Candidate validated");

                let failed = has_errors(&report);
                attempt_log.push(AttemptRecord {
                    attempt,
                    outcome: if failed {
                        AttemptOutcome::Violations
                    } else {
                        AttemptOutcome::Accepted
                    },
                    generation_error: None,
                    error_count,
                    warning_count,
                    delay_before_ms: delay_before.as_millis() as u64,
                });

                if failed {
                    for v in errors(&report) {
                        debug!(attempt, violation = %v.describe(), "Validation error");
                    }
                    let feedback =
                        Feedback::from_report(attempt, &report, config.max_feedback_violations);
                    last_report = report;
                    State::Retry { attempt, feedback }
                } else {
                    State::Accept {
                        attempts: attempt,
                        document: candidate,
                        report,
                    }
                }
            }

            State::Retry { attempt, feedback } => {
                if attempt >= config.max_attempts {
                    warn!(attempt, "No attempts remaining");
                    State::Fail {
                        attempts: attempt,
                        reason: FailureReason::AttemptsExhausted,
                    }
                } else {
                    let delay = config.delay_after(attempt);
                    if Instant::now() + delay >= deadline {
                        warn!(attempt, delay_ms = delay.as_millis() as u64, "Run budget cannot cover backoff");
                        State::Fail {
                            attempts: attempt,
                            reason: FailureReason::BudgetExhausted,
                        }
                    } else {
                        info!(attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                        let cancelled = tokio::select! {
                            _ = cancel.cancelled() => true,
                            _ = tokio::time::sleep(delay) => false,
                        };
                        if cancelled {
                            info!(attempt, "Cancelled during backoff");
                            State::Fail {
                                attempts: attempt,
                                reason: FailureReason::Cancelled,
                            }
                        } else {
                            delay_before = delay;
                            State::Build {
                                attempt: attempt + 1,
                                feedback,
                            }
                        }
                    }
                }
            }

            State::Accept {
                attempts,
                document,
                report,
            } => {
                info!(attempts, warnings = report.len(), "Transformation accepted");
                return Ok(TransformationResult {
                    request_id,
                    keyword_match_count: keyword_match_count(&document, &target),
                    modified_sections: modified_sections(&document),
                    document: Some(document),
                    violations: report,
                    attempts,
                    succeeded: true,
                    failure: None,
                    attempt_log,
                    generated_at: Utc::now(),
                });
            }

            State::Fail { attempts, reason } => {
                warn!(attempts, reason = ?reason, "Transformation failed");
                return Ok(TransformationResult {
                    request_id,
                    document: None,
                    violations: last_report,
                    attempts,
                    succeeded: false,
                    keyword_match_count: 0,
                    modified_sections: Vec::new(),
                    failure: Some(reason),
                    attempt_log,
                    generated_at: Utc::now(),
                });
            }
        };
    }
}

/// Structural checks the validation engine does not cover: the echoed
/// `original_bullets` must equal the source bullets for every index-aligned
/// entry, and skill scores must be finite and within `[0, 1]`.
fn check_schema(
    candidate: TransformedDocument,
    source: &SourceDocument,
) -> Result<TransformedDocument, GenerationError> {
    for (i, (entry, original)) in candidate
        .work_history
        .iter()
        .zip(&source.work_history)
        .enumerate()
    {
        if entry.original_bullets != original.bullets {
            return Err(GenerationError::SchemaViolation(format!(
                "work_history[{i}].original_bullets does not echo the source bullets"
            )));
        }
    }

    for (i, skill) in candidate.skills.iter().enumerate() {
        if !skill.relevance_score.is_finite() || !(0.0..=1.0).contains(&skill.relevance_score) {
            return Err(GenerationError::SchemaViolation(format!(
                "skills[{i}].relevance_score {} is outside [0, 1]",
                skill.relevance_score
            )));
        }
    }

    Ok(candidate)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::grounding::violation::ViolationRule;
    use crate::models::resume::fixtures::acme_source;
    use crate::models::transformed::fixtures::mirror;

    /// Replays a fixed script of responses and records every instruction.
    struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<TransformedDocument, GenerationError>>>,
        seen: Mutex<Vec<GenerationInstruction>>,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<Result<TransformedDocument, GenerationError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.prompt.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(
            &self,
            instruction: &GenerationInstruction,
        ) -> Result<TransformedDocument, GenerationError> {
            self.seen.lock().unwrap().push(instruction.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
        }
    }

    /// Never answers.
    struct HangingGenerator;

    #[async_trait]
    impl Generator for HangingGenerator {
        async fn generate(
            &self,
            _instruction: &GenerationInstruction,
        ) -> Result<TransformedDocument, GenerationError> {
            std::future::pending().await
        }
    }

    /// Fails once and cancels the run from inside the call.
    struct CancellingGenerator(CancellationToken);

    #[async_trait]
    impl Generator for CancellingGenerator {
        async fn generate(
            &self,
            _instruction: &GenerationInstruction,
        ) -> Result<TransformedDocument, GenerationError> {
            self.0.cancel();
            Err(GenerationError::RateLimited)
        }
    }

    fn request() -> TransformationRequest {
        TransformationRequest::new(
            acme_source(),
            TargetSpec {
                title: "Backend Engineer".to_string(),
                requirements: vec!["Python".to_string(), "AWS".to_string()],
                ..TargetSpec::default()
            },
        )
    }

    fn reworded() -> TransformedDocument {
        let mut doc = mirror(&acme_source());
        doc.work_history[0].bullets = vec![
            "Developed billing services in Python running on AWS".to_string(),
            "Reduced deploy time from 40 minutes to 5 minutes".to_string(),
        ];
        doc.summary = Some("Backend engineer building reliable Python services.".to_string());
        doc
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_try_success_applies_no_delay() {
        let generator = ScriptedGenerator::new(vec![Ok(reworded())]);
        let started = Instant::now();
        let result = transform(request(), &generator, &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.attempts, 1);
        assert!(result.violations.iter().all(|v| !v.is_error()));
        assert!(result.failure.is_none());
        assert_eq!(result.attempt_log.len(), 1);
        assert_eq!(result.attempt_log[0].outcome, AttemptOutcome::Accepted);
        assert_eq!(result.attempt_log[0].delay_before_ms, 0);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(
            result.modified_sections,
            vec!["summary".to_string(), "work_history[0]".to_string()]
        );
        assert!(result.keyword_match_count >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_timeouts_then_success() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationError::Timeout),
            Err(GenerationError::Timeout),
            Ok(reworded()),
        ]);
        let started = Instant::now();
        let result = transform(request(), &generator, &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.attempts, 3);
        let delays: Vec<u64> = result.attempt_log.iter().map(|r| r.delay_before_ms).collect();
        assert_eq!(delays, vec![0, 1000, 2000]);
        assert_eq!(
            result.attempt_log[0].generation_error,
            Some(GenerationErrorKind::Timeout)
        );
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_metric_triggers_retry_with_feedback() {
        let mut inflated = reworded();
        inflated.work_history[0].bullets[0] = "Reduced costs by 47%".to_string();
        let generator = ScriptedGenerator::new(vec![Ok(inflated), Ok(reworded())]);

        let result = transform(request(), &generator, &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.attempt_log[0].outcome, AttemptOutcome::Violations);
        assert_eq!(result.attempt_log[0].error_count, 1);

        let prompts = generator.prompts();
        assert!(!prompts[0].contains("CORRECTIONS REQUIRED"));
        assert!(prompts[1].contains("CORRECTIONS REQUIRED"));
        assert!(prompts[1].contains("Unsupported metric"));
        assert!(prompts[1].contains("47%"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_fail_with_last_report() {
        let mut renamed = reworded();
        renamed.work_history[0].company = "Acme".to_string();
        let generator = ScriptedGenerator::new(vec![
            Ok(renamed.clone()),
            Ok(renamed.clone()),
            Ok(renamed),
        ]);
        let started = Instant::now();
        let result = transform(request(), &generator, &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert!(result.document.is_none());
        assert_eq!(result.attempts, 3);
        assert_eq!(result.failure, Some(FailureReason::AttemptsExhausted));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule, ViolationRule::FieldMismatch);
        assert_eq!(result.violations[0].expected.as_deref(), Some("Acme Corp"));
        // no backoff after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_errors_exhaust_attempts() {
        let generator = ScriptedGenerator::new(vec![]);
        let result = transform(request(), &generator, &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 3);
        assert!(result.violations.is_empty());
        assert!(result
            .attempt_log
            .iter()
            .all(|r| r.generation_error == Some(GenerationErrorKind::Transport)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_echo_is_a_schema_violation() {
        let mut broken = reworded();
        broken.work_history[0].original_bullets = vec!["made up".to_string()];
        let generator = ScriptedGenerator::new(vec![Ok(broken), Ok(reworded())]);
        let result = transform(request(), &generator, &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.attempts, 2);
        assert_eq!(
            result.attempt_log[0].generation_error,
            Some(GenerationErrorKind::SchemaViolation)
        );
        assert!(generator.prompts()[1].contains("original_bullets does not echo"));
    }

    #[test]
    fn test_out_of_range_skill_score_is_a_schema_violation() {
        let mut broken = reworded();
        broken.skills[0].relevance_score = 1.5;
        assert!(matches!(
            check_schema(broken, &acme_source()),
            Err(GenerationError::SchemaViolation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let generator = ScriptedGenerator::new(vec![Ok(reworded())]);
        let result = transform(request(), &generator, &EngineConfig::default(), &cancel)
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 0);
        assert_eq!(result.failure, Some(FailureReason::Cancelled));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_further_attempts() {
        let cancel = CancellationToken::new();
        let generator = CancellingGenerator(cancel.clone());
        let result = transform(request(), &generator, &EngineConfig::default(), &cancel)
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.failure, Some(FailureReason::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_budget_bounds_hanging_generator() {
        let config = EngineConfig {
            run_budget: Duration::from_secs(100),
            ..EngineConfig::default()
        };
        let started = Instant::now();
        let result = transform(request(), &HangingGenerator, &config, &CancellationToken::new())
            .await
            .unwrap();

        // 60s timeout, 1s backoff, 39s capped timeout, then no room for the 2s backoff
        assert!(!result.succeeded);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.failure, Some(FailureReason::BudgetExhausted));
        assert_eq!(started.elapsed(), Duration::from_secs(100));
    }

    #[tokio::test]
    async fn test_malformed_source_is_an_error() {
        let mut req = request();
        req.source.contact.email = "  ".to_string();
        let generator = ScriptedGenerator::new(vec![Ok(reworded())]);
        let err = transform(req, &generator, &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TailorError::MalformedSource { .. }));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error() {
        let config = EngineConfig {
            max_attempts: 0,
            ..EngineConfig::default()
        };
        let generator = ScriptedGenerator::new(vec![]);
        let err = transform(request(), &generator, &config, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TailorError::InvalidConfig(_)));
    }
}
