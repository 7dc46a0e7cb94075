use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::TailorError;
use crate::grounding::style::DEFAULT_CLICHES;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights of the three relevance sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub keyword: f64,
    pub skill: f64,
    pub experience: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword: 0.40,
            skill: 0.35,
            experience: 0.25,
        }
    }
}

/// Thresholds for the style/anomaly checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Words and phrases flagged as clichés (matched case-insensitively on word boundaries).
    pub cliches: Vec<String>,
    /// Variance and parallelism checks only run on entries with at least this many bullets.
    pub min_bullets_for_pattern_checks: usize,
    /// Population variance of bullet word counts below which an entry is flagged.
    pub word_count_variance_threshold: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            cliches: DEFAULT_CLICHES.iter().map(|c| c.to_string()).collect(),
            min_bullets_for_pattern_checks: 3,
            word_count_variance_threshold: 2.0,
        }
    }
}

/// Caller-supplied configuration for one `transform` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `retry_delays[n - 1]`; the last entry is
    /// reused when the list is shorter than `max_attempts - 1`.
    pub retry_delays: Vec<Duration>,
    pub fuzzy_match_threshold: f64,
    pub weights: ScoringWeights,
    pub attempt_timeout: Duration,
    /// Wall-clock budget for all attempts plus backoff delays.
    pub run_budget: Duration,
    /// Cap on ERROR violations fed back into the next instruction.
    pub max_feedback_violations: usize,
    pub style: StyleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delays: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
            fuzzy_match_threshold: 0.80,
            weights: ScoringWeights::default(),
            attempt_timeout: Duration::from_secs(60),
            run_budget: Duration::from_secs(300),
            max_feedback_violations: 5,
            style: StyleConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Rejects configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), TailorError> {
        if self.max_attempts == 0 {
            return Err(TailorError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let w = &self.weights;
        if [w.keyword, w.skill, w.experience]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(TailorError::InvalidConfig(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }
        let sum = w.keyword + w.skill + w.experience;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(TailorError::InvalidConfig(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }

        if !(0.0..=1.0).contains(&self.fuzzy_match_threshold) {
            return Err(TailorError::InvalidConfig(format!(
                "fuzzy_match_threshold must be within [0, 1], got {}",
                self.fuzzy_match_threshold
            )));
        }

        Ok(())
    }

    /// Backoff applied after attempt number `attempt` (1-based) fails.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let idx = attempt.saturating_sub(1) as usize;
        self.retry_delays
            .get(idx)
            .or_else(|| self.retry_delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// Process configuration for the `tailor` binary, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub rust_log: String,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut engine = EngineConfig::default();
        if let Some(v) = optional_env::<u32>("TAILOR_MAX_ATTEMPTS")? {
            engine.max_attempts = v;
        }
        if let Some(v) = optional_env::<f64>("TAILOR_FUZZY_THRESHOLD")? {
            engine.fuzzy_match_threshold = v;
        }
        if let Some(v) = optional_env::<u64>("TAILOR_ATTEMPT_TIMEOUT_SECS")? {
            engine.attempt_timeout = Duration::from_secs(v);
        }
        if let Some(v) = optional_env::<u64>("TAILOR_RUN_BUDGET_SECS")? {
            engine.run_budget = Duration::from_secs(v);
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            engine,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(None),
    }
}
