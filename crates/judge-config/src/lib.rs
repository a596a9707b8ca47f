//! Judge configuration schema and loading.
//!
//! A [`JudgeConfig`] names the remote model, where to reach it, which
//! environment variable holds the credential, and how the ensemble runs.
//! Every field has a default, so partial JSON files and sparse environments
//! both work.

use std::env;
use std::fs;
use std::path::Path;

use judge_core::{AnswerPolicy, ExecutionMode, GenerationParams, Rubric};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_SAMPLES: u32 = 5;

/// Upper bound on sampling temperature; judging favors reproducibility.
pub const MAX_TEMPERATURE: f32 = 0.3;

/// Configuration parsing and loading errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing API credential: set {0}")]
    MissingCredential(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Settings for one judge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub samples: u32,
    pub policy: AnswerPolicy,
    pub rubric: Rubric,
    pub execution: ExecutionMode,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            api_base: DEFAULT_API_BASE.into(),
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            samples: DEFAULT_SAMPLES,
            policy: AnswerPolicy::default(),
            rubric: Rubric::default(),
            execution: ExecutionMode::default(),
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }
}

impl JudgeConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: JudgeConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `JUDGE_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies `JUDGE_MODEL`, `JUDGE_API_BASE`, `JUDGE_SAMPLES`,
    /// `JUDGE_POLICY`, `JUDGE_RUBRIC` and `JUDGE_EXECUTION` from `lookup`.
    /// Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(model) = lookup("JUDGE_MODEL") {
            self.model = model;
        }
        if let Some(base) = lookup("JUDGE_API_BASE") {
            self.api_base = base;
        }
        if let Some(raw) = lookup("JUDGE_SAMPLES") {
            match raw.trim().parse() {
                Ok(n) => self.samples = n,
                Err(_) => warn!("CONFIG: ignoring JUDGE_SAMPLES={raw}"),
            }
        }
        if let Some(raw) = lookup("JUDGE_POLICY") {
            match raw.parse() {
                Ok(policy) => self.policy = policy,
                Err(e) => warn!("CONFIG: ignoring JUDGE_POLICY: {e}"),
            }
        }
        if let Some(raw) = lookup("JUDGE_RUBRIC") {
            match raw.parse() {
                Ok(rubric) => self.rubric = rubric,
                Err(e) => warn!("CONFIG: ignoring JUDGE_RUBRIC: {e}"),
            }
        }
        if let Some(raw) = lookup("JUDGE_EXECUTION") {
            match raw.parse() {
                Ok(execution) => self.execution = execution,
                Err(e) => warn!("CONFIG: ignoring JUDGE_EXECUTION: {e}"),
            }
        }
        self
    }

    /// Rejects sampling overrides outside the low-variance range:
    /// temperature in `0.0..=0.3`, top_p in `(0.0, 1.0]`, max_tokens above zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.temperature {
            if !(0.0..=MAX_TEMPERATURE).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "temperature {t} outside 0.0..={MAX_TEMPERATURE}"
                )));
            }
        }
        if let Some(p) = self.top_p {
            if p.is_nan() || p <= 0.0 || p > 1.0 {
                return Err(ConfigError::Invalid(format!("top_p {p} outside (0.0, 1.0]")));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigError::Invalid("max_tokens must be at least 1".into()));
        }
        Ok(())
    }

    /// Number of ensemble attempts, never less than one.
    pub fn effective_samples(&self) -> usize {
        self.samples.max(1) as usize
    }

    /// Policy defaults with any explicit overrides applied.
    pub fn generation_params(&self) -> GenerationParams {
        let mut params = GenerationParams::for_policy(self.policy);
        if let Some(t) = self.temperature {
            params.temperature = t;
        }
        if self.top_p.is_some() {
            params.top_p = self.top_p;
        }
        if let Some(m) = self.max_tokens {
            params.max_tokens = m;
        }
        params
    }

    /// Reads the API credential named by `api_key_env`.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(self.api_key_env.clone()))
    }
}
