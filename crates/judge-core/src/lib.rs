//! Core domain types, error definitions, and the chat backend trait.
//!
//! This crate defines the types shared across the judge workspace:
//! errors, judging requests, votes and verdicts, generation parameters,
//! and the abstraction over the remote chat-completion service.

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of completions a single request may carry.
///
/// Answers are single digits, so indices stop at 9.
pub const MAX_COMPLETIONS: usize = 10;

/// Index substituted when an attempt fails or cannot be parsed.
pub const FALLBACK_INDEX: usize = 0;

/// Errors that can occur while judging completions.
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("Invalid judging request: {0}")]
    InvalidRequest(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Failed to parse verdict: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A prompt and the ordered completions competing for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgingRequest {
    prompt: String,
    completions: Vec<String>,
}

impl JudgingRequest {
    /// Creates a request, rejecting empty or oversized completion lists.
    pub fn new(prompt: impl Into<String>, completions: Vec<String>) -> Result<Self, JudgeError> {
        if completions.is_empty() {
            return Err(JudgeError::InvalidRequest("no completions to judge".into()));
        }
        if completions.len() > MAX_COMPLETIONS {
            return Err(JudgeError::InvalidRequest(format!(
                "{} completions given, at most {} supported",
                completions.len(),
                MAX_COMPLETIONS
            )));
        }
        Ok(Self { prompt: prompt.into(), completions })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn completions(&self) -> &[String] {
        &self.completions
    }

    /// Number of completions; valid indices are `0..count()`.
    pub fn count(&self) -> usize {
        self.completions.len()
    }

    /// Highest valid index.
    pub fn max_index(&self) -> usize {
        self.completions.len() - 1
    }
}

/// How the judge is asked to present its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnswerPolicy {
    /// A bare digit and nothing else.
    Direct,
    /// A visible scorecard followed by `<final_answer>N</final_answer>`.
    #[default]
    Reasoning,
}

impl FromStr for AnswerPolicy {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "reasoning" => Ok(Self::Reasoning),
            other => Err(JudgeError::Config(format!("unknown answer policy: {other}"))),
        }
    }
}

/// Which evaluation rubric heads the judging prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rubric {
    /// Instruction adherence, writing quality, intent fulfillment.
    Basic,
    /// Five criteria in strict priority order, correctness first.
    #[default]
    Prioritized,
}

impl FromStr for Rubric {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "prioritized" => Ok(Self::Prioritized),
            other => Err(JudgeError::Config(format!("unknown rubric: {other}"))),
        }
    }
}

/// Whether ensemble attempts run one after another or all at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Concurrent,
}

impl FromStr for ExecutionMode {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(JudgeError::Config(format!("unknown execution mode: {other}"))),
        }
    }
}

/// Sampling settings sent with every judging call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Low-variance defaults sized to the expected output of each policy.
    pub fn for_policy(policy: AnswerPolicy) -> Self {
        match policy {
            AnswerPolicy::Direct => Self { temperature: 0.0, top_p: None, max_tokens: 5 },
            AnswerPolicy::Reasoning => Self { temperature: 0.3, top_p: Some(0.5), max_tokens: 4096 },
        }
    }
}

/// Token usage and timing metrics from an LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

impl LlmMetrics {
    /// Adds another call's usage to this total.
    pub fn accumulate(&mut self, other: &LlmMetrics) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.elapsed_ms = self.elapsed_ms.saturating_add(other.elapsed_ms);
    }
}

/// Complete response from an LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub metrics: LlmMetrics,
}

/// How a single vote came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// The response contained a well-formed, in-range answer.
    Parsed,
    /// The response had no recognizable answer.
    Unparseable { reason: String },
    /// The remote call itself failed.
    CallFailed { reason: String },
}

/// One attempt's contribution to the ensemble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub index: usize,
    pub outcome: VoteOutcome,
    #[serde(default)]
    pub metrics: LlmMetrics,
}

impl Vote {
    pub fn parsed(index: usize, metrics: LlmMetrics) -> Self {
        Self { index, outcome: VoteOutcome::Parsed, metrics }
    }

    pub fn unparseable(reason: impl ToString, metrics: LlmMetrics) -> Self {
        Self {
            index: FALLBACK_INDEX,
            outcome: VoteOutcome::Unparseable { reason: reason.to_string() },
            metrics,
        }
    }

    pub fn call_failed(reason: impl ToString) -> Self {
        Self {
            index: FALLBACK_INDEX,
            outcome: VoteOutcome::CallFailed { reason: reason.to_string() },
            metrics: LlmMetrics::default(),
        }
    }

    /// True when the index is the fallback rather than the model's answer.
    pub fn is_fallback(&self) -> bool {
        !matches!(self.outcome, VoteOutcome::Parsed)
    }
}

/// Final answer of a judging call together with the votes behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub index: usize,
    pub votes: Vec<Vote>,
    pub metrics: LlmMetrics,
}

impl Verdict {
    pub fn attempts(&self) -> usize {
        self.votes.len()
    }

    pub fn fallback_count(&self) -> usize {
        self.votes.iter().filter(|v| v.is_fallback()).count()
    }

    /// Attempts that produced a real answer.
    pub fn succeeded(&self) -> usize {
        self.attempts() - self.fallback_count()
    }

    /// True when at least one attempt fell back to the default index.
    pub fn is_degraded(&self) -> bool {
        self.fallback_count() > 0
    }

    /// True when no attempt produced a real answer, so `index` is the fallback.
    pub fn all_failed(&self) -> bool {
        self.succeeded() == 0
    }
}

/// Remote text-generation capability the judge delegates to.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends `prompt` as the sole user message and returns the trimmed reply.
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<LlmResponse, JudgeError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
