//! Extraction of a bounded index from free-form judge output.
//!
//! Grammar per policy:
//! - direct: the whole reply is an in-range integer, or else the first
//!   in-range digit anywhere in the reply
//! - reasoning: `<final_answer>` + optional whitespace + one in-range digit
//!   + optional whitespace + `</final_answer>`, first occurrence wins

use judge_core::{AnswerPolicy, JudgeError, LlmResponse, Vote};
use regex::Regex;

/// Parser for one request's valid index range.
#[derive(Debug, Clone)]
pub struct VerdictParser {
    policy: AnswerPolicy,
    max_index: usize,
    final_answer: Regex,
}

impl VerdictParser {
    /// `count` is the number of completions and must be between 1 and 10.
    pub fn new(count: usize, policy: AnswerPolicy) -> Result<Self, JudgeError> {
        if count == 0 || count > judge_core::MAX_COMPLETIONS {
            return Err(JudgeError::InvalidRequest(format!(
                "cannot parse answers for {count} completions"
            )));
        }
        let max_index = count - 1;
        let pattern = format!(r"<final_answer>\s*([0-{max_index}])\s*</final_answer>");
        let final_answer = Regex::new(&pattern).map_err(|e| JudgeError::Parse(e.to_string()))?;
        Ok(Self { policy, max_index, final_answer })
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.policy
    }

    /// Extracts the index from `text` or explains why it could not.
    pub fn parse(&self, text: &str) -> Result<usize, JudgeError> {
        match self.policy {
            AnswerPolicy::Direct => self.parse_direct(text),
            AnswerPolicy::Reasoning => self.parse_tagged(text),
        }
    }

    /// Turns a model reply into a vote, substituting the fallback index on failure.
    pub fn vote(&self, response: &LlmResponse) -> Vote {
        match self.parse(&response.content) {
            Ok(index) => Vote::parsed(index, response.metrics),
            Err(e) => Vote::unparseable(e, response.metrics),
        }
    }

    fn parse_direct(&self, text: &str) -> Result<usize, JudgeError> {
        let trimmed = text.trim();
        if let Ok(n) = trimmed.parse::<usize>() {
            if n <= self.max_index {
                return Ok(n);
            }
        }

        trimmed
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| d as usize)
            .find(|&d| d <= self.max_index)
            .ok_or_else(|| {
                JudgeError::Parse(format!("no digit between 0 and {} in reply", self.max_index))
            })
    }

    fn parse_tagged(&self, text: &str) -> Result<usize, JudgeError> {
        let caps = self.final_answer.captures(text).ok_or_else(|| {
            JudgeError::Parse(format!(
                "no <final_answer> tag with a digit between 0 and {}",
                self.max_index
            ))
        })?;

        caps[1]
            .parse()
            .map_err(|e: std::num::ParseIntError| JudgeError::Parse(e.to_string()))
    }
}
