//! Ensemble judging of candidate completions.
//!
//! A [`Judge`] composes an evaluation prompt, asks a remote model for a
//! verdict several times, parses each reply into an index, and returns the
//! majority answer.
//!
//! ```rust,ignore
//! use judge_config::JudgeConfig;
//! use judge_engine::Judge;
//!
//! let judge = Judge::from_config(&JudgeConfig::from_env())?;
//! let best = judge
//!     .judge_completions("Summarize the article.", &[first, second, third])
//!     .await?;
//! ```

mod judge;
pub mod parse;
pub mod prompts;
pub mod vote;

pub use judge::Judge;
pub use judge_core::{JudgeError, JudgingRequest, Verdict, Vote, VoteOutcome};
pub use parse::VerdictParser;
pub use vote::{majority, VoteTally};
