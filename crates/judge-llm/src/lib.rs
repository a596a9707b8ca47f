//! Remote judge client for OpenAI-compatible chat completion APIs.
//!
//! Defaults to OpenRouter. The client implements [`judge_core::ChatBackend`]
//! so the judge can be driven by it or by any test double.

mod client;

pub use client::OpenRouterClient;
