//! Judges a small fixed set of completions against OpenRouter.
//!
//! Needs `OPENROUTER_API_KEY` in the environment or a `.env` file.
//! Set `RUST_LOG=debug` to see raw judge replies.

use anyhow::Result;
use judge_config::JudgeConfig;
use judge_engine::{Judge, JudgingRequest};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = JudgeConfig::from_env();
    let judge = Judge::from_config(&config)?;

    let request = JudgingRequest::new(
        "In one sentence, why does Rust not need a garbage collector?",
        vec![
            "Rust uses reference counting for every value, so it never needs a collector.".into(),
            "Ownership rules let the compiler insert frees at the end of each owner's scope, so memory is reclaimed deterministically without a runtime collector.".into(),
            "Because Rust programs are small.".into(),
        ],
    )?;

    let verdict = judge.judge(&request).await;
    info!(
        "Best completion: {} ({}/{} attempts parsed, {} output tokens)",
        verdict.index,
        verdict.succeeded(),
        verdict.attempts(),
        verdict.metrics.output_tokens
    );
    println!("{}", verdict.index);

    Ok(())
}
