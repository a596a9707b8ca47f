//! OpenAI-compatible chat client pointed at OpenRouter.
//!
//! Sends the judging prompt as a single user message and returns the
//! trimmed reply along with token usage and latency.

use std::time::{Duration, Instant};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use judge_config::JudgeConfig;
use judge_core::{ChatBackend, GenerationParams, JudgeError, LlmMetrics, LlmResponse};
use tracing::{debug, info};

/// Converts any error into a JudgeError::Llm.
fn llm_err(e: impl ToString) -> JudgeError {
    JudgeError::Llm(e.to_string())
}

/// Backoff that gives up immediately, so a rate-limited call fails once
/// instead of being retried inside the SDK.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Builds a one-turn request carrying the prompt and sampling settings.
#[allow(deprecated)]
fn build_request(
    model: &str,
    prompt: &str,
    params: &GenerationParams,
) -> Result<CreateChatCompletionRequest, JudgeError> {
    let message = ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(llm_err)?,
    );

    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(model)
        .messages(vec![message])
        .temperature(params.temperature)
        .max_tokens(params.max_tokens);
    if let Some(top_p) = params.top_p {
        args.top_p(top_p);
    }
    args.build().map_err(llm_err)
}

/// Extracts trimmed content and metrics from a completion response.
fn extract_response(response: CreateChatCompletionResponse, elapsed_ms: u64) -> Result<LlmResponse, JudgeError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .ok_or_else(|| JudgeError::Llm("No response content".into()))?;

    let (input_tokens, output_tokens) = response
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    info!(
        "LLM: {}ms, tokens: {}/{} (in/out)",
        elapsed_ms, input_tokens, output_tokens
    );

    Ok(LlmResponse {
        content,
        metrics: LlmMetrics { input_tokens, output_tokens, elapsed_ms },
    })
}

/// Client for OpenRouter's OpenAI-compatible chat completion API.
pub struct OpenRouterClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenRouterClient {
    /// Creates a client for `model` at `api_base` using `api_key`.
    pub fn new(model: &str, api_base: &str, api_key: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);

        Self {
            client: Client::with_config(config).with_backoff(no_retry()),
            model: model.to_string(),
        }
    }

    /// Creates a client from a judge config, reading the credential from the environment.
    pub fn from_config(config: &JudgeConfig) -> Result<Self, JudgeError> {
        let api_key = config
            .api_key()
            .map_err(|e| JudgeError::Config(e.to_string()))?;
        Ok(Self::new(&config.model, &config.api_base, &api_key))
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<LlmResponse, JudgeError> {
        let start = Instant::now();
        let request = build_request(&self.model, prompt, params)?;

        let response = self.client.chat().create(request).await.map_err(llm_err)?;
        let llm_response = extract_response(response, start.elapsed().as_millis() as u64)?;

        debug!("Judge response: {}", llm_response.content);
        Ok(llm_response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
