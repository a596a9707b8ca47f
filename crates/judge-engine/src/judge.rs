use std::sync::Arc;

use futures::future::join_all;
use judge_config::JudgeConfig;
use judge_core::{
    AnswerPolicy, ChatBackend, ExecutionMode, GenerationParams, JudgeError, JudgingRequest,
    LlmMetrics, Rubric, Verdict, Vote, FALLBACK_INDEX,
};
use judge_llm::OpenRouterClient;
use tracing::{debug, info, warn};

use crate::parse::VerdictParser;
use crate::prompts::compose;
use crate::vote::{majority, VoteTally};

/// Picks the strongest completion by polling a remote model several times
/// and taking the majority answer.
///
/// Remote and parse failures never escape: each failed attempt votes for
/// the fallback index instead. Inspect the returned [`Verdict`] to tell a
/// real win for completion 0 from a degraded judgment.
pub struct Judge {
    backend: Arc<dyn ChatBackend>,
    samples: usize,
    rubric: Rubric,
    policy: AnswerPolicy,
    params: GenerationParams,
    execution: ExecutionMode,
}

impl Judge {
    /// Creates a judge around an existing backend handle.
    pub fn new(backend: Arc<dyn ChatBackend>, config: &JudgeConfig) -> Self {
        Self {
            backend,
            samples: config.effective_samples(),
            rubric: config.rubric,
            policy: config.policy,
            params: config.generation_params(),
            execution: config.execution,
        }
    }

    /// Creates a judge backed by the OpenRouter client described in `config`.
    pub fn from_config(config: &JudgeConfig) -> Result<Self, JudgeError> {
        config.validate().map_err(|e| JudgeError::Config(e.to_string()))?;
        let client = OpenRouterClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the index of the best completion, always within `0..completions.len()`.
    ///
    /// Fails only when the input itself is unusable (no completions, or more
    /// than [`judge_core::MAX_COMPLETIONS`]).
    pub async fn judge_completions(&self, prompt: &str, completions: &[String]) -> Result<usize, JudgeError> {
        let request = JudgingRequest::new(prompt, completions.to_vec())?;
        Ok(self.judge(&request).await.index)
    }

    /// Runs the full ensemble and returns the majority verdict with every vote.
    pub async fn judge(&self, request: &JudgingRequest) -> Verdict {
        info!(
            "JUDGE: {} completions, {} samples, model {}",
            request.count(),
            self.samples,
            self.backend.model_name()
        );

        let parser = match VerdictParser::new(request.count(), self.policy) {
            Ok(parser) => parser,
            Err(e) => {
                warn!("JUDGE: {e}, falling back to index {FALLBACK_INDEX}");
                return Verdict { index: FALLBACK_INDEX, votes: Vec::new(), metrics: LlmMetrics::default() };
            }
        };
        let prompt = compose(request, self.rubric, self.policy);

        let votes = match self.execution {
            ExecutionMode::Sequential => {
                let mut votes = Vec::with_capacity(self.samples);
                for attempt in 1..=self.samples {
                    votes.push(self.attempt(attempt, &prompt, &parser).await);
                }
                votes
            }
            ExecutionMode::Concurrent => {
                join_all((1..=self.samples).map(|attempt| self.attempt(attempt, &prompt, &parser))).await
            }
        };

        let index = majority(&votes).unwrap_or(FALLBACK_INDEX);
        let mut metrics = LlmMetrics::default();
        for vote in &votes {
            metrics.accumulate(&vote.metrics);
        }

        let verdict = Verdict { index, votes, metrics };
        let tally: VoteTally = verdict.votes.iter().map(|v| v.index).collect();
        info!(
            "JUDGE: Verdict = {} (tally {:?}, {}/{} attempts parsed)",
            verdict.index,
            tally.counts(),
            verdict.succeeded(),
            verdict.attempts()
        );
        if verdict.all_failed() {
            warn!("JUDGE: every attempt fell back, verdict {} is not a judgment", verdict.index);
        }

        verdict
    }

    /// Single-call variant: one compose → call → parse cycle.
    pub async fn judge_once(&self, request: &JudgingRequest) -> Vote {
        match VerdictParser::new(request.count(), self.policy) {
            Ok(parser) => {
                let prompt = compose(request, self.rubric, self.policy);
                self.attempt(1, &prompt, &parser).await
            }
            Err(e) => Vote::unparseable(e, LlmMetrics::default()),
        }
    }

    async fn attempt(&self, attempt: usize, prompt: &str, parser: &VerdictParser) -> Vote {
        let response = match self.backend.complete(prompt, &self.params).await {
            Ok(response) => response,
            Err(e) => {
                warn!("JUDGE: attempt {attempt} failed: {e}");
                return Vote::call_failed(e);
            }
        };

        let vote = parser.vote(&response);
        if vote.is_fallback() {
            warn!("JUDGE: attempt {attempt} unparseable, voting {}", vote.index);
            debug!("JUDGE: unparseable reply: {}", response.content);
        } else {
            debug!("JUDGE: attempt {attempt} voted {}", vote.index);
        }
        vote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use judge_core::{LlmResponse, VoteOutcome};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedBackend {
        replies: Mutex<Vec<Result<String, String>>>,
        seen: Mutex<Vec<(String, GenerationParams)>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<LlmResponse, JudgeError> {
            self.seen.lock().unwrap().push((prompt.to_string(), *params));
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(JudgeError::Llm("No more scripted replies".into()));
            }
            let content = replies.remove(0).map_err(JudgeError::Llm)?;
            Ok(LlmResponse {
                content,
                metrics: LlmMetrics { input_tokens: 100, output_tokens: 10, elapsed_ms: 5 },
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatBackend for CountingBackend {
        async fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<LlmResponse, JudgeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LlmResponse {
                content: format!("<final_answer>{}</final_answer>", n % 2),
                metrics: LlmMetrics::default(),
            })
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn request(n: usize) -> JudgingRequest {
        JudgingRequest::new("prompt", (0..n).map(|i| format!("c{i}")).collect()).unwrap()
    }

    fn tagged(i: usize) -> String {
        format!("reasoning...\n<final_answer>{i}</final_answer>")
    }

    #[tokio::test]
    async fn sequential_votes_keep_attempt_order() {
        let replies: Vec<String> = [1, 1, 1, 2, 0].iter().map(|&i| tagged(i)).collect();
        let backend = ScriptedBackend::new(replies.iter().map(|r| Ok(r.as_str())).collect());
        let judge = Judge::new(backend.clone(), &JudgeConfig::default());

        let verdict = judge.judge(&request(3)).await;

        assert_eq!(verdict.index, 1);
        let indices: Vec<usize> = verdict.votes.iter().map(|v| v.index).collect();
        assert_eq!(indices, vec![1, 1, 1, 2, 0]);
        assert!(!verdict.is_degraded());
        assert_eq!(verdict.metrics.input_tokens, 500);
    }

    #[tokio::test]
    async fn every_attempt_gets_the_same_prompt_and_params() {
        let backend = ScriptedBackend::new(vec![Ok("<final_answer>0</final_answer>"); 5]);
        let judge = Judge::new(backend.clone(), &JudgeConfig::default());

        judge.judge(&request(2)).await;

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|(p, _)| p == &seen[0].0));
        assert!(seen.iter().all(|(_, params)| params.top_p == Some(0.5)));
    }

    #[tokio::test]
    async fn failures_and_garbage_become_fallback_votes() {
        let t2 = tagged(2);
        let backend = ScriptedBackend::new(vec![
            Err("connection reset"),
            Ok("I cannot decide."),
            Ok(t2.as_str()),
            Err("401 unauthorized"),
            Ok(t2.as_str()),
        ]);
        let judge = Judge::new(backend, &JudgeConfig::default());

        let verdict = judge.judge(&request(4)).await;

        assert_eq!(verdict.index, 0);
        assert_eq!(verdict.fallback_count(), 3);
        assert!(matches!(verdict.votes[0].outcome, VoteOutcome::CallFailed { .. }));
        assert!(matches!(verdict.votes[1].outcome, VoteOutcome::Unparseable { .. }));
        assert_eq!(verdict.votes[0].metrics, LlmMetrics::default());
    }

    #[tokio::test]
    async fn concurrent_mode_collects_every_attempt() {
        let backend = Arc::new(CountingBackend { calls: AtomicUsize::new(0) });
        let config = JudgeConfig { execution: ExecutionMode::Concurrent, ..Default::default() };
        let judge = Judge::new(backend.clone(), &config);

        let verdict = judge.judge(&request(2)).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 5);
        assert_eq!(verdict.attempts(), 5);
        // Three zeros against two ones.
        assert_eq!(verdict.index, 0);
    }

    #[tokio::test]
    async fn sample_count_follows_config() {
        let backend = Arc::new(CountingBackend { calls: AtomicUsize::new(0) });
        let config = JudgeConfig { samples: 3, ..Default::default() };
        let judge = Judge::new(backend.clone(), &config);

        assert_eq!(judge.samples(), 3);
        judge.judge(&request(2)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn judge_once_uses_direct_policy() {
        let backend = ScriptedBackend::new(vec![Ok("The answer is 2, clearly.")]);
        let config = JudgeConfig { policy: AnswerPolicy::Direct, ..Default::default() };
        let judge = Judge::new(backend.clone(), &config);

        let vote = judge.judge_once(&request(4)).await;

        assert_eq!(vote.index, 2);
        assert_eq!(vote.outcome, VoteOutcome::Parsed);
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1.max_tokens, 5);
        assert!(seen[0].0.contains("Output nothing else."));
    }

    #[test]
    fn from_config_rejects_out_of_range_sampling() {
        let config = JudgeConfig { temperature: Some(1.5), ..Default::default() };
        let err = Judge::from_config(&config).err().unwrap();
        assert!(matches!(err, JudgeError::Config(ref msg) if msg.contains("temperature")));
    }

    #[tokio::test]
    async fn judge_completions_rejects_empty_input() {
        let backend = ScriptedBackend::new(vec![]);
        let judge = Judge::new(backend.clone(), &JudgeConfig::default());

        let err = judge.judge_completions("prompt", &[]).await.unwrap_err();

        assert!(matches!(err, JudgeError::InvalidRequest(_)));
        assert!(backend.seen.lock().unwrap().is_empty());
    }
}
