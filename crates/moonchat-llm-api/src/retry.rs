use colored::Colorize;
use moonchat_types::{Message, FALLBACK_REPLY, MAX_RETRIES};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{CompletionBackend, CompletionError, CompletionRequest};

/// How often and how patiently a completion is retried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Sleep after the first failure; doubled after each further failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Backoff after the failed attempt `attempt` (0-based): base * 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Result of a completion after retries
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The provider streamed a full answer
    Answered(String),
    /// Every attempt failed; the caller shows and records [`FALLBACK_REPLY`]
    Fallback { reason: String },
}

impl CompletionOutcome {
    /// Text to show and persist; exactly [`FALLBACK_REPLY`] on soft failure
    pub fn text(&self) -> &str {
        match self {
            CompletionOutcome::Answered(text) => text,
            CompletionOutcome::Fallback { .. } => FALLBACK_REPLY,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CompletionOutcome::Fallback { .. })
    }
}

/// Runs completions against a backend with bounded exponential-backoff retry
#[derive(Clone)]
pub struct Completer {
    backend: Arc<dyn CompletionBackend>,
    policy: RetryPolicy,
}

impl Completer {
    pub fn new(backend: Arc<dyn CompletionBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Submit `messages` to `model`, streaming deltas into `sink`.
    ///
    /// Never fails: once the retry budget is spent, or a failure is not
    /// retryable, the outcome is [`CompletionOutcome::Fallback`].
    pub async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f32,
        sink: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> CompletionOutcome {
        let request = CompletionRequest::streaming(model, messages, temperature);
        let max_attempts = self.policy.max_attempts.max(1);

        let mut last_error: Option<CompletionError> = None;
        for attempt in 0..max_attempts {
            let mut streamed = false;
            let result = {
                let mut tracking = |delta: &str| {
                    streamed |= !delta.is_empty();
                    sink(delta);
                };
                self.backend.stream_chat(&request, &mut tracking).await
            };

            match result {
                Ok(text) => return CompletionOutcome::Answered(text),
                Err(e) => {
                    let retryable = e.is_retryable();
                    if retryable && attempt + 1 < max_attempts {
                        // The next attempt streams the whole answer again
                        if streamed {
                            sink("\n");
                            eprintln!("{} Partial answer discarded", "↻".yellow());
                        }
                        let wait = self.policy.delay_for(attempt);
                        eprintln!(
                            "\n{} Request failed, retrying in {}s... ({})",
                            "⚠️".yellow(),
                            wait.as_secs_f32(),
                            e
                        );
                        tokio::time::sleep(wait).await;
                        last_error = Some(e);
                        continue;
                    }

                    eprintln!("\n{} Request failed: {}", "❌".bright_red(), e);
                    last_error = Some(e);
                    break;
                }
            }
        }

        CompletionOutcome::Fallback {
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
        }
    }
}
